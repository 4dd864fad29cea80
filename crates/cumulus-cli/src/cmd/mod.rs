//! Subcommand handlers.

pub mod get;
pub mod list;
pub mod login;
pub mod send;

use anyhow::Result;
use cumulus_client::ClientConfig;

/// `cumulus init` — write a default config template.
pub fn init() -> Result<()> {
    let path = ClientConfig::write_default_if_missing()?;
    println!("Config at {}", path.display());
    println!("Fill in the [oauth] consumer and access credentials before use.");
    Ok(())
}

/// Human-readable byte counts for listings.
pub fn pretty_size(bytes: u64) -> String {
    if bytes > 1024 * 1024 * 1024 {
        format!("{}GB", bytes / (1024 * 1024 * 1024))
    } else if bytes > 1024 * 1024 {
        format!("{}MB", bytes / (1024 * 1024))
    } else if bytes > 1024 {
        format!("{}kB", bytes / 1024)
    } else {
        format!("{bytes}B")
    }
}
