//! `cumulus login` — password login, printing the session token.

use std::io::Write;

use anyhow::{Context, Result};
use cumulus_client::CloudClient;

pub fn run(client: &mut CloudClient, user: &str) -> Result<()> {
    eprint!("Password for {user}: ");
    std::io::stderr().flush().ok();
    let mut password = String::new();
    std::io::stdin()
        .read_line(&mut password)
        .context("failed to read password")?;
    let password = password.trim_end_matches(['\r', '\n']);

    let info = client.login(user, password)?;

    println!("Logged in as {user} (user id {})", info.user_id);
    println!("Auth token: {}", info.auth_token);
    println!("Set CUMULUS_AUTH_TOKEN or add auth_token to the config to reuse the session.");
    Ok(())
}
