//! `cumulus get` — download a file by fetching its parts and
//! reassembling them by offset.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};

use anyhow::{bail, Context, Result};
use cumulus_client::{CloudClient, ListQuery, ObjectKind};

use crate::cmd::pretty_size;

pub fn run(client: &mut CloudClient, remote: &str, local: &str) -> Result<()> {
    // List the file to get its part list.
    let mut query = ListQuery::new(remote);
    query.include_parts = true;

    let listing = client.list_path(&mut query)?;
    let root = listing
        .root
        .with_context(|| format!("{remote} not found in the cloud"))?;
    if root.kind != ObjectKind::File {
        bail!("{remote} is not a file");
    }

    let mut out = File::create(local).with_context(|| format!("failed to create {local}"))?;

    let mut parts = root.parts.clone();
    if parts.is_empty() {
        println!("Fetched empty file {remote}");
        return Ok(());
    }

    let recovered = client.get_parts(&mut parts)?;
    for part in &mut parts {
        let Some(payload) = part.payload.take() else {
            bail!(
                "part {} at offset {} is missing from the cloud",
                part.fingerprint,
                part.offset
            );
        };
        out.seek(SeekFrom::Start(part.offset))?;
        out.write_all(&payload)?;
    }

    println!(
        "Fetched {remote} -> {local} ({recovered} parts, {})",
        pretty_size(root.size)
    );
    Ok(())
}
