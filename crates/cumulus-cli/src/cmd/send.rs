//! `cumulus send` — chunk a local file and upload the parts the cloud
//! is missing, then publish the file metadata.

use std::fs::File;
use std::io::Read;

use anyhow::{Context, Result};
use cumulus_client::CloudClient;
use cumulus_core::PartDescriptor;

/// Files are read and uploaded in 1 MiB parts...
const PART_SIZE: u64 = 1024 * 1024;
/// ...five at a time, bounding the bytes held in memory.
const BATCH_LEN: usize = 5;

pub fn run(client: &mut CloudClient, local: &str, remote: &str) -> Result<()> {
    let mut file = File::open(local).with_context(|| format!("failed to open {local}"))?;

    let mut parts: Vec<PartDescriptor> = Vec::new();
    let mut batch: Vec<PartDescriptor> = Vec::new();
    let mut offset = 0u64;
    let mut uploaded = 0u32;

    loop {
        let mut chunk = Vec::with_capacity(PART_SIZE as usize);
        let read = (&mut file)
            .take(PART_SIZE)
            .read_to_end(&mut chunk)
            .with_context(|| format!("failed to read {local}"))?;
        if read == 0 {
            break;
        }

        batch.push(PartDescriptor::from_content(offset, chunk));
        offset += read as u64;

        if batch.len() == BATCH_LEN {
            uploaded += flush(client, &mut batch, &mut parts)?;
        }
    }

    // Stragglers.
    uploaded += flush(client, &mut batch, &mut parts)?;

    client.create_file(remote, &parts)?;
    println!(
        "Sent {local} to {remote} ({} parts, {uploaded} uploaded)",
        parts.len()
    );
    Ok(())
}

/// Upload one batch, then move its descriptors — payloads already
/// released — into `parts` for the final create_file call.
fn flush(
    client: &mut CloudClient,
    batch: &mut Vec<PartDescriptor>,
    parts: &mut Vec<PartDescriptor>,
) -> Result<u32> {
    if batch.is_empty() {
        return Ok(0);
    }
    tracing::info!(parts = batch.len(), "sending part batch");
    let sent = client.send_needed_parts(batch)?;
    parts.append(batch);
    Ok(sent)
}
