//! `cumulus list` — paginated directory listing.

use anyhow::Result;
use cumulus_client::{CloudClient, ListQuery, ObjectKind};

use crate::cmd::pretty_size;

pub fn run(client: &mut CloudClient, path: &str) -> Result<()> {
    let mut query = ListQuery::new(path);
    query.include_child_counts = true;

    loop {
        let listing = client.list_path(&mut query)?;
        for obj in &listing.children {
            let kind = match obj.kind {
                ObjectKind::File => "file",
                ObjectKind::Dir => "dir",
                ObjectKind::Share => "share",
                ObjectKind::Company => "company",
            };
            println!("{:>7} {:>8} {}", kind, pretty_size(obj.size), obj.path);
        }
        if !listing.more {
            break;
        }
    }
    Ok(())
}
