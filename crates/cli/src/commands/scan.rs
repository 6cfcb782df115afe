use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use zign_core::services::MemoryImage;

use crate::Session;

/// Default number of bytes fed to the search engine per update.
pub const DEFAULT_SCAN_CHUNK: usize = 64 * 1024;

#[derive(Debug, Serialize)]
struct ScanHit {
    address: u64,
    space: Option<String>,
    name: String,
}

/// Scan a raw file for every byte-pattern signature in scope.
pub fn scan_command(
    session: &Session,
    binary: &Path,
    base: u64,
    min_size: Option<usize>,
    chunk: usize,
    json: bool,
) -> Result<()> {
    let image = MemoryImage::from_file(binary, base)?;
    let mut search = session.engine.search_init(min_size).context("Failed to build search")?;
    tracing::debug!(keywords = search.len(), binary = %binary.display(), "scanning");

    let mut hits = Vec::new();
    for (addr, bytes) in image.chunks(chunk) {
        search.update(addr, bytes, |hit| {
            hits.push(ScanHit {
                address: hit.address,
                space: hit.item.space.clone(),
                name: hit.item.name.clone(),
            });
            true
        });
    }

    if json {
        let serialized =
            serde_json::to_string_pretty(&hits).context("Failed to serialize hits to JSON")?;
        println!("{serialized}");
        return Ok(());
    }
    for hit in &hits {
        match &hit.space {
            Some(space) => println!("0x{:08x} ({space}) {}", hit.address, hit.name),
            None => println!("0x{:08x} {}", hit.address, hit.name),
        }
    }
    println!("{} hit(s)", hits.len());
    Ok(())
}
