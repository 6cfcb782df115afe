use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::Session;

/// Merge signature files into the session store.
pub fn merge_command(session: &mut Session, files: &[PathBuf], gzip: bool) -> Result<()> {
    for file in files {
        let loaded = if gzip {
            session.engine.load_compressed(file)
        } else {
            session.engine.load(file)
        };
        let report = loaded.with_context(|| format!("Failed to merge {}", file.display()))?;
        println!(
            "Merged {}: {} loaded, {} skipped",
            file.display(),
            report.loaded,
            report.skipped
        );
    }
    session.persist()
}

/// Write the session store to another file.
pub fn export_command(session: &Session, file: &Path, gzip: bool) -> Result<()> {
    let saved = if gzip { session.engine.save_compressed(file) } else { session.engine.save(file) };
    saved.with_context(|| format!("Failed to export signatures to {}", file.display()))?;
    println!("Exported {} signature(s) to {}", session.engine.store().len(), file.display());
    Ok(())
}
