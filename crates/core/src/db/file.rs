//! Signature files: one `key=value` line per entry, optionally gzip-compressed.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use tracing::{info, warn};

use crate::db::codec::decode;
use crate::db::store::SignatureStore;
use crate::error::{ZignError, ZignResult};

/// Result of loading a signature file into a live store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Entries decoded and stored.
    pub loaded: usize,
    /// Malformed lines or entries that were logged and skipped.
    pub skipped: usize,
}

impl SignatureStore {
    /// Render the store as file text, sorted by key.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.entries() {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    /// Merge file text into the store.
    ///
    /// Each decoded entry replaces the live entry under the same key; live
    /// entries absent from the text are untouched.
    pub fn load_text(&mut self, text: &str) -> LoadReport {
        let mut report = LoadReport::default();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                warn!(line = lineno + 1, "signature line has no `=`");
                report.skipped += 1;
                continue;
            };
            match decode(key, value).and_then(|item| self.replace(&item)) {
                Ok(()) => report.loaded += 1,
                Err(err) => {
                    warn!(line = lineno + 1, error = %err, "skipping malformed signature");
                    report.skipped += 1;
                }
            }
        }
        report
    }

    /// Write every entry to `path`, overwriting it.
    ///
    /// Entries present only in the old file are not kept; merge the file with
    /// [`SignatureStore::load`] first to keep them.
    pub fn save(&self, path: &Path) -> ZignResult<()> {
        let text = self.text_to_save()?;
        std::fs::write(path, text).map_err(|e| ZignError::io(path, e))?;
        info!(path = %path.display(), count = self.len(), "saved signatures");
        Ok(())
    }

    /// Like [`SignatureStore::save`], gzip-compressed.
    pub fn save_compressed(&self, path: &Path) -> ZignResult<()> {
        let text = self.text_to_save()?;
        let file = File::create(path).map_err(|e| ZignError::io(path, e))?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(text.as_bytes()).map_err(|e| ZignError::io(path, e))?;
        encoder.finish().map_err(|e| ZignError::io(path, e))?;
        info!(path = %path.display(), count = self.len(), "saved compressed signatures");
        Ok(())
    }

    fn text_to_save(&self) -> ZignResult<String> {
        if self.is_empty() {
            warn!("no signatures to save");
            return Err(ZignError::EmptyStore);
        }
        Ok(self.to_text())
    }

    /// Merge a plain signature file into the store.
    pub fn load(&mut self, path: &Path) -> ZignResult<LoadReport> {
        let text = std::fs::read_to_string(path).map_err(|e| ZignError::io(path, e))?;
        Ok(self.finish_load(path, &text))
    }

    /// Merge a gzip-compressed signature file into the store.
    pub fn load_compressed(&mut self, path: &Path) -> ZignResult<LoadReport> {
        let file = File::open(path).map_err(|e| ZignError::io(path, e))?;
        let mut text = String::new();
        GzDecoder::new(file).read_to_string(&mut text).map_err(|e| ZignError::io(path, e))?;
        Ok(self.finish_load(path, &text))
    }

    fn finish_load(&mut self, path: &Path, text: &str) -> LoadReport {
        let report = self.load_text(text);
        info!(
            path = %path.display(),
            loaded = report.loaded,
            skipped = report.skipped,
            "loaded signatures"
        );
        report
    }
}
