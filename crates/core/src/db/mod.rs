//! Signature storage.
//!
//! - `codec`: `(key, value)` encoding of a `SignatureItem`.
//! - `SpaceRegistry`: namespaces, selection stack and the per-space key index.
//! - `SignatureStore`: the key/value store itself, with merge-on-set.
//! - `file`: plain and gzip signature files.
//! - `ZignConfig`: serializable engine configuration.

pub mod codec;
mod config;
mod file;
mod spaces;
mod store;

pub use config::{ZignConfig, DEFAULT_MIN_SEARCH_SIZE};
pub use file::LoadReport;
pub use spaces::{SpaceInfo, SpaceRegistry};
pub use store::{IterReport, SignatureStore};
