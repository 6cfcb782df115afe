//! zign-core
//!
//! Core library for function signatures ("zignatures") of analyzed binaries.
//!
//! This crate defines the signature model, its `key=value` storage codec,
//! the namespaced store with file persistence, the per-criterion matchers
//! and the multi-pattern search engine used to scan whole images.
//!
//! Disassembly, CFG reconstruction and variable recovery live elsewhere;
//! their results reach this crate as [`model::AnalyzedFunction`] values and
//! raw bytes through [`services::ByteSource`].

pub mod db;
pub mod error;
pub mod model;
pub mod services;

pub use error::{ZignError, ZignResult};
pub use services::Zignatures;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
