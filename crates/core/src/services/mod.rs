//! Operations built on top of the store.
//!
//! - `matcher`: per-criterion predicates and matcher families.
//! - `search`: multi-pattern byte/mask search engine.
//! - `listing`: format-agnostic field emission plus the stock sinks.
//! - `memory`: the byte source the matchers read through.
//! - `Zignatures`: the engine facade.

pub mod listing;
pub mod matcher;
pub mod memory;
pub mod search;
mod zignatures;

pub use listing::{ListFormat, ListSink};
pub use matcher::MatchReport;
pub use memory::{ByteSource, MemoryImage};
pub use search::{SearchHit, SignatureSearch};
pub use zignatures::{Zignatures, DELETE_ALL};
