//! Matching stored signatures against a live function.
//!
//! Each criterion has a predicate (`*_matches`) and a family runner
//! (`match_*`). Predicates treat an absent criterion as "no constraint".
//! Runners only consider items that actually carry the criterion, so an
//! item without, say, an address is never reported by [`match_address`].

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::db::SignatureStore;
use crate::model::{AnalyzedFunction, GraphMetrics, SignatureItem};
use crate::services::memory::ByteSource;

/// Outcome of running one matcher family over the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    /// Decodable entries inspected.
    pub visited: usize,
    /// Entries that matched and were handed to the callback.
    pub matched: usize,
    /// Malformed entries skipped.
    pub skipped: usize,
    /// The callback asked to stop.
    pub stopped: bool,
}

/// `|a - b| < a / 10`, with truncating integer division.
pub fn close(a: i32, b: i32) -> bool {
    let (a, b) = (i64::from(a), i64::from(b));
    (a - b).abs() < a / 10
}

/// Lowercase hex SHA-256 over the function's basic blocks in address order.
///
/// Returns `None` if any block cannot be read.
pub fn block_hash(fcn: &AnalyzedFunction, source: &dyn ByteSource) -> Option<String> {
    let mut hasher = Sha256::new();
    for block in fcn.sorted_blocks() {
        let len = usize::try_from(block.size).ok()?;
        let Some(bytes) = source.read_at(block.addr, len) else {
            debug!(function = %fcn.name, block = block.addr, "unreadable basic block");
            return None;
        };
        hasher.update(&bytes);
    }
    Some(hex::encode(hasher.finalize()))
}

pub fn address_matches(item: &SignatureItem, fcn: &AnalyzedFunction) -> bool {
    item.addr.map_or(true, |addr| addr == fcn.addr)
}

/// Compare against a precomputed function digest; `None` means the digest
/// could not be computed, which never matches a stored hash.
pub fn hash_matches(item: &SignatureItem, digest: Option<&str>) -> bool {
    match &item.hash {
        None => true,
        Some(stored) => digest == Some(stored.as_str()),
    }
}

pub fn graph_matches(item: &SignatureItem, fcn: &AnalyzedFunction) -> bool {
    let Some(stored) = item.graph else { return true };
    let live = GraphMetrics::from_function(fcn);
    let exact = [
        (stored.cc, live.cc),
        (stored.nbbs, live.nbbs),
        (stored.edges, live.edges),
        (stored.ebbs, live.ebbs),
    ];
    if exact.iter().any(|&(s, l)| s != GraphMetrics::ANY && s != l) {
        return false;
    }
    stored.bbsum <= 0 || close(stored.bbsum, live.bbsum)
}

/// Positional comparison; lengths must agree.
pub fn refs_match(item: &SignatureItem, fcn: &AnalyzedFunction) -> bool {
    item.refs.as_ref().map_or(true, |refs| *refs == fcn.refs)
}

/// Positional comparison; lengths must agree.
pub fn vars_match(item: &SignatureItem, fcn: &AnalyzedFunction) -> bool {
    item.vars.as_ref().map_or(true, |vars| *vars == fcn.vars)
}

/// Shared driver: `criterion` returns `None` for items lacking the criterion.
fn run<P, F>(
    store: &SignatureStore,
    scope: Option<&str>,
    fcn: &AnalyzedFunction,
    mut criterion: P,
    mut on_match: F,
) -> MatchReport
where
    P: FnMut(&SignatureItem) -> Option<bool>,
    F: FnMut(&SignatureItem, &AnalyzedFunction) -> bool,
{
    let mut matched = 0;
    let walk = store.foreach(scope, |item| {
        if criterion(&item) != Some(true) {
            return true;
        }
        matched += 1;
        on_match(&item, fcn)
    });
    MatchReport { visited: walk.visited, matched, skipped: walk.skipped, stopped: walk.stopped }
}

pub fn match_address<F>(
    store: &SignatureStore,
    scope: Option<&str>,
    fcn: &AnalyzedFunction,
    on_match: F,
) -> MatchReport
where
    F: FnMut(&SignatureItem, &AnalyzedFunction) -> bool,
{
    run(store, scope, fcn, |item| item.addr.map(|_| address_matches(item, fcn)), on_match)
}

/// The function digest is computed once, on the first item carrying a hash.
pub fn match_hash<F>(
    store: &SignatureStore,
    scope: Option<&str>,
    fcn: &AnalyzedFunction,
    source: &dyn ByteSource,
    on_match: F,
) -> MatchReport
where
    F: FnMut(&SignatureItem, &AnalyzedFunction) -> bool,
{
    let mut digest: Option<Option<String>> = None;
    run(
        store,
        scope,
        fcn,
        |item| {
            item.hash.as_ref()?;
            let digest = digest.get_or_insert_with(|| block_hash(fcn, source));
            Some(hash_matches(item, digest.as_deref()))
        },
        on_match,
    )
}

/// Signatures whose stored cyclomatic complexity is below `min_cc` are
/// discarded before any comparison.
pub fn match_graph<F>(
    store: &SignatureStore,
    scope: Option<&str>,
    fcn: &AnalyzedFunction,
    min_cc: i32,
    on_match: F,
) -> MatchReport
where
    F: FnMut(&SignatureItem, &AnalyzedFunction) -> bool,
{
    run(
        store,
        scope,
        fcn,
        |item| item.graph.map(|g| g.cc >= min_cc && graph_matches(item, fcn)),
        on_match,
    )
}

pub fn match_refs<F>(
    store: &SignatureStore,
    scope: Option<&str>,
    fcn: &AnalyzedFunction,
    on_match: F,
) -> MatchReport
where
    F: FnMut(&SignatureItem, &AnalyzedFunction) -> bool,
{
    run(store, scope, fcn, |item| item.refs.as_ref().map(|_| refs_match(item, fcn)), on_match)
}

pub fn match_vars<F>(
    store: &SignatureStore,
    scope: Option<&str>,
    fcn: &AnalyzedFunction,
    on_match: F,
) -> MatchReport
where
    F: FnMut(&SignatureItem, &AnalyzedFunction) -> bool,
{
    run(store, scope, fcn, |item| item.vars.as_ref().map(|_| vars_match(item, fcn)), on_match)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_is_strict_ten_percent() {
        assert!(close(1000, 901));
        assert!(!close(1000, 900));
        assert!(close(1000, 1099));
        assert!(!close(1000, 1100));
        assert!(!close(5, 5));
    }

    #[test]
    fn refs_require_equal_length() {
        let fcn = AnalyzedFunction::new("f", 0).with_refs(["a", "b"]);
        assert!(refs_match(&SignatureItem::new("f").with_refs(["a", "b"]), &fcn));
        assert!(!refs_match(&SignatureItem::new("f").with_refs(["a"]), &fcn));
        assert!(!refs_match(&SignatureItem::new("f").with_refs(["a", "b", "c"]), &fcn));
        assert!(!refs_match(&SignatureItem::new("f").with_refs(["a", "x"]), &fcn));
    }

    #[test]
    fn absent_criteria_impose_no_constraint() {
        let item = SignatureItem::new("f");
        let fcn = AnalyzedFunction::new("f", 0x1000);
        assert!(address_matches(&item, &fcn));
        assert!(hash_matches(&item, None));
        assert!(graph_matches(&item, &fcn));
        assert!(refs_match(&item, &fcn));
        assert!(vars_match(&item, &fcn));
    }
}
