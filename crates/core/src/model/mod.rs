//! Core data model for signatures and the function IR they are matched against.
//!
//! - `SignatureItem`: one named signature with optional criteria.
//! - `BytePattern`: masked byte pattern.
//! - `GraphMetrics`: fixed-size control-flow summary.
//! - `Variable`: stack/register variable descriptor.
//! - `AnalyzedFunction`: the live function supplied by the analysis layer.

mod function;
mod pattern;
mod vars;

pub use function::{AnalyzedFunction, BasicBlock};
pub use pattern::BytePattern;
pub use vars::{VarKind, Variable};

use serde::{Deserialize, Serialize};

use crate::error::{ZignError, ZignResult};

/// Characters reserved by the codec and therefore banned in names, spaces and refs.
const RESERVED_CHARS: [char; 5] = ['|', ',', '=', '\n', '\r'];

/// Size of the serialized graph record (five little-endian `i32`).
pub const GRAPH_RECORD_SIZE: usize = 20;

/// Control-flow graph summary. Any field may be [`GraphMetrics::ANY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphMetrics {
    /// Cyclomatic complexity.
    pub cc: i32,
    /// Basic block count.
    pub nbbs: i32,
    pub edges: i32,
    /// Exit block count.
    pub ebbs: i32,
    /// Sum of basic block sizes.
    pub bbsum: i32,
}

impl GraphMetrics {
    /// "Don't care" marker for a single metric.
    pub const ANY: i32 = -1;

    pub fn new(cc: i32, nbbs: i32, edges: i32, ebbs: i32, bbsum: i32) -> Self {
        Self { cc, nbbs, edges, ebbs, bbsum }
    }

    /// Metrics of a live function, suitable for creating a graph signature.
    pub fn from_function(fcn: &AnalyzedFunction) -> Self {
        Self {
            cc: fcn.cc,
            nbbs: i32::try_from(fcn.blocks.len()).unwrap_or(i32::MAX),
            edges: fcn.edges,
            ebbs: fcn.exit_blocks,
            bbsum: i32::try_from(fcn.size).unwrap_or(i32::MAX),
        }
    }

    pub fn to_bytes(&self) -> [u8; GRAPH_RECORD_SIZE] {
        let mut out = [0u8; GRAPH_RECORD_SIZE];
        for (chunk, v) in out.chunks_exact_mut(4).zip(self.fields()) {
            chunk.copy_from_slice(&v.to_le_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != GRAPH_RECORD_SIZE {
            return None;
        }
        let mut fields = bytes
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]));
        Some(Self {
            cc: fields.next()?,
            nbbs: fields.next()?,
            edges: fields.next()?,
            ebbs: fields.next()?,
            bbsum: fields.next()?,
        })
    }

    fn fields(&self) -> [i32; 5] {
        [self.cc, self.nbbs, self.edges, self.ebbs, self.bbsum]
    }
}

/// One named signature, identified by `(space, name)`.
///
/// Each optional criterion that is `None` imposes no constraint when matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureItem {
    pub name: String,
    /// Owning namespace; `None` is the global space (`*`).
    pub space: Option<String>,
    /// Function entry address; `None` means unset.
    pub addr: Option<u64>,
    pub bytes: Option<BytePattern>,
    pub graph: Option<GraphMetrics>,
    /// Hex digest over the function's basic-block bytes.
    pub hash: Option<String>,
    pub refs: Option<Vec<String>>,
    pub vars: Option<Vec<Variable>>,
}

impl SignatureItem {
    /// Create an item with no criteria set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            space: None,
            addr: None,
            bytes: None,
            graph: None,
            hash: None,
            refs: None,
            vars: None,
        }
    }

    pub fn in_space(mut self, space: Option<String>) -> Self {
        self.space = space;
        self
    }

    pub fn with_bytes(mut self, bytes: BytePattern) -> Self {
        self.bytes = Some(bytes);
        self
    }

    pub fn with_graph(mut self, graph: GraphMetrics) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_addr(mut self, addr: u64) -> Self {
        self.addr = Some(addr);
        self
    }

    pub fn with_hash(mut self, digest: impl Into<String>) -> Self {
        self.hash = Some(digest.into());
        self
    }

    pub fn with_refs<I, S>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.refs = Some(refs.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_vars(mut self, vars: Vec<Variable>) -> Self {
        self.vars = Some(vars);
        self
    }

    /// Space token used in keys and listings (`*` for the global space).
    pub fn space_token(&self) -> &str {
        self.space.as_deref().unwrap_or(GLOBAL_SPACE)
    }

    /// Field-wise merge: every criterion present in `other` replaces ours;
    /// criteria absent in `other` are kept.
    pub fn merge_from(&mut self, other: &SignatureItem) {
        if let Some(bytes) = &other.bytes {
            self.bytes = Some(bytes.clone());
        }
        if let Some(graph) = other.graph {
            self.graph = Some(graph);
        }
        if let Some(addr) = other.addr {
            self.addr = Some(addr);
        }
        if let Some(refs) = &other.refs {
            self.refs = Some(refs.clone());
        }
        if let Some(vars) = &other.vars {
            self.vars = Some(vars.clone());
        }
        if let Some(hash) = &other.hash {
            self.hash = Some(hash.clone());
        }
    }

    /// Check every invariant the codec relies on.
    pub fn validate(&self) -> ZignResult<()> {
        validate_token("signature name", &self.name)?;
        if let Some(space) = &self.space {
            validate_space_name(space)?;
        }
        if self.addr == Some(u64::MAX) {
            return Err(ZignError::Validation("address is the unset sentinel".into()));
        }
        if let Some(bytes) = &self.bytes {
            // Re-check: a deserialized pattern bypasses `BytePattern::new`.
            BytePattern::new(bytes.bytes().to_vec(), bytes.mask().to_vec())?;
        }
        if let Some(hash) = &self.hash {
            if hash.is_empty()
                || hash.len() % 2 != 0
                || !hash.chars().all(|c| c.is_ascii_hexdigit())
            {
                return Err(ZignError::Validation(format!("hash `{hash}` is not a hex digest")));
            }
        }
        if let Some(refs) = &self.refs {
            if refs.is_empty() {
                return Err(ZignError::Validation("reference list is empty".into()));
            }
            for r in refs {
                validate_token("reference", r)?;
            }
        }
        if matches!(&self.vars, Some(vars) if vars.is_empty()) {
            return Err(ZignError::Validation("variable list is empty".into()));
        }
        Ok(())
    }
}

/// Key token of the global (unnamed) space.
pub const GLOBAL_SPACE: &str = "*";

/// Validate a namespace name: a regular token that is not the global marker.
pub fn validate_space_name(space: &str) -> ZignResult<()> {
    validate_token("space name", space)?;
    if space == GLOBAL_SPACE {
        return Err(ZignError::Validation("`*` is reserved for the global space".into()));
    }
    Ok(())
}

pub(crate) fn validate_token(what: &str, value: &str) -> ZignResult<()> {
    if value.is_empty() {
        return Err(ZignError::Validation(format!("{what} is empty")));
    }
    if let Some(c) = value.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(ZignError::Validation(format!("{what} `{value}` contains reserved {c:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_record_round_trips_bytes() {
        let g = GraphMetrics::new(3, 5, 6, 1, -1);
        let bytes = g.to_bytes();
        assert_eq!(&bytes[..4], &3i32.to_le_bytes());
        assert_eq!(&bytes[16..], &(-1i32).to_le_bytes());
        assert_eq!(GraphMetrics::from_bytes(&bytes), Some(g));
        assert_eq!(GraphMetrics::from_bytes(&bytes[..19]), None);
    }

    #[test]
    fn graph_metrics_from_function() {
        let fcn = AnalyzedFunction::new("f", 0x1000)
            .with_block(0x1000, 8)
            .with_block(0x1008, 4)
            .with_cfg(2, 2, 1);
        assert_eq!(GraphMetrics::from_function(&fcn), GraphMetrics::new(2, 2, 2, 1, 12));
    }

    #[test]
    fn merge_replaces_present_fields_only() {
        let mut base = SignatureItem::new("main")
            .with_addr(0x400000)
            .with_refs(["sym.imp.puts"])
            .with_hash("aa");
        let update = SignatureItem::new("main").with_refs(["sym.imp.exit"]).with_graph(
            GraphMetrics::new(1, 1, 0, 1, 10),
        );

        base.merge_from(&update);

        assert_eq!(base.addr, Some(0x400000));
        assert_eq!(base.refs, Some(vec!["sym.imp.exit".to_string()]));
        assert_eq!(base.hash.as_deref(), Some("aa"));
        assert_eq!(base.graph, Some(GraphMetrics::new(1, 1, 0, 1, 10)));
    }

    #[test]
    fn merge_is_idempotent() {
        let item = SignatureItem::new("f").with_addr(16).with_vars(vec![Variable::base(-4)]);
        let mut merged = item.clone();
        merged.merge_from(&item);
        assert_eq!(merged, item);
    }

    #[test]
    fn validate_rejects_reserved_characters() {
        assert!(SignatureItem::new("").validate().is_err());
        assert!(SignatureItem::new("a|b").validate().is_err());
        assert!(SignatureItem::new("ok").with_refs(["x,y"]).validate().is_err());
        assert!(SignatureItem::new("ok").in_space(Some("*".into())).validate().is_err());
        assert!(SignatureItem::new("ok").with_refs(Vec::<String>::new()).validate().is_err());
        assert!(SignatureItem::new("ok").with_hash("xyz").validate().is_err());
        assert!(SignatureItem::new("ok").with_hash("abc").validate().is_err());
        assert!(SignatureItem::new("ok").with_hash("abcd").validate().is_ok());
        assert!(SignatureItem::new("ok").with_addr(u64::MAX).validate().is_err());
        assert!(SignatureItem::new("ok").in_space(Some("libc".into())).validate().is_ok());
    }
}
