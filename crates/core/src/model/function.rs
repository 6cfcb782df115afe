use serde::{Deserialize, Serialize};

use crate::model::Variable;

/// Basic block span inside an analyzed function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub addr: u64,
    pub size: u64,
}

/// Live function as produced by the analysis layer.
///
/// Everything here is computed elsewhere (CFG reconstruction, reference and
/// variable recovery); signatures only consume it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalyzedFunction {
    pub name: String,
    pub addr: u64,
    /// Basic blocks in analysis order (not necessarily sorted).
    pub blocks: Vec<BasicBlock>,
    /// Cyclomatic complexity.
    pub cc: i32,
    pub edges: i32,
    /// Blocks with no successor inside the function.
    pub exit_blocks: i32,
    /// Total function size in bytes.
    pub size: u64,
    /// Referenced symbol names in call-site order.
    pub refs: Vec<String>,
    pub vars: Vec<Variable>,
}

impl AnalyzedFunction {
    pub fn new(name: impl Into<String>, addr: u64) -> Self {
        Self { name: name.into(), addr, ..Self::default() }
    }

    /// Append a block and grow `size` accordingly.
    pub fn with_block(mut self, addr: u64, size: u64) -> Self {
        self.blocks.push(BasicBlock { addr, size });
        self.size += size;
        self
    }

    pub fn with_cfg(mut self, cc: i32, edges: i32, exit_blocks: i32) -> Self {
        self.cc = cc;
        self.edges = edges;
        self.exit_blocks = exit_blocks;
        self
    }

    pub fn with_refs<I, S>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.refs = refs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_vars(mut self, vars: Vec<Variable>) -> Self {
        self.vars = vars;
        self
    }

    /// Blocks sorted by ascending start address.
    pub fn sorted_blocks(&self) -> Vec<BasicBlock> {
        let mut blocks = self.blocks.clone();
        blocks.sort_by_key(|b| b.addr);
        blocks
    }
}
