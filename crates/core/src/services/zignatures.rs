//! High-level signature engine.
//!
//! `Zignatures` ties the store, the space selection and the configuration
//! together and exposes the operations collaborators call: add-or-merge per
//! criterion, delete, listing, the matcher families, search construction and
//! persistence. Every scoped operation uses the currently selected space; with
//! no selection, all spaces are visible.

use std::path::Path;

use tracing::{info, warn};

use crate::db::{IterReport, LoadReport, SignatureStore, SpaceInfo, ZignConfig};
use crate::error::{ZignError, ZignResult};
use crate::model::{AnalyzedFunction, BytePattern, GraphMetrics, SignatureItem, Variable};
use crate::services::listing::{emit, CommandSink, JsonSink, ListFormat, ListSink, TextSink};
use crate::services::matcher::{self, MatchReport};
use crate::services::memory::ByteSource;
use crate::services::search::SignatureSearch;

/// Length of a hex SHA-256 digest.
const HASH_HEX_LEN: usize = 64;

/// Wildcard accepted by [`Zignatures::delete`].
pub const DELETE_ALL: &str = "*";

/// Signature engine: a store plus selection and configuration.
#[derive(Debug, Clone, Default)]
pub struct Zignatures {
    store: SignatureStore,
    config: ZignConfig,
}

impl Zignatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine using `config`; its default space, if any, is selected.
    pub fn with_config(config: ZignConfig) -> ZignResult<Self> {
        let mut engine = Self { store: SignatureStore::new(), config };
        if let Some(space) = engine.config.default_space.clone() {
            engine.select_space(Some(&space))?;
        }
        Ok(engine)
    }

    pub fn config(&self) -> &ZignConfig {
        &self.config
    }

    pub fn store(&self) -> &SignatureStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SignatureStore {
        &mut self.store
    }

    // -- spaces --

    pub fn current_space(&self) -> Option<&str> {
        self.store.spaces().current()
    }

    pub fn select_space(&mut self, space: Option<&str>) -> ZignResult<()> {
        self.store.spaces_mut().select(space)
    }

    pub fn push_space(&mut self, space: Option<&str>) -> ZignResult<()> {
        self.store.spaces_mut().push(space)
    }

    pub fn pop_space(&mut self) -> bool {
        self.store.spaces_mut().pop()
    }

    pub fn rename_space(&mut self, old: &str, new: &str) -> ZignResult<usize> {
        self.store.rename_space(old, new)
    }

    pub fn unset_space(&mut self, space: &str) -> ZignResult<usize> {
        self.store.unset_space(space)
    }

    pub fn spaces(&self) -> Vec<SpaceInfo> {
        self.store.spaces().list()
    }

    // -- add-or-merge --

    fn add(&mut self, item: SignatureItem) -> ZignResult<()> {
        let item = item.in_space(self.current_space().map(str::to_string));
        self.store.set(&item).inspect_err(|err| {
            warn!(name = %item.name, error = %err, "signature rejected");
        })
    }

    /// Add a byte pattern; an all-zero mask is rejected.
    pub fn add_bytes(&mut self, name: &str, bytes: &[u8], mask: &[u8]) -> ZignResult<()> {
        let pattern = BytePattern::new(bytes.to_vec(), mask.to_vec())?;
        self.add_pattern(name, pattern)
    }

    pub fn add_pattern(&mut self, name: &str, pattern: BytePattern) -> ZignResult<()> {
        self.add(SignatureItem::new(name).with_bytes(pattern))
    }

    /// Add a basic-block SHA-256 digest (64 hex characters, stored lowercase).
    pub fn add_hash(&mut self, name: &str, digest: &str) -> ZignResult<()> {
        if digest.len() != HASH_HEX_LEN || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ZignError::Validation(format!(
                "hash `{digest}` is not a {HASH_HEX_LEN}-character hex digest"
            )));
        }
        self.add(SignatureItem::new(name).with_hash(digest.to_ascii_lowercase()))
    }

    /// Compute the digest of `fcn`'s basic blocks and add it.
    pub fn add_bb_hash(
        &mut self,
        name: &str,
        fcn: &AnalyzedFunction,
        source: &dyn ByteSource,
    ) -> ZignResult<()> {
        let digest = matcher::block_hash(fcn, source).ok_or_else(|| {
            ZignError::Validation(format!("cannot read the basic blocks of `{}`", fcn.name))
        })?;
        self.add(SignatureItem::new(name).with_hash(digest))
    }

    pub fn add_graph(&mut self, name: &str, metrics: GraphMetrics) -> ZignResult<()> {
        self.add(SignatureItem::new(name).with_graph(metrics))
    }

    pub fn add_graph_from(&mut self, name: &str, fcn: &AnalyzedFunction) -> ZignResult<()> {
        self.add_graph(name, GraphMetrics::from_function(fcn))
    }

    pub fn add_address(&mut self, name: &str, addr: u64) -> ZignResult<()> {
        self.add(SignatureItem::new(name).with_addr(addr))
    }

    pub fn add_refs<I, S>(&mut self, name: &str, refs: I) -> ZignResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add(SignatureItem::new(name).with_refs(refs))
    }

    pub fn add_vars(&mut self, name: &str, vars: Vec<Variable>) -> ZignResult<()> {
        self.add(SignatureItem::new(name).with_vars(vars))
    }

    // -- lookup and deletion --

    /// Signature `name` in the current space.
    pub fn get(&self, name: &str) -> ZignResult<Option<SignatureItem>> {
        self.store.get(self.current_space(), name)
    }

    /// Delete `name` from the current space, or everything visible with `*`.
    ///
    /// Returns how many signatures were removed.
    pub fn delete(&mut self, name: &str) -> ZignResult<usize> {
        if name == DELETE_ALL {
            let removed = match self.current_space().map(str::to_string) {
                Some(space) => self.store.remove_by_space(Some(&space)),
                None => self.store.remove_all(),
            };
            info!(removed, "deleted signatures");
            return Ok(removed);
        }
        let space = self.current_space().map(str::to_string);
        if self.store.remove(space.as_deref(), name) {
            Ok(1)
        } else {
            Err(ZignError::NotFound(format!("signature `{name}`")))
        }
    }

    /// Number of signatures visible in the current scope.
    pub fn count(&self) -> usize {
        match self.current_space() {
            Some(space) => self.store.count_in_space(Some(space)),
            None => self.store.len(),
        }
    }

    // -- iteration and listing --

    pub fn foreach<F>(&self, visitor: F) -> IterReport
    where
        F: FnMut(SignatureItem) -> bool,
    {
        self.store.foreach(self.current_space(), visitor)
    }

    /// Every decodable signature in the current scope.
    pub fn get_list(&self) -> Vec<SignatureItem> {
        let mut items = Vec::new();
        self.foreach(|item| {
            items.push(item);
            true
        });
        items
    }

    /// Report every visible signature to `sink`.
    pub fn list_into(&self, sink: &mut dyn ListSink) -> IterReport {
        self.foreach(|item| {
            emit(&item, sink);
            true
        })
    }

    /// Render the visible signatures in `format`.
    pub fn list(&self, format: ListFormat) -> ZignResult<String> {
        match format {
            ListFormat::Text => {
                let mut sink = TextSink::new(self.current_space().is_none());
                self.list_into(&mut sink);
                Ok(sink.finish())
            }
            ListFormat::Json => {
                let mut sink = JsonSink::new();
                self.list_into(&mut sink);
                Ok(sink.finish()?)
            }
            ListFormat::Commands => {
                let mut sink = CommandSink::new();
                self.list_into(&mut sink);
                Ok(sink.finish())
            }
        }
    }

    // -- matching --

    pub fn match_address<F>(&self, fcn: &AnalyzedFunction, on_match: F) -> MatchReport
    where
        F: FnMut(&SignatureItem, &AnalyzedFunction) -> bool,
    {
        matcher::match_address(&self.store, self.current_space(), fcn, on_match)
    }

    pub fn match_hash<F>(
        &self,
        fcn: &AnalyzedFunction,
        source: &dyn ByteSource,
        on_match: F,
    ) -> MatchReport
    where
        F: FnMut(&SignatureItem, &AnalyzedFunction) -> bool,
    {
        matcher::match_hash(&self.store, self.current_space(), fcn, source, on_match)
    }

    /// Graph matching; `min_cc` defaults to the configured complexity floor.
    pub fn match_graph<F>(
        &self,
        fcn: &AnalyzedFunction,
        min_cc: Option<i32>,
        on_match: F,
    ) -> MatchReport
    where
        F: FnMut(&SignatureItem, &AnalyzedFunction) -> bool,
    {
        let min_cc = min_cc.unwrap_or(self.config.min_graph_cc);
        matcher::match_graph(&self.store, self.current_space(), fcn, min_cc, on_match)
    }

    pub fn match_refs<F>(&self, fcn: &AnalyzedFunction, on_match: F) -> MatchReport
    where
        F: FnMut(&SignatureItem, &AnalyzedFunction) -> bool,
    {
        matcher::match_refs(&self.store, self.current_space(), fcn, on_match)
    }

    pub fn match_vars<F>(&self, fcn: &AnalyzedFunction, on_match: F) -> MatchReport
    where
        F: FnMut(&SignatureItem, &AnalyzedFunction) -> bool,
    {
        matcher::match_vars(&self.store, self.current_space(), fcn, on_match)
    }

    // -- search --

    /// Build a search engine over the visible byte-pattern signatures.
    ///
    /// `min_size` defaults to the configured minimum.
    pub fn search_init(&self, min_size: Option<usize>) -> ZignResult<SignatureSearch> {
        let min_size = min_size.unwrap_or(self.config.min_search_size);
        SignatureSearch::new(self.get_list(), min_size)
    }

    // -- persistence --

    pub fn save(&self, path: &Path) -> ZignResult<()> {
        self.store.save(path)
    }

    pub fn save_compressed(&self, path: &Path) -> ZignResult<()> {
        self.store.save_compressed(path)
    }

    /// Merge a signature file, looked up through the configured search paths.
    pub fn load(&mut self, file: &Path) -> ZignResult<LoadReport> {
        let path = self.resolve(file)?;
        self.store.load(&path)
    }

    pub fn load_compressed(&mut self, file: &Path) -> ZignResult<LoadReport> {
        let path = self.resolve(file)?;
        self.store.load_compressed(&path)
    }

    fn resolve(&self, file: &Path) -> ZignResult<std::path::PathBuf> {
        self.config
            .resolve(file)
            .ok_or_else(|| ZignError::NotFound(format!("signature file {}", file.display())))
    }
}
