//! Multi-pattern byte/mask search.
//!
//! Every byte-pattern signature becomes a keyword. Keywords are located with
//! an Aho-Corasick automaton built over each pattern's longest fully-masked
//! run (its "anchor"); candidates are then confirmed with the full masked
//! comparison. Patterns with no fully-masked byte are checked at every
//! offset.
//!
//! Buffers are streamed in with [`SignatureSearch::update`]. The engine keeps
//! the last `max_len - 1` bytes of a chunk so a pattern straddling two
//! contiguous chunks is still found, and reported exactly once.

use std::collections::HashMap;

use aho_corasick::AhoCorasick;
use serde::Serialize;
use tracing::debug;

use crate::error::{ZignError, ZignResult};
use crate::model::{BytePattern, SignatureItem};

/// A confirmed match: the owning signature and the absolute hit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchHit<'a> {
    pub item: &'a SignatureItem,
    pub address: u64,
}

#[derive(Debug, Clone)]
struct Keyword {
    item: SignatureItem,
    pattern: BytePattern,
    anchor_offset: usize,
}

/// Search engine over a private copy of the registered signatures.
///
/// Changing the store afterwards has no effect on an existing engine.
#[derive(Debug, Clone)]
pub struct SignatureSearch {
    keywords: Vec<Keyword>,
    automaton: Option<AhoCorasick>,
    /// Keyword indices per automaton pattern id.
    anchor_owners: Vec<Vec<usize>>,
    unanchored: Vec<usize>,
    max_len: usize,
    tail: Vec<u8>,
    next_addr: Option<u64>,
    stopped: bool,
}

impl SignatureSearch {
    /// Register every item whose byte pattern is at least `min_size` long.
    pub fn new<I>(items: I, min_size: usize) -> ZignResult<Self>
    where
        I: IntoIterator<Item = SignatureItem>,
    {
        let mut keywords = Vec::new();
        let mut anchors: Vec<Vec<u8>> = Vec::new();
        let mut anchor_ids: HashMap<Vec<u8>, usize> = HashMap::new();
        let mut anchor_owners: Vec<Vec<usize>> = Vec::new();
        let mut unanchored = Vec::new();

        for item in items {
            let Some(pattern) = item.bytes.clone() else { continue };
            if pattern.len() < min_size.max(1) {
                continue;
            }
            let index = keywords.len();
            let (offset, len) = pattern.longest_exact_run();
            if len == 0 {
                unanchored.push(index);
            } else {
                let anchor = pattern.bytes()[offset..offset + len].to_vec();
                let id = *anchor_ids.entry(anchor.clone()).or_insert_with(|| {
                    anchors.push(anchor);
                    anchor_owners.push(Vec::new());
                    anchors.len() - 1
                });
                anchor_owners[id].push(index);
            }
            keywords.push(Keyword { item, pattern, anchor_offset: offset });
        }

        let automaton = if anchors.is_empty() {
            None
        } else {
            let ac = AhoCorasick::new(&anchors)
                .map_err(|e| ZignError::Validation(format!("search automaton: {e}")))?;
            Some(ac)
        };
        let max_len = keywords.iter().map(|k| k.pattern.len()).max().unwrap_or(0);
        debug!(
            keywords = keywords.len(),
            anchors = anchors.len(),
            unanchored = unanchored.len(),
            max_len,
            "built signature search"
        );

        Ok(Self {
            keywords,
            automaton,
            anchor_owners,
            unanchored,
            max_len,
            tail: Vec::new(),
            next_addr: None,
            stopped: false,
        })
    }

    /// Number of registered keywords.
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Length of the longest registered pattern.
    pub fn max_pattern_len(&self) -> usize {
        self.max_len
    }

    /// Whether a callback has stopped the scan.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Forget carried-over bytes and any stop request.
    pub fn reset(&mut self) {
        self.tail.clear();
        self.next_addr = None;
        self.stopped = false;
    }

    /// Scan `buf`, mapped at `address`, and return how many hits were delivered.
    ///
    /// Hits are delivered in ascending address order. If `on_hit` returns
    /// `false` the scan stops, and later updates do nothing until
    /// [`SignatureSearch::reset`].
    pub fn update<F>(&mut self, address: u64, buf: &[u8], mut on_hit: F) -> usize
    where
        F: FnMut(SearchHit<'_>) -> bool,
    {
        if self.stopped || buf.is_empty() || self.keywords.is_empty() {
            return 0;
        }
        if self.next_addr != Some(address) {
            self.tail.clear();
        }

        let mut window = std::mem::take(&mut self.tail);
        let window_start = address - window.len() as u64;
        let fresh_from = window.len();
        window.extend_from_slice(buf);

        let mut hits = self.collect_hits(&window, fresh_from);
        hits.sort_unstable();
        hits.dedup();

        let mut delivered = 0;
        for (offset, index) in hits {
            delivered += 1;
            let hit =
                SearchHit { item: &self.keywords[index].item, address: window_start + offset as u64 };
            if !on_hit(hit) {
                self.stopped = true;
                break;
            }
        }

        let keep = self.max_len.saturating_sub(1).min(window.len());
        self.tail = window.split_off(window.len() - keep);
        self.next_addr = address.checked_add(buf.len() as u64);
        delivered
    }

    /// `(offset, keyword)` pairs whose match ends past `fresh_from`.
    fn collect_hits(&self, window: &[u8], fresh_from: usize) -> Vec<(usize, usize)> {
        let mut hits = Vec::new();
        let mut confirm = |start: usize, index: usize| {
            let pattern = &self.keywords[index].pattern;
            let end = start + pattern.len();
            if end > fresh_from && end <= window.len() && pattern.matches(&window[start..]) {
                hits.push((start, index));
            }
        };

        if let Some(ac) = &self.automaton {
            for m in ac.find_overlapping_iter(window) {
                for &index in &self.anchor_owners[m.pattern().as_usize()] {
                    if let Some(start) = m.start().checked_sub(self.keywords[index].anchor_offset) {
                        confirm(start, index);
                    }
                }
            }
        }
        for &index in &self.unanchored {
            for start in 0..window.len() {
                confirm(start, index);
            }
        }
        hits
    }
}
