//! In-memory signature store.
//!
//! Entries are kept in their serialized `(key, value)` form, exactly as they
//! are persisted; items are decoded on demand. The space registry doubles as
//! a secondary index so space-scoped operations only touch member keys.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::db::codec::{decode, encode, key_for, split_key};
use crate::db::spaces::SpaceRegistry;
use crate::error::{ZignError, ZignResult};
use crate::model::{validate_space_name, SignatureItem};

/// Outcome of a visitor-driven walk over the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IterReport {
    /// Entries decoded and handed to the visitor.
    pub visited: usize,
    /// Malformed entries that were logged and skipped.
    pub skipped: usize,
    /// The visitor asked to stop before the walk finished.
    pub stopped: bool,
}

/// Key/value signature store with a per-space index.
#[derive(Debug, Default, Clone)]
pub struct SignatureStore {
    entries: BTreeMap<String, String>,
    spaces: SpaceRegistry,
}

impl SignatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn spaces(&self) -> &SpaceRegistry {
        &self.spaces
    }

    pub fn spaces_mut(&mut self) -> &mut SpaceRegistry {
        &mut self.spaces
    }

    /// Store `item`, merging it field-wise into any entry under the same key.
    ///
    /// The merged result is built and encoded in a scratch item first, so a
    /// failure leaves the existing entry untouched.
    pub fn set(&mut self, item: &SignatureItem) -> ZignResult<()> {
        item.validate()?;
        let (key, mut value) = encode(item);
        if let Some(existing) = self.entries.get(&key) {
            let mut merged = decode(&key, existing)?;
            merged.merge_from(item);
            value = encode(&merged).1;
            debug!(key = %key, "merged into existing signature");
        }
        self.put(item.space.as_deref(), key, value);
        Ok(())
    }

    /// Store `item` as-is, discarding whatever was stored under its key.
    pub fn replace(&mut self, item: &SignatureItem) -> ZignResult<()> {
        item.validate()?;
        let (key, value) = encode(item);
        self.put(item.space.as_deref(), key, value);
        Ok(())
    }

    fn put(&mut self, space: Option<&str>, key: String, value: String) {
        self.spaces.insert(space, &key);
        self.entries.insert(key, value);
    }

    /// Decode the entry for `(space, name)`, if present.
    pub fn get(&self, space: Option<&str>, name: &str) -> ZignResult<Option<SignatureItem>> {
        let key = key_for(space, name);
        self.entries.get(&key).map(|value| decode(&key, value)).transpose()
    }

    pub fn contains(&self, space: Option<&str>, name: &str) -> bool {
        self.entries.contains_key(&key_for(space, name))
    }

    /// Raw serialized value for `(space, name)`.
    pub fn raw(&self, space: Option<&str>, name: &str) -> Option<&str> {
        self.entries.get(&key_for(space, name)).map(String::as_str)
    }

    /// Remove one signature. Returns whether it existed.
    pub fn remove(&mut self, space: Option<&str>, name: &str) -> bool {
        let key = key_for(space, name);
        let existed = self.entries.remove(&key).is_some();
        if existed {
            self.spaces.remove(space, &key);
        }
        existed
    }

    /// Drop every signature. Explicitly created spaces stay known, empty.
    pub fn remove_all(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.spaces.clear_members();
        removed
    }

    /// Drop every signature of `space` (`None` is the global space).
    pub fn remove_by_space(&mut self, space: Option<&str>) -> usize {
        let keys = self.spaces.keys(space);
        for key in &keys {
            self.entries.remove(key);
            self.spaces.remove(space, key);
        }
        keys.len()
    }

    pub fn count_in_space(&self, space: Option<&str>) -> usize {
        self.spaces.count(space)
    }

    /// Move every member of `old` under `new`, returning how many moved.
    ///
    /// A same-named signature already in `new` is replaced by the moved one
    /// (logged with `warn!`), so the store can shrink by the collisions.
    pub fn rename_space(&mut self, old: &str, new: &str) -> ZignResult<usize> {
        validate_space_name(new)?;
        if !self.spaces.contains(old) {
            return Err(ZignError::NotFound(format!("space `{old}`")));
        }
        if old == new {
            return Ok(0);
        }
        let moved = self.move_members(Some(old), Some(new))?;
        self.spaces.rename(old, new);
        Ok(moved)
    }

    /// Move every member of `space` to the global space and forget `space`.
    ///
    /// All other fields of the moved signatures are preserved. Collisions
    /// with global signatures behave as in [`SignatureStore::rename_space`].
    pub fn unset_space(&mut self, space: &str) -> ZignResult<usize> {
        if !self.spaces.contains(space) {
            return Err(ZignError::NotFound(format!("space `{space}`")));
        }
        let moved = self.move_members(Some(space), None)?;
        self.spaces.forget(space);
        Ok(moved)
    }

    fn move_members(&mut self, from: Option<&str>, to: Option<&str>) -> ZignResult<usize> {
        let keys = self.spaces.keys(from);
        for key in &keys {
            let (_, name) = split_key(key)?;
            let target = key_for(to, name);
            if let Some(value) = self.entries.remove(key) {
                self.spaces.remove(from, key);
                if self.entries.contains_key(&target) {
                    warn!(key = %target, "moved signature replaces an existing one");
                }
                self.put(to, target, value);
            }
        }
        Ok(keys.len())
    }

    /// Keys visible in `scope`: one space, or every key when `scope` is `None`.
    pub fn keys(&self, scope: Option<&str>) -> Vec<String> {
        match scope {
            Some(space) => self.spaces.keys(Some(space)),
            None => self.entries.keys().cloned().collect(),
        }
    }

    /// Lazily decode the entries visible in `scope`, in key order.
    pub fn items<'a>(
        &'a self,
        scope: Option<&str>,
    ) -> impl Iterator<Item = ZignResult<SignatureItem>> + 'a {
        self.keys(scope)
            .into_iter()
            .filter_map(move |key| self.entries.get(&key).map(|value| decode(&key, value)))
    }

    /// Feed every decodable item in `scope` to `visitor` until it returns `false`.
    ///
    /// Malformed entries are logged and counted, never fatal.
    pub fn foreach<F>(&self, scope: Option<&str>, mut visitor: F) -> IterReport
    where
        F: FnMut(SignatureItem) -> bool,
    {
        let mut report = IterReport::default();
        for result in self.items(scope) {
            match result {
                Ok(item) => {
                    report.visited += 1;
                    if !visitor(item) {
                        report.stopped = true;
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "skipping malformed signature entry");
                    report.skipped += 1;
                }
            }
        }
        report
    }

    /// Serialized entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Insert a raw entry without decoding its value.
    ///
    /// Only the key has to be well formed; a bad value surfaces later as a
    /// skipped entry during iteration.
    pub fn set_raw(&mut self, key: &str, value: &str) -> ZignResult<()> {
        let (space, _) = split_key(key)?;
        let space = space.map(str::to_string);
        self.put(space.as_deref(), key.to_string(), value.to_string());
        Ok(())
    }
}
