//! Namespace ("space") registry.
//!
//! Besides tracking which spaces exist, the registry is the secondary index
//! of the store: each space maps to the set of keys that belong to it, so
//! space-scoped operations never scan the whole store.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::ZignResult;
use crate::model::validate_space_name;

/// A named space and how many signatures it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceInfo {
    pub name: String,
    pub count: usize,
    pub selected: bool,
}

/// Known spaces, their member keys, and the current selection.
///
/// `None` as a space stands for the global space (`*`). A selection of
/// `None` means "no space selected": scoped operations then see everything.
#[derive(Debug, Default, Clone)]
pub struct SpaceRegistry {
    members: BTreeMap<Option<String>, BTreeSet<String>>,
    /// Spaces created explicitly; they survive losing their last member.
    pinned: BTreeSet<String>,
    current: Option<String>,
    stack: Vec<Option<String>>,
}

impl SpaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected space, if any.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Select `space` (creating it if needed), or clear the selection with `None`.
    pub fn select(&mut self, space: Option<&str>) -> ZignResult<()> {
        if let Some(name) = space {
            self.create(name)?;
        }
        self.current = space.map(str::to_string);
        Ok(())
    }

    /// Save the current selection on the stack and select `space`.
    pub fn push(&mut self, space: Option<&str>) -> ZignResult<()> {
        let previous = self.current.clone();
        self.select(space)?;
        self.stack.push(previous);
        Ok(())
    }

    /// Restore the selection saved by the last [`SpaceRegistry::push`].
    ///
    /// Returns `false` when the stack is empty.
    pub fn pop(&mut self) -> bool {
        match self.stack.pop() {
            Some(previous) => {
                self.current = previous;
                true
            }
            None => false,
        }
    }

    /// Saved selections, oldest first.
    pub fn stack(&self) -> &[Option<String>] {
        &self.stack
    }

    /// Explicitly create a space. Creating an existing space is a no-op.
    pub fn create(&mut self, name: &str) -> ZignResult<()> {
        validate_space_name(name)?;
        self.pinned.insert(name.to_string());
        self.members.entry(Some(name.to_string())).or_default();
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(&Some(name.to_string()))
    }

    /// Number of keys in `space`.
    pub fn count(&self, space: Option<&str>) -> usize {
        self.members.get(&space.map(str::to_string)).map_or(0, BTreeSet::len)
    }

    /// Keys belonging to `space`, in key order.
    pub fn keys(&self, space: Option<&str>) -> Vec<String> {
        self.members
            .get(&space.map(str::to_string))
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every named space with its member count.
    pub fn list(&self) -> Vec<SpaceInfo> {
        self.members
            .iter()
            .filter_map(|(space, keys)| {
                let name = space.as_ref()?;
                Some(SpaceInfo {
                    name: name.clone(),
                    count: keys.len(),
                    selected: self.current.as_ref() == Some(name),
                })
            })
            .collect()
    }

    /// Forget a space entirely, including its pin and any selection of it,
    /// current or saved on the stack.
    pub(crate) fn forget(&mut self, name: &str) {
        self.members.remove(&Some(name.to_string()));
        self.pinned.remove(name);
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        for saved in self.stack.iter_mut().filter(|s| s.as_deref() == Some(name)) {
            *saved = None;
        }
    }

    /// Move pin/selection state from `old` to `new` once the store has
    /// rewritten the member keys.
    pub(crate) fn rename(&mut self, old: &str, new: &str) {
        let leftover = self.members.remove(&Some(old.to_string())).unwrap_or_default();
        let pinned = self.pinned.remove(old);
        if pinned {
            self.pinned.insert(new.to_string());
        }
        if pinned || !leftover.is_empty() {
            self.members.entry(Some(new.to_string())).or_default().extend(leftover);
        }
        if self.current.as_deref() == Some(old) {
            self.current = Some(new.to_string());
        }
        for saved in self.stack.iter_mut().filter(|s| s.as_deref() == Some(old)) {
            *saved = Some(new.to_string());
        }
    }

    pub(crate) fn insert(&mut self, space: Option<&str>, key: &str) {
        self.members.entry(space.map(str::to_string)).or_default().insert(key.to_string());
    }

    pub(crate) fn remove(&mut self, space: Option<&str>, key: &str) {
        let slot = space.map(str::to_string);
        let now_empty = match self.members.get_mut(&slot) {
            Some(keys) => {
                keys.remove(key);
                keys.is_empty()
            }
            None => return,
        };
        let pinned = space.is_some_and(|name| self.pinned.contains(name));
        if now_empty && !pinned {
            self.members.remove(&slot);
        }
    }

    pub(crate) fn clear_members(&mut self) {
        self.members.retain(|space, keys| {
            keys.clear();
            space.as_ref().is_some_and(|name| self.pinned.contains(name))
        });
    }
}
