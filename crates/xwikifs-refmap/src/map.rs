//! The [`RefMap`] container.
//!
//! A `RefMap` is two layers kept side by side:
//!
//! - the **raw tree**: keys in insertion order, each holding either a plain
//!   value or a reference marker;
//! - the **reference table**: reference id to content, for the markers
//!   declared at this level.
//!
//! Reads go through [`RefMap::get`], which substitutes content for markers.
//! Nested maps own their own reference tables.

use std::collections::{BTreeMap, BTreeSet};

use crate::marker::RefMarker;
use crate::value::{Value, ValueRef};

/// What a key holds in the raw tree.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Slot {
    Value(Value),
    /// A loaded scalar plus the exact text it was written with.
    Sourced { value: Value, text: String },
    Reference(RefMarker),
}

/// An ordered key/value map whose string values may be references to
/// external files.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RefMap {
    entries: Vec<(String, Slot)>,
    references: BTreeMap<String, String>,
    /// Keys that were written unquoted in the loaded source.
    plain_keys: BTreeSet<String>,
}

impl RefMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys at this level.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Resolved entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ValueRef<'_>)> {
        self.entries
            .iter()
            .filter_map(|(k, slot)| self.resolve(slot).map(|v| (k.as_str(), v)))
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// Get the resolved value for a key.
    ///
    /// Reference keys read as the referenced content; the marker itself is
    /// only visible through [`RefMap::marker`].
    pub fn get(&self, key: &str) -> Option<ValueRef<'_>> {
        let idx = self.position(key)?;
        self.resolve(&self.entries[idx].1)
    }

    /// Get the text for a key, if it holds a string or a reference.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    /// Get a nested map.
    pub fn get_map(&self, key: &str) -> Option<&RefMap> {
        self.get(key).and_then(|v| v.as_map())
    }

    /// The raw marker for a reference key.
    pub fn marker(&self, key: &str) -> Option<&RefMarker> {
        let idx = self.position(key)?;
        match &self.entries[idx].1 {
            Slot::Reference(marker) => Some(marker),
            _ => None,
        }
    }

    /// Returns `true` if the key currently holds a reference marker.
    pub fn is_reference(&self, key: &str) -> bool {
        self.marker(key).is_some()
    }

    /// Reference ids declared at this level, in key order.
    pub fn declared_references(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|(_, slot)| match slot {
                Slot::Reference(marker) => Some(marker.id()),
                _ => None,
            })
            .collect()
    }

    /// This level's reference table (id to content).
    pub fn references(&self) -> &BTreeMap<String, String> {
        &self.references
    }

    /// Content stored for a reference id at this level.
    pub fn reference_content(&self, id: &str) -> Option<&str> {
        self.references.get(id).map(String::as_str)
    }

    // ---------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------

    /// Store a value, returning the previous resolved value.
    ///
    /// - If the key holds a reference and `value` is a string, only the
    ///   referenced content changes; the marker and its file path stay.
    /// - Otherwise the stored value is replaced, demoting any reference.
    /// - A string matching the marker grammar declares a reference whose
    ///   content is whatever this level already holds for that id, or empty.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();

        let Some(idx) = self.position(&key) else {
            let slot = self.slot_for(value);
            self.entries.push((key, slot));
            return None;
        };

        let current_id = match &self.entries[idx].1 {
            Slot::Reference(marker) => Some(marker.id().to_string()),
            _ => None,
        };

        match (current_id, value) {
            (Some(id), Value::String(content)) => {
                self.references.insert(id, content).map(Value::String)
            }
            (_, value) => {
                let slot = self.slot_for(value);
                let old = std::mem::replace(&mut self.entries[idx].1, slot);
                self.release(old)
            }
        }
    }

    /// Declare `key` as a reference to `id` with the given content.
    ///
    /// Overwrites any previous content for `id` at this level and returns it.
    pub fn put_reference(
        &mut self,
        key: impl Into<String>,
        id: impl Into<String>,
        content: impl Into<String>,
    ) -> Option<String> {
        let id = id.into();
        self.declare(key.into(), RefMarker::new(id.clone()));
        self.references.insert(id, content.into())
    }

    /// Remove a key, returning its resolved value.
    ///
    /// Removing a reference key drops the content for its id unless another
    /// key at this level still declares the same id.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.position(key)?;
        let (_, slot) = self.entries.remove(idx);
        self.plain_keys.remove(key);
        self.release(slot)
    }

    /// Remove every key and every reference.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.references.clear();
        self.plain_keys.clear();
    }

    // ---------------------------------------------------------------
    // Crate internals
    // ---------------------------------------------------------------

    /// Point `key` at `marker` without touching content, releasing any
    /// reference the key held before.
    pub(crate) fn declare(&mut self, key: String, marker: RefMarker) {
        match self.position(&key) {
            Some(idx) => {
                let old = std::mem::replace(&mut self.entries[idx].1, Slot::Reference(marker));
                if let Slot::Reference(old_marker) = old {
                    self.release_id(old_marker.id());
                }
            }
            None => self.entries.push((key, Slot::Reference(marker))),
        }
    }

    pub(crate) fn set_reference_content(&mut self, id: String, content: String) {
        self.references.insert(id, content);
    }

    /// Append a loaded scalar that remembers its source text.
    pub(crate) fn push_sourced(&mut self, key: String, value: Value, text: String) {
        self.entries.push((key, Slot::Sourced { value, text }));
    }

    pub(crate) fn mark_plain_key(&mut self, key: &str) {
        self.plain_keys.insert(key.to_string());
    }

    pub(crate) fn is_plain_key(&self, key: &str) -> bool {
        self.plain_keys.contains(key)
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.entries.iter().map(|(k, slot)| (k.as_str(), slot))
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn resolve<'a>(&'a self, slot: &'a Slot) -> Option<ValueRef<'a>> {
        match slot {
            Slot::Value(value) | Slot::Sourced { value, .. } => Some(value.view()),
            Slot::Reference(marker) => self
                .references
                .get(marker.id())
                .map(|content| ValueRef::Text(content)),
        }
    }

    fn slot_for(&mut self, value: Value) -> Slot {
        if let Value::String(text) = &value {
            if let Some(marker) = RefMarker::parse(text) {
                self.references
                    .entry(marker.id().to_string())
                    .or_default();
                return Slot::Reference(marker);
            }
        }
        Slot::Value(value)
    }

    fn release(&mut self, slot: Slot) -> Option<Value> {
        match slot {
            Slot::Value(value) | Slot::Sourced { value, .. } => Some(value),
            Slot::Reference(marker) => self.release_id(marker.id()).map(Value::String),
        }
    }

    /// Drop the content for `id` if no remaining key declares it.
    fn release_id(&mut self, id: &str) -> Option<String> {
        let still_declared = self.entries.iter().any(|(_, slot)| {
            matches!(slot, Slot::Reference(marker) if marker.id() == id)
        });
        if still_declared {
            self.references.get(id).cloned()
        } else {
            self.references.remove(id)
        }
    }
}
