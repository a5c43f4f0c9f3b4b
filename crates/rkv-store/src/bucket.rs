//! A named keyspace.

use std::collections::BTreeMap;

use rkv_types::Indexes;
use serde_json::Value;

use crate::entry::{Entry, Revision};

/// A subset of a bucket's entries, keyed by key name.
pub type ObjectSet = BTreeMap<String, Entry>;

/// A named, independent keyspace owning its entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bucket {
    name: String,
    entries: ObjectSet,
}

impl Bucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Every entry in the bucket.
    pub fn objects(&self) -> &ObjectSet {
        &self.entries
    }

    /// Replace the value of `key`, creating the entry if needed, and
    /// return the new revision.
    pub fn put_value(&mut self, key: &str, value: Value) -> Revision {
        let entry = self.entries.entry(key.to_string()).or_insert_with(Entry::empty);
        entry.value = value;
        entry.revision += 1;
        entry.revision
    }

    /// Replace the whole index set of `key`, creating the entry if needed.
    pub fn put_indexes(&mut self, key: &str, indexes: Indexes) {
        let entry = self.entries.entry(key.to_string()).or_insert_with(Entry::empty);
        entry.indexes = indexes;
    }

    /// Remove `key`, returning its entry if it existed.
    pub fn delete(&mut self, key: &str) -> Option<Entry> {
        self.entries.remove(key)
    }
}
