//! The stored unit for one key.

use rkv_types::{IndexName, IndexValue, Indexes};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-key write counter.
pub type Revision = u64;

/// A stored value with its secondary indexes and revision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// The stored document. Opaque to the store.
    pub value: Value,
    /// Secondary indexes, keyed by lower-cased name.
    pub indexes: Indexes,
    /// Number of value writes this entry has received.
    pub revision: Revision,
}

impl Entry {
    /// A freshly created entry: empty object value, no indexes, revision 0.
    pub fn empty() -> Self {
        Self {
            value: Value::Object(Map::new()),
            indexes: Indexes::new(),
            revision: 0,
        }
    }

    /// The value of the named index, if set.
    pub fn index(&self, name: &IndexName) -> Option<&IndexValue> {
        self.indexes.lookup(name)
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::empty()
    }
}
