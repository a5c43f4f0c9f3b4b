//! The record handed to map functions.
//!
//! Its JSON shape matches what Riak passes to a JavaScript map phase:
//!
//! ```json
//! {"key": "k", "values": [{"metadata": {"index": {..}}, "indexes": {..}, "data": "<json text>"}]}
//! ```

use rkv_store::Entry;
use rkv_types::Indexes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MapReduceError, MapReduceResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapMetadata {
    pub index: Indexes,
}

/// One stored value of a map object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    pub metadata: MapMetadata,
    pub indexes: Indexes,
    /// The stored value, serialized as JSON text.
    pub data: String,
}

/// A selected object as seen by a map function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    pub key: String,
    pub values: Vec<MapValue>,
}

impl MapObject {
    /// Build the record for one stored entry.
    pub fn from_entry(key: &str, entry: &Entry) -> MapReduceResult<Self> {
        let data = serde_json::to_string(&entry.value)
            .map_err(|e| MapReduceError::Serialization(e.to_string()))?;
        Ok(Self {
            key: key.to_string(),
            values: vec![MapValue {
                metadata: MapMetadata {
                    index: entry.indexes.clone(),
                },
                indexes: entry.indexes.clone(),
                data,
            }],
        })
    }

    /// The serialized data of the first value.
    pub fn data(&self) -> Option<&str> {
        self.values.first().map(|v| v.data.as_str())
    }

    /// The record as a dynamic JSON value.
    pub fn to_json(&self) -> MapReduceResult<Value> {
        serde_json::to_value(self).map_err(|e| MapReduceError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rkv_types::IndexValue;
    use serde_json::json;

    #[test]
    fn record_shape_matches_riak() {
        let mut entry = Entry::empty();
        entry.value = json!({"content1": "val1"});
        entry.indexes.insert("number_int", IndexValue::Integer(1));

        let object = MapObject::from_entry("key1", &entry).unwrap();
        assert_eq!(
            object.to_json().unwrap(),
            json!({
                "key": "key1",
                "values": [{
                    "metadata": {"index": {"number_int": 1}},
                    "indexes": {"number_int": 1},
                    "data": "{\"content1\":\"val1\"}"
                }]
            })
        );
    }

    #[test]
    fn data_is_serialized_text() {
        let mut entry = Entry::empty();
        entry.value = json!("plain");
        let object = MapObject::from_entry("k", &entry).unwrap();
        assert_eq!(object.data(), Some("\"plain\""));
    }
}
