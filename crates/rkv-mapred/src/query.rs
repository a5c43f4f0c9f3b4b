//! Query inputs and input selection.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use rkv_index::KeyFilterChain;
use rkv_types::{IndexName, IndexValue};

use crate::error::{MapReduceError, MapReduceResult};
use crate::function::MapFunction;

/// Which objects of the bucket feed the map stage.
#[derive(Clone, Debug, PartialEq)]
pub enum InputSelector {
    /// Every entry of the bucket.
    Bucket,
    /// Entries whose index value equals `value`.
    IndexEq { index: IndexName, value: IndexValue },
    /// Entries whose index value lies in `[start, end]`.
    IndexRange {
        index: IndexName,
        start: IndexValue,
        end: IndexValue,
    },
}

/// The `inputs` part of a map/reduce request.
///
/// Accepts either a bare bucket name or an object:
///
/// ```json
/// {"bucket": "b", "index": "age_int", "start": 18, "end": 30, "key_filters": [["starts_with", "user_"]]}
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryInputs {
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_filters: Option<Vec<Value>>,
}

impl QueryInputs {
    pub fn bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Parse the request's `inputs` value.
    pub fn from_json(inputs: &Value) -> MapReduceResult<Self> {
        match inputs {
            Value::String(bucket) => Ok(Self::bucket(bucket.as_str())),
            Value::Object(fields) => {
                if !matches!(fields.get("bucket"), Some(Value::String(_))) {
                    return Err(MapReduceError::invalid("bucket name not found"));
                }
                serde_json::from_value(inputs.clone())
                    .map_err(|e| MapReduceError::invalid(format!("malformed inputs: {e}")))
            }
            _ => Err(MapReduceError::invalid("bucket name not found")),
        }
    }

    /// Resolve the input selector.
    ///
    /// `index` + `key` selects by equality; otherwise `index` + `start`
    /// selects by range and then `end` is required; otherwise the whole
    /// bucket. A field counts as present when it is non-null.
    pub fn selector(&self) -> MapReduceResult<InputSelector> {
        let present = |field: &Option<Value>| field.as_ref().filter(|v| !v.is_null()).cloned();

        let Some(index) = self.index.as_deref() else {
            return Ok(InputSelector::Bucket);
        };
        let index = IndexName::new(index);

        if let Some(key) = present(&self.key) {
            return Ok(InputSelector::IndexEq {
                value: index_value(&index, &key)?,
                index,
            });
        }
        if let Some(start) = present(&self.start) {
            let end = present(&self.end).ok_or_else(|| {
                MapReduceError::invalid(format!("range on index {index} has no end"))
            })?;
            return Ok(InputSelector::IndexRange {
                start: index_value(&index, &start)?,
                end: index_value(&index, &end)?,
                index,
            });
        }
        Ok(InputSelector::Bucket)
    }

    pub fn key_filter_chain(&self) -> MapReduceResult<KeyFilterChain> {
        match &self.key_filters {
            Some(specs) => Ok(KeyFilterChain::from_json(specs)?),
            None => Ok(KeyFilterChain::default()),
        }
    }
}

// A string bound on an integer index is parsed as an integer.
fn index_value(index: &IndexName, raw: &Value) -> MapReduceResult<IndexValue> {
    let converted = match raw {
        Value::String(s) => index.parse_value(s),
        other => IndexValue::from_json(other),
    };
    converted.map_err(|e| MapReduceError::invalid(e.to_string()))
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// The map stage: a transform and its opaque argument.
#[derive(Clone)]
pub struct MapPhase {
    pub function: Arc<dyn MapFunction>,
    pub arg: Value,
}

impl MapPhase {
    pub fn new(function: Arc<dyn MapFunction>, arg: Value) -> Self {
        Self { function, arg }
    }
}

impl fmt::Debug for MapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapPhase").field("arg", &self.arg).finish_non_exhaustive()
    }
}

/// A fully resolved query, ready for the engine.
#[derive(Clone, Debug)]
pub struct MapReduceQuery {
    pub bucket: String,
    pub selector: InputSelector,
    pub key_filters: KeyFilterChain,
    pub map: MapPhase,
}

impl MapReduceQuery {
    /// A whole-bucket query with no key filters.
    pub fn new(bucket: impl Into<String>, map: MapPhase) -> Self {
        Self {
            bucket: bucket.into(),
            selector: InputSelector::Bucket,
            key_filters: KeyFilterChain::default(),
            map,
        }
    }

    pub fn from_inputs(inputs: &QueryInputs, map: MapPhase) -> MapReduceResult<Self> {
        Ok(Self {
            bucket: inputs.bucket.clone(),
            selector: inputs.selector()?,
            key_filters: inputs.key_filter_chain()?,
            map,
        })
    }

    pub fn with_selector(mut self, selector: InputSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_key_filters(mut self, key_filters: KeyFilterChain) -> Self {
        self.key_filters = key_filters;
        self
    }
}
