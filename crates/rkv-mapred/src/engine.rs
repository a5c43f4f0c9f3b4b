//! Runs map/reduce queries against a store.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use rkv_index::{equality_query, range_query};
use rkv_store::{KvStore, ObjectSet};

use crate::error::{MapReduceError, MapReduceResult};
use crate::object::MapObject;
use crate::query::{InputSelector, MapPhase, MapReduceQuery};

/// Query executor over an injected store.
#[derive(Clone)]
pub struct MapReduceEngine {
    store: Arc<dyn KvStore>,
}

impl MapReduceEngine {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Input selection followed by key filtering.
    ///
    /// Works on a snapshot of the bucket, so concurrent writes never show up
    /// halfway through a query.
    pub fn select(&self, query: &MapReduceQuery) -> MapReduceResult<ObjectSet> {
        let bucket = self.store.bucket_snapshot(&query.bucket)?;
        let selected = match &query.selector {
            InputSelector::Bucket => bucket.objects().clone(),
            InputSelector::IndexEq { index, value } => equality_query(&bucket, index, value),
            InputSelector::IndexRange { index, start, end } => {
                range_query(&bucket, index, start, end)?
            }
        };
        let before = selected.len();
        let filtered = query.key_filters.apply(selected);
        debug!(
            bucket = %query.bucket,
            selector = ?query.selector,
            selected = before,
            kept = filtered.len(),
            "map/reduce inputs"
        );
        Ok(filtered)
    }

    /// Select, filter, and map. Reduces are applied by the caller.
    pub fn run(&self, query: &MapReduceQuery) -> MapReduceResult<Vec<Value>> {
        let objects = self.select(query)?;
        run_map(&objects, &query.map)
    }
}

impl fmt::Debug for MapReduceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapReduceEngine").finish_non_exhaustive()
    }
}

/// Apply the map phase to every object and concatenate the outputs in
/// iteration order. The first transform failure aborts the whole run.
pub fn run_map(objects: &ObjectSet, phase: &MapPhase) -> MapReduceResult<Vec<Value>> {
    let mut results = Vec::new();
    for (key, entry) in objects {
        let object = MapObject::from_entry(key, entry)?;
        let output = phase
            .function
            .map(&object, key, &phase.arg)
            .map_err(|source| MapReduceError::TransformFailure {
                key: key.clone(),
                source,
            })?;
        results.extend(output);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{MapValues, MapValuesJson};
    use crate::error::TransformError;
    use crate::query::QueryInputs;
    use crate::reduce::{ReduceOp, ReducePhase};
    use rkv_index::KeyFilterChain;
    use rkv_store::InMemoryStore;
    use rkv_types::{IndexName, IndexValue, Indexes};
    use serde_json::json;

    fn seeded() -> MapReduceEngine {
        let store = InMemoryStore::new();
        let rows = [
            ("key1", json!({"n": 1}), "indexVal1", 1i64),
            ("key2", json!({"n": 2}), "indexVal2", 3),
            ("key3", json!({"n": 3}), "indexVal1", 2),
        ];
        for (key, value, text, number) in rows {
            let mut indexes = Indexes::new();
            indexes.insert("text_bin", text);
            indexes.insert("number_int", number);
            store.put("b", key, value, indexes).unwrap();
        }
        MapReduceEngine::new(Arc::new(store))
    }

    fn json_map() -> MapPhase {
        MapPhase::new(Arc::new(MapValuesJson), Value::Null)
    }

    fn sorted_by_n(mut values: Vec<Value>) -> Vec<i64> {
        let mut ns: Vec<i64> = values.drain(..).map(|v| v["n"].as_i64().unwrap()).collect();
        ns.sort_unstable();
        ns
    }

    #[test]
    fn whole_bucket_map() {
        let engine = seeded();
        let out = engine.run(&MapReduceQuery::new("b", json_map())).unwrap();
        assert_eq!(sorted_by_n(out), vec![1, 2, 3]);
    }

    #[test]
    fn equality_selection() {
        let engine = seeded();
        let query = MapReduceQuery::new("b", json_map()).with_selector(InputSelector::IndexEq {
            index: IndexName::new("TEXT_BIN"),
            value: IndexValue::from("indexVal1"),
        });
        assert_eq!(sorted_by_n(engine.run(&query).unwrap()), vec![1, 3]);
    }

    #[test]
    fn range_selection_from_inputs() {
        let engine = seeded();
        let inputs = QueryInputs::from_json(&json!({
            "bucket": "b", "index": "number_int", "start": 0, "end": 2
        }))
        .unwrap();
        let query = MapReduceQuery::from_inputs(&inputs, json_map()).unwrap();
        assert_eq!(sorted_by_n(engine.run(&query).unwrap()), vec![1, 3]);
    }

    #[test]
    fn key_filters_narrow_selection() {
        let engine = seeded();
        let filters = KeyFilterChain::from_json(&[json!(["neq", "key1"])]).unwrap();
        let query = MapReduceQuery::new("b", json_map()).with_key_filters(filters);
        assert_eq!(sorted_by_n(engine.run(&query).unwrap()), vec![2, 3]);
    }

    #[test]
    fn unknown_filter_yields_empty_result() {
        let engine = seeded();
        let filters = KeyFilterChain::from_json(&[json!(["to_upper"])]).unwrap();
        let query = MapReduceQuery::new("b", json_map()).with_key_filters(filters);
        assert!(engine.run(&query).unwrap().is_empty());
    }

    #[test]
    fn unknown_bucket_is_empty() {
        let engine = seeded();
        let out = engine.run(&MapReduceQuery::new("nothing", json_map())).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn outputs_are_concatenated() {
        let engine = seeded();
        let twice = |object: &MapObject, key: &str, _: &Value| -> Result<Vec<Value>, TransformError> {
            Ok(vec![json!(key), json!(object.values.len())])
        };
        let out = engine
            .run(&MapReduceQuery::new("b", MapPhase::new(Arc::new(twice), Value::Null)))
            .unwrap();
        assert_eq!(out.len(), 6);
        for pair in out.chunks(2) {
            assert!(pair[0].is_string());
            assert_eq!(pair[1], json!(1));
        }
    }

    #[test]
    fn map_arg_reaches_transform() {
        let engine = seeded();
        let echo = |_: &MapObject, _: &str, arg: &Value| -> Result<Vec<Value>, TransformError> {
            Ok(vec![arg["val"].clone()])
        };
        let phase = MapPhase::new(Arc::new(echo), json!({"val": "test"}));
        let out = engine.run(&MapReduceQuery::new("b", phase)).unwrap();
        assert_eq!(out, vec![json!("test"); 3]);
    }

    #[test]
    fn transform_failure_names_the_key() {
        let engine = seeded();
        let fail_on_key2 = |_: &MapObject, key: &str, _: &Value| -> Result<Vec<Value>, TransformError> {
            if key == "key2" {
                Err(TransformError::new("boom"))
            } else {
                Ok(vec![])
            }
        };
        let phase = MapPhase::new(Arc::new(fail_on_key2), Value::Null);
        let err = engine.run(&MapReduceQuery::new("b", phase)).unwrap_err();
        match err {
            MapReduceError::TransformFailure { key, source } => {
                assert_eq!(key, "key2");
                assert_eq!(source.message(), "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_input_maps_to_empty_output() {
        let phase = MapPhase::new(Arc::new(MapValues), Value::Null);
        assert!(run_map(&ObjectSet::new(), &phase).unwrap().is_empty());
    }

    #[test]
    fn map_then_reduce() {
        let engine = seeded();
        let numbers = |object: &MapObject, _: &str, _: &Value| -> Result<Vec<Value>, TransformError> {
            let parsed: Value = serde_json::from_str(object.data().unwrap_or("null"))
                .map_err(|e| TransformError::new(e.to_string()))?;
            Ok(vec![parsed["n"].clone()])
        };
        let mapped = engine
            .run(&MapReduceQuery::new("b", MapPhase::new(Arc::new(numbers), Value::Null)))
            .unwrap();
        let summed = ReducePhase::new(ReduceOp::Sum, Value::Null).apply(mapped).unwrap();
        assert_eq!(summed, vec![json!(6)]);
    }
}
