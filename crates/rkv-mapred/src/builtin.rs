//! Stock map functions, mirroring Riak's built-in JavaScript library.

use serde_json::Value;

use rkv_types::loose::loose_eq;

use crate::error::TransformError;
use crate::function::MapFunction;
use crate::object::MapObject;

fn first_data<'a>(object: &'a MapObject) -> Result<&'a str, TransformError> {
    object
        .data()
        .ok_or_else(|| TransformError::new(format!("object {} has no values", object.key)))
}

/// `Riak.mapValues`: the serialized data of each object, as a string.
#[derive(Clone, Copy, Debug, Default)]
pub struct MapValues;

impl MapFunction for MapValues {
    fn map(&self, object: &MapObject, _key: &str, _arg: &Value) -> Result<Vec<Value>, TransformError> {
        Ok(vec![Value::String(first_data(object)?.to_string())])
    }
}

/// `Riak.mapValuesJson`: the data of each object, parsed as JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct MapValuesJson;

impl MapFunction for MapValuesJson {
    fn map(&self, object: &MapObject, _key: &str, _arg: &Value) -> Result<Vec<Value>, TransformError> {
        let data = first_data(object)?;
        let parsed = serde_json::from_str(data)
            .map_err(|e| TransformError::new(format!("invalid JSON in {}: {e}", object.key)))?;
        Ok(vec![parsed])
    }
}

/// `Riak.mapByFields`: the parsed data, kept only when every field of the
/// argument object loosely equals the same field of the data.
///
/// A field missing from the data matches only a `null` argument field.
#[derive(Clone, Copy, Debug, Default)]
pub struct MapByFields;

impl MapFunction for MapByFields {
    fn map(&self, object: &MapObject, key: &str, arg: &Value) -> Result<Vec<Value>, TransformError> {
        let mut parsed = MapValuesJson.map(object, key, arg)?;
        let Some(document) = parsed.pop() else {
            return Ok(Vec::new());
        };
        if let Value::Object(fields) = arg {
            for (field, expected) in fields {
                let actual = document.get(field).unwrap_or(&Value::Null);
                if !loose_eq(actual, expected) {
                    return Ok(Vec::new());
                }
            }
        }
        Ok(vec![document])
    }
}
