//! Pluggable query logic.
//!
//! The engine never interprets query text. Callers hand it typed strategies:
//! a [`MapFunction`] for the map stage and, optionally, a [`Comparator`] for
//! the `sort` reduce. Plain closures implement both traits.

use std::cmp::Ordering;

use serde_json::Value;

use crate::error::TransformError;
use crate::object::MapObject;

/// Converts one selected object into zero or more output values.
pub trait MapFunction: Send + Sync {
    /// `arg` is the opaque argument supplied with the map phase.
    fn map(&self, object: &MapObject, key: &str, arg: &Value) -> Result<Vec<Value>, TransformError>;
}

impl<F> MapFunction for F
where
    F: Fn(&MapObject, &str, &Value) -> Result<Vec<Value>, TransformError> + Send + Sync,
{
    fn map(&self, object: &MapObject, key: &str, arg: &Value) -> Result<Vec<Value>, TransformError> {
        self(object, key, arg)
    }
}

/// Orders two values for the `sort` reduce.
pub trait Comparator: Send + Sync {
    fn compare(&self, a: &Value, b: &Value) -> Result<Ordering, TransformError>;
}

impl<F> Comparator for F
where
    F: Fn(&Value, &Value) -> Result<Ordering, TransformError> + Send + Sync,
{
    fn compare(&self, a: &Value, b: &Value) -> Result<Ordering, TransformError> {
        self(a, b)
    }
}
