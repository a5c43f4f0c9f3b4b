//! Secondary index names and values.
//!
//! An index is numeric exactly when its name ends with [`INTEGER_INDEX_SUFFIX`].
//! The suffix check is case-sensitive and runs against the name as supplied,
//! while the name used for storage and lookup is lower-cased.

use std::cmp::Ordering;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

/// Index names ending in this suffix hold integer values.
pub const INTEGER_INDEX_SUFFIX: &str = "_int";

// ---------------------------------------------------------------------------
// IndexType
// ---------------------------------------------------------------------------

/// The value type an index holds, determined once from its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    Integer,
    String,
}

impl IndexType {
    /// Resolve the type of an index from its raw name.
    pub fn of(name: &str) -> Self {
        if name.ends_with(INTEGER_INDEX_SUFFIX) {
            Self::Integer
        } else {
            Self::String
        }
    }

    /// Parse a raw textual value (a header or path segment) as this type.
    ///
    /// Integer parsing accepts leading whitespace, an optional sign and a
    /// run of decimal digits; trailing characters after the digits are
    /// ignored (`"12px"` parses as `12`).
    pub fn parse_value(self, index: &str, raw: &str) -> Result<IndexValue, TypeError> {
        match self {
            Self::String => Ok(IndexValue::String(raw.to_string())),
            Self::Integer => parse_leading_integer(raw)
                .map(IndexValue::Integer)
                .ok_or_else(|| TypeError::InvalidInteger {
                    index: index.to_string(),
                    value: raw.to_string(),
                }),
        }
    }
}

fn parse_leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

// ---------------------------------------------------------------------------
// IndexName
// ---------------------------------------------------------------------------

/// An index name normalized for lookup, carrying its resolved [`IndexType`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexName {
    name: String,
    kind: IndexType,
}

impl IndexName {
    /// Normalize a raw index name.
    ///
    /// The type is resolved before lower-casing, so `"AGE_INT"` is a
    /// string index stored as `"age_int"`.
    pub fn new(raw: &str) -> Self {
        Self {
            kind: IndexType::of(raw),
            name: raw.to_lowercase(),
        }
    }

    /// The lower-cased name.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> IndexType {
        self.kind
    }

    /// Parse a raw textual value according to this index's type.
    pub fn parse_value(&self, raw: &str) -> Result<IndexValue, TypeError> {
        self.kind.parse_value(&self.name, raw)
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ---------------------------------------------------------------------------
// IndexValue
// ---------------------------------------------------------------------------

/// A secondary index value.
///
/// Values of different variants never compare equal and are unordered
/// relative to each other.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexValue {
    Integer(i64),
    String(String),
}

impl IndexValue {
    /// Convert a JSON value into an index value.
    ///
    /// Only integral numbers and strings are index values.
    pub fn from_json(value: &Value) -> Result<Self, TypeError> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .ok_or_else(|| TypeError::UnsupportedIndexValue(value.to_string())),
            Value::String(s) => Ok(Self::String(s.clone())),
            other => Err(TypeError::UnsupportedIndexValue(other.to_string())),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Integer(i) => Value::from(*i),
            Self::String(s) => Value::String(s.clone()),
        }
    }

    pub fn kind(&self) -> IndexType {
        match self {
            Self::Integer(_) => IndexType::Integer,
            Self::String(_) => IndexType::String,
        }
    }

    /// Returns `true` if `low <= self <= high`.
    pub fn within(&self, low: &IndexValue, high: &IndexValue) -> bool {
        matches!(
            self.partial_cmp(low),
            Some(Ordering::Greater | Ordering::Equal)
        ) && matches!(self.partial_cmp(high), Some(Ordering::Less | Ordering::Equal))
    }
}

impl PartialOrd for IndexValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for IndexValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for IndexValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

// ---------------------------------------------------------------------------
// Indexes
// ---------------------------------------------------------------------------

/// The secondary indexes attached to one key, keyed by lower-cased name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Indexes(BTreeMap<String, IndexValue>);

impl Indexes {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Set an index, lower-casing its name. Returns the previous value.
    pub fn insert(&mut self, name: &str, value: impl Into<IndexValue>) -> Option<IndexValue> {
        self.0.insert(name.to_lowercase(), value.into())
    }

    /// Look up an index by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&IndexValue> {
        self.0.get(&name.to_lowercase())
    }

    /// Look up an index by an already-normalized name.
    pub fn lookup(&self, name: &IndexName) -> Option<&IndexValue> {
        self.0.get(name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, IndexValue> {
        self.0.iter()
    }
}

impl<S: AsRef<str>, V: Into<IndexValue>> FromIterator<(S, V)> for Indexes {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut indexes = Self::new();
        for (name, value) in iter {
            indexes.insert(name.as_ref(), value);
        }
        indexes
    }
}

impl<'a> IntoIterator for &'a Indexes {
    type Item = (&'a String, &'a IndexValue);
    type IntoIter = btree_map::Iter<'a, String, IndexValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
