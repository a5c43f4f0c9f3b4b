//! Key filters: predicates over key names.
//!
//! A filter is given as a `[name, argument]` pair. Filters test the key
//! string only, never the stored value. The ordering filters put the
//! argument on the left-hand side: `greater_than` keeps a key when
//! `argument > key`.

use serde_json::Value;
use tracing::warn;

use rkv_store::ObjectSet;
use rkv_types::loose::{loose_eq, loose_ge, loose_gt, loose_le, loose_lt, to_display_string};

use crate::error::{IndexError, IndexResult};

/// What an unrecognized filter name does to the object set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownFilterPolicy {
    /// The unknown filter matches no key, so the chain yields nothing.
    /// The request still succeeds.
    #[default]
    DropAll,
}

/// A single key predicate.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyFilter {
    GreaterThan(Value),
    LessThan(Value),
    GreaterThanEq(Value),
    LessThanEq(Value),
    Neq(Value),
    Eq(Value),
    EndsWith(String),
    StartsWith(String),
    /// A filter name this engine does not implement.
    Unknown { name: String },
}

impl KeyFilter {
    /// Build a filter from its name and argument.
    ///
    /// `ends_with`/`starts_with` take a string or a number (used in its
    /// string form).
    pub fn new(name: &str, arg: Value) -> IndexResult<Self> {
        Ok(match name {
            "greater_than" => Self::GreaterThan(arg),
            "less_than" => Self::LessThan(arg),
            "greater_than_eq" => Self::GreaterThanEq(arg),
            "less_than_eq" => Self::LessThanEq(arg),
            "neq" => Self::Neq(arg),
            "eq" => Self::Eq(arg),
            "ends_with" => Self::EndsWith(affix(name, &arg)?),
            "starts_with" => Self::StartsWith(affix(name, &arg)?),
            other => Self::Unknown {
                name: other.to_string(),
            },
        })
    }

    /// Parse a `[name, argument]` JSON pair.
    pub fn from_json(spec: &Value) -> IndexResult<Self> {
        match spec.as_array().map(Vec::as_slice) {
            Some([Value::String(name), arg]) => Self::new(name, arg.clone()),
            Some([Value::String(name)]) => Self::new(name, Value::Null),
            _ => Err(IndexError::MalformedFilter(spec.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::GreaterThan(_) => "greater_than",
            Self::LessThan(_) => "less_than",
            Self::GreaterThanEq(_) => "greater_than_eq",
            Self::LessThanEq(_) => "less_than_eq",
            Self::Neq(_) => "neq",
            Self::Eq(_) => "eq",
            Self::EndsWith(_) => "ends_with",
            Self::StartsWith(_) => "starts_with",
            Self::Unknown { name } => name.as_str(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }

    /// Test a key against this filter.
    pub fn matches(&self, key: &str) -> bool {
        let key_value = || Value::String(key.to_string());
        match self {
            Self::GreaterThan(arg) => loose_gt(arg, &key_value()),
            Self::LessThan(arg) => loose_lt(arg, &key_value()),
            Self::GreaterThanEq(arg) => loose_ge(arg, &key_value()),
            Self::LessThanEq(arg) => loose_le(arg, &key_value()),
            Self::Neq(arg) => !loose_eq(&key_value(), arg),
            Self::Eq(arg) => loose_eq(&key_value(), arg),
            Self::EndsWith(suffix) => key.ends_with(suffix.as_str()),
            Self::StartsWith(prefix) => key.starts_with(prefix.as_str()),
            Self::Unknown { .. } => false,
        }
    }
}

fn affix(filter: &str, arg: &Value) -> IndexResult<String> {
    match arg {
        Value::String(s) => Ok(s.clone()),
        Value::Number(_) => Ok(to_display_string(arg)),
        other => Err(IndexError::InvalidArgument {
            filter: filter.to_string(),
            reason: format!("expected a string, got {other}"),
        }),
    }
}

/// An ordered list of key filters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyFilterChain {
    filters: Vec<KeyFilter>,
    unknown: UnknownFilterPolicy,
}

impl KeyFilterChain {
    pub fn new(filters: Vec<KeyFilter>) -> Self {
        Self {
            filters,
            unknown: UnknownFilterPolicy::default(),
        }
    }

    /// Parse a JSON list of `[name, argument]` pairs.
    pub fn from_json(specs: &[Value]) -> IndexResult<Self> {
        let filters = specs
            .iter()
            .map(KeyFilter::from_json)
            .collect::<IndexResult<Vec<_>>>()?;
        Ok(Self::new(filters))
    }

    pub fn filters(&self) -> &[KeyFilter] {
        &self.filters
    }

    pub fn unknown_policy(&self) -> UnknownFilterPolicy {
        self.unknown
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply each filter in order, each narrowing the remaining set.
    pub fn apply(&self, mut objects: ObjectSet) -> ObjectSet {
        for filter in &self.filters {
            if filter.is_unknown() {
                warn!(
                    filter = filter.name(),
                    policy = ?self.unknown,
                    "unknown key filter"
                );
                match self.unknown {
                    UnknownFilterPolicy::DropAll => objects.clear(),
                }
                continue;
            }
            objects.retain(|key, _| filter.matches(key));
        }
        objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rkv_store::Entry;
    use serde_json::json;

    fn objects(keys: &[&str]) -> ObjectSet {
        keys.iter()
            .map(|k| (k.to_string(), Entry::empty()))
            .collect()
    }

    fn chain(specs: Value) -> KeyFilterChain {
        KeyFilterChain::from_json(specs.as_array().unwrap()).unwrap()
    }

    fn surviving(chain: &KeyFilterChain, keys: &[&str]) -> Vec<String> {
        chain.apply(objects(keys)).into_keys().collect()
    }

    #[test]
    fn ends_with_partitions_keys() {
        let chain = chain(json!([["ends_with", "endsWithA"]]));
        let keys = surviving(
            &chain,
            &["key_endsWithA", "key_also_endsWithA", "key_endsWithA_Not"],
        );
        assert_eq!(keys, vec!["key_also_endsWithA", "key_endsWithA"]);
    }

    #[test]
    fn starts_with_partitions_keys() {
        let chain = chain(json!([["starts_with", "startsWithA"]]));
        let keys = surviving(
            &chain,
            &["startsWithA_key", "startsWithA_key_also", "starts_not_WithA_key", "key1"],
        );
        assert_eq!(keys, vec!["startsWithA_key", "startsWithA_key_also"]);
    }

    #[test]
    fn numeric_affix_uses_string_form() {
        let filter = KeyFilter::new("ends_with", json!(7)).unwrap();
        assert!(filter.matches("order-17"));
        assert!(!filter.matches("order-18"));
    }

    #[test]
    fn affix_rejects_structured_argument() {
        let err = KeyFilter::new("starts_with", json!({"a": 1})).unwrap_err();
        assert!(matches!(err, IndexError::InvalidArgument { .. }));
    }

    #[test]
    fn ordering_filters_put_argument_first() {
        // argument > key
        let gt = KeyFilter::new("greater_than", json!("m")).unwrap();
        assert!(gt.matches("a"));
        assert!(!gt.matches("z"));
        assert!(!gt.matches("m"));

        // argument < key
        let lt = KeyFilter::new("less_than", json!("m")).unwrap();
        assert!(lt.matches("z"));
        assert!(!lt.matches("a"));

        let ge = KeyFilter::new("greater_than_eq", json!("m")).unwrap();
        assert!(ge.matches("m"));
        assert!(ge.matches("a"));

        let le = KeyFilter::new("less_than_eq", json!("m")).unwrap();
        assert!(le.matches("m"));
        assert!(le.matches("z"));
    }

    #[test]
    fn numeric_argument_compares_key_as_number() {
        let gt = KeyFilter::new("greater_than", json!(10)).unwrap();
        assert!(gt.matches("9"));
        assert!(!gt.matches("11"));
        // a non-numeric key is unordered against a number
        assert!(!gt.matches("key1"));
    }

    #[test]
    fn eq_and_neq_are_loose() {
        let eq = KeyFilter::new("eq", json!(5)).unwrap();
        assert!(eq.matches("5"));
        assert!(eq.matches("5.0"));
        assert!(!eq.matches("five"));

        let neq = KeyFilter::new("neq", json!("key1")).unwrap();
        assert!(!neq.matches("key1"));
        assert!(neq.matches("key2"));
    }

    #[test]
    fn filters_apply_in_order() {
        let chain = chain(json!([["starts_with", "user_"], ["neq", "user_2"]]));
        let keys = surviving(&chain, &["user_1", "user_2", "admin_1"]);
        assert_eq!(keys, vec!["user_1"]);
    }

    #[test]
    fn unknown_filter_drops_everything() {
        let chain = chain(json!([["tokenize", "-"]]));
        assert_eq!(chain.unknown_policy(), UnknownFilterPolicy::DropAll);
        assert!(surviving(&chain, &["a", "b"]).is_empty());
    }

    #[test]
    fn malformed_filter_is_an_error() {
        assert!(matches!(
            KeyFilterChain::from_json(&[json!("ends_with")]),
            Err(IndexError::MalformedFilter(_))
        ));
        assert!(matches!(
            KeyFilterChain::from_json(&[json!([1, 2])]),
            Err(IndexError::MalformedFilter(_))
        ));
    }

    #[test]
    fn empty_chain_keeps_everything() {
        let chain = KeyFilterChain::default();
        assert!(chain.is_empty());
        assert_eq!(surviving(&chain, &["a", "b"]).len(), 2);
    }

    proptest! {
        #[test]
        fn affix_filters_partition(keys in proptest::collection::btree_set("[ab]{1,4}", 0..12)) {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            let ends = chain(json!([["ends_with", "b"]]));
            let kept = surviving(&ends, &keys);
            for key in &keys {
                prop_assert_eq!(kept.contains(&key.to_string()), key.ends_with('b'));
            }
        }
    }
}
