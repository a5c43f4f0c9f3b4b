//! Built-in reduce operations.
//!
//! Each reduce takes the current value sequence and an optional argument and
//! returns a new sequence. Element comparisons use the loose rules of
//! [`rkv_types::loose`].
//!
//! `limit` keeps the first `arg - 1` elements, not the first `arg`. Riak
//! clients in the wild depend on this, so it is kept as-is.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use rkv_types::loose::{loose_gt, loose_lt, to_display_string, to_number};

use crate::error::{MapReduceError, MapReduceResult, TransformError};
use crate::function::Comparator;

/// The built-in reduces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    Sum,
    Min,
    Max,
    Sort,
    NumericSort,
    Limit,
    Slice,
}

impl ReduceOp {
    pub const ALL: [ReduceOp; 7] = [
        Self::Sum,
        Self::Min,
        Self::Max,
        Self::Sort,
        Self::NumericSort,
        Self::Limit,
        Self::Slice,
    ];

    /// Resolve a reduce by short name (`sum`) or Riak name (`Riak.reduceSum`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == name || op.riak_name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Sort => "sort",
            Self::NumericSort => "numeric_sort",
            Self::Limit => "limit",
            Self::Slice => "slice",
        }
    }

    pub fn riak_name(self) -> &'static str {
        match self {
            Self::Sum => "Riak.reduceSum",
            Self::Min => "Riak.reduceMin",
            Self::Max => "Riak.reduceMax",
            Self::Sort => "Riak.reduceSort",
            Self::NumericSort => "Riak.reduceNumericSort",
            Self::Limit => "Riak.reduceLimit",
            Self::Slice => "Riak.reduceSlice",
        }
    }
}

impl FromStr for ReduceOp {
    type Err = MapReduceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| MapReduceError::invalid(format!("unknown reduce: {s}")))
    }
}

impl fmt::Display for ReduceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// ReducePhase
// ---------------------------------------------------------------------------

/// A reduce with its argument and, for `sort`, an optional comparator.
#[derive(Clone)]
pub struct ReducePhase {
    pub op: ReduceOp,
    pub arg: Value,
    pub comparator: Option<Arc<dyn Comparator>>,
}

impl ReducePhase {
    pub fn new(op: ReduceOp, arg: Value) -> Self {
        Self {
            op,
            arg,
            comparator: None,
        }
    }

    pub fn with_comparator(mut self, comparator: Arc<dyn Comparator>) -> Self {
        self.comparator = Some(comparator);
        self
    }

    pub fn apply(&self, values: Vec<Value>) -> MapReduceResult<Vec<Value>> {
        match self.op {
            ReduceOp::Sum => reduce_sum(values),
            ReduceOp::Min => Ok(reduce_min(values)),
            ReduceOp::Max => Ok(reduce_max(values)),
            ReduceOp::Sort => Ok(reduce_sort(values, self.comparator.as_deref())),
            ReduceOp::NumericSort => Ok(reduce_numeric_sort(values)),
            ReduceOp::Limit => reduce_limit(values, &self.arg),
            ReduceOp::Slice => reduce_slice(values, &self.arg),
        }
    }
}

impl fmt::Debug for ReducePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReducePhase")
            .field("op", &self.op)
            .field("arg", &self.arg)
            .field("comparator", &self.comparator.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Returns `true` for a value flagged as a not-found marker
/// (an object carrying a `not_found` field).
pub fn is_not_found(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.contains_key("not_found"))
}

/// Sum of the numeric values, ignoring not-found markers. `[0]` when
/// nothing is left to add.
pub fn reduce_sum(values: Vec<Value>) -> MapReduceResult<Vec<Value>> {
    let mut exact: Option<i64> = Some(0);
    let mut approx = 0.0_f64;
    for value in values.iter().filter(|v| !is_not_found(v)) {
        let Value::Number(n) = value else {
            return Err(MapReduceError::invalid(format!(
                "sum: non-numeric value {value}"
            )));
        };
        approx += n.as_f64().unwrap_or(f64::NAN);
        exact = match (exact, n.as_i64()) {
            (Some(acc), Some(i)) => acc.checked_add(i),
            _ => None,
        };
    }
    let total = match exact {
        Some(i) => Value::from(i),
        None => Value::from(approx),
    };
    Ok(vec![total])
}

/// The single smallest element, or `[]` for empty input.
pub fn reduce_min(values: Vec<Value>) -> Vec<Value> {
    values
        .into_iter()
        .reduce(|prev, next| if loose_lt(&prev, &next) { prev } else { next })
        .into_iter()
        .collect()
}

/// The single largest element, or `[]` for empty input.
pub fn reduce_max(values: Vec<Value>) -> Vec<Value> {
    values
        .into_iter()
        .reduce(|prev, next| if loose_gt(&prev, &next) { prev } else { next })
        .into_iter()
        .collect()
}

/// Sort with `comparator` if given; if it is absent or fails, sort by the
/// elements' string forms.
pub fn reduce_sort(mut values: Vec<Value>, comparator: Option<&dyn Comparator>) -> Vec<Value> {
    if let Some(comparator) = comparator {
        match merge_sort(values.clone(), comparator) {
            Ok(sorted) => return sorted,
            Err(e) => warn!(error = %e, "sort comparator failed, using default ordering"),
        }
    }
    values.sort_by_cached_key(to_display_string);
    values
}

// Stable, and stops at the first comparator error.
fn merge_sort(mut values: Vec<Value>, comparator: &dyn Comparator) -> Result<Vec<Value>, TransformError> {
    if values.len() <= 1 {
        return Ok(values);
    }
    let right = values.split_off(values.len() / 2);
    let left = merge_sort(values, comparator)?;
    let right = merge_sort(right, comparator)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        let take_right = comparator.compare(a, b)? == Ordering::Greater;
        if take_right {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

/// Ascending numeric order. Elements that are not numbers sort last.
pub fn reduce_numeric_sort(mut values: Vec<Value>) -> Vec<Value> {
    values.sort_by(|a, b| {
        let (x, y) = (to_number(a), to_number(b));
        match (x.is_nan(), y.is_nan()) {
            (false, false) => x.total_cmp(&y),
            (a_nan, b_nan) => a_nan.cmp(&b_nan),
        }
    });
    values
}

/// The first `arg - 1` elements.
pub fn reduce_limit(values: Vec<Value>, arg: &Value) -> MapReduceResult<Vec<Value>> {
    let limit = arg
        .as_f64()
        .ok_or_else(|| MapReduceError::invalid(format!("limit: expected a number, got {arg}")))?;
    Ok(slice(values, 0.0, limit - 1.0))
}

/// Elements `[start, end)` for `arg = [start, end]`. When `end` is past the
/// end of the input, the input is returned unchanged.
pub fn reduce_slice(values: Vec<Value>, arg: &Value) -> MapReduceResult<Vec<Value>> {
    let bounds = arg.as_array().map(Vec::as_slice);
    let (start, end) = match bounds {
        Some([start, end]) => match (start.as_f64(), end.as_f64()) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(slice_arg_error(arg)),
        },
        _ => return Err(slice_arg_error(arg)),
    };
    if end > values.len() as f64 {
        return Ok(values);
    }
    Ok(slice(values, start, end))
}

fn slice_arg_error(arg: &Value) -> MapReduceError {
    MapReduceError::invalid(format!("slice: expected [start, end], got {arg}"))
}

/// Array slicing where negative positions count back from the end.
fn slice(values: Vec<Value>, start: f64, end: f64) -> Vec<Value> {
    let len = values.len();
    let from = relative_position(start, len);
    let to = relative_position(end, len);
    if from >= to {
        return Vec::new();
    }
    values.into_iter().skip(from).take(to - from).collect()
}

fn relative_position(position: f64, len: usize) -> usize {
    if position.is_nan() {
        return 0;
    }
    let len = len as f64;
    let position = position.trunc();
    let resolved = if position < 0.0 {
        (len + position).max(0.0)
    } else {
        position.min(len)
    };
    resolved as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn seq(values: Value) -> Vec<Value> {
        values.as_array().unwrap().clone()
    }

    #[test]
    fn names_resolve() {
        assert_eq!(ReduceOp::from_name("sum"), Some(ReduceOp::Sum));
        assert_eq!(ReduceOp::from_name("Riak.reduceNumericSort"), Some(ReduceOp::NumericSort));
        assert_eq!(ReduceOp::from_name("Riak.reduceNope"), None);
        assert!("median".parse::<ReduceOp>().is_err());
        for op in ReduceOp::ALL {
            assert_eq!(op.riak_name().parse::<ReduceOp>().unwrap(), op);
        }
    }

    // -----------------------------------------------------------------------
    // sum
    // -----------------------------------------------------------------------

    #[test]
    fn sum_of_empty_is_zero() {
        assert_eq!(reduce_sum(Vec::new()).unwrap(), vec![json!(0)]);
    }

    #[test]
    fn sum_skips_not_found() {
        let values = seq(json!([1, 2, {"not_found": {"bucket": "b", "key": "k"}}, 4]));
        assert_eq!(reduce_sum(values).unwrap(), vec![json!(7)]);
    }

    #[test]
    fn sum_of_only_not_found_is_zero() {
        let values = seq(json!([{"not_found": true}]));
        assert_eq!(reduce_sum(values).unwrap(), vec![json!(0)]);
    }

    #[test]
    fn sum_mixes_floats() {
        assert_eq!(reduce_sum(seq(json!([1, 0.5]))).unwrap(), vec![json!(1.5)]);
    }

    #[test]
    fn sum_rejects_non_numbers() {
        assert!(matches!(
            reduce_sum(seq(json!([1, "2"]))),
            Err(MapReduceError::InvalidInput(_))
        ));
    }

    // -----------------------------------------------------------------------
    // min / max
    // -----------------------------------------------------------------------

    #[test]
    fn min_and_max() {
        let values = seq(json!([3, 1, 2]));
        assert_eq!(reduce_min(values.clone()), vec![json!(1)]);
        assert_eq!(reduce_max(values), vec![json!(3)]);
    }

    #[test]
    fn min_and_max_of_empty() {
        assert!(reduce_min(Vec::new()).is_empty());
        assert!(reduce_max(Vec::new()).is_empty());
    }

    #[test]
    fn min_of_strings_is_lexicographic() {
        assert_eq!(reduce_min(seq(json!(["b", "a", "c"]))), vec![json!("a")]);
    }

    // -----------------------------------------------------------------------
    // sort
    // -----------------------------------------------------------------------

    #[test]
    fn default_sort_uses_string_form() {
        let sorted = reduce_sort(seq(json!([10, 9, 1])), None);
        assert_eq!(sorted, seq(json!([1, 10, 9])));
    }

    #[test]
    fn sort_with_comparator() {
        let descending = |a: &Value, b: &Value| -> Result<Ordering, TransformError> {
            Ok(to_number(b).total_cmp(&to_number(a)))
        };
        let sorted = reduce_sort(seq(json!([1, 3, 2])), Some(&descending as &dyn Comparator));
        assert_eq!(sorted, seq(json!([3, 2, 1])));
    }

    #[test]
    fn failing_comparator_falls_back_to_default() {
        let failing = |_: &Value, _: &Value| -> Result<Ordering, TransformError> {
            Err(TransformError::new("boom"))
        };
        let sorted = reduce_sort(seq(json!(["b", "c", "a"])), Some(&failing as &dyn Comparator));
        assert_eq!(sorted, seq(json!(["a", "b", "c"])));
    }

    #[test]
    fn numeric_sort() {
        let sorted = reduce_numeric_sort(seq(json!([10, 9, "x", 1.5, -3])));
        assert_eq!(sorted, seq(json!([-3, 1.5, 9, 10, "x"])));
    }

    // -----------------------------------------------------------------------
    // limit / slice
    // -----------------------------------------------------------------------

    #[test]
    fn limit_keeps_one_fewer_than_asked() {
        // arg - 1 elements: limit 1 yields nothing.
        let values = seq(json!([1, 2, 3]));
        assert!(reduce_limit(values.clone(), &json!(1)).unwrap().is_empty());
        assert_eq!(reduce_limit(values, &json!(3)).unwrap(), seq(json!([1, 2])));
    }

    #[test]
    fn limit_zero_drops_the_last_element() {
        let values = seq(json!([1, 2, 3]));
        assert_eq!(reduce_limit(values, &json!(0)).unwrap(), seq(json!([1, 2])));
    }

    #[test]
    fn limit_requires_a_number() {
        assert!(reduce_limit(Vec::new(), &json!("3")).is_err());
    }

    #[test]
    fn slice_past_the_end_returns_input_unchanged() {
        let values = seq(json!(["only"]));
        assert_eq!(reduce_slice(values, &json!([0, 100])).unwrap(), seq(json!(["only"])));
    }

    #[test]
    fn slice_within_bounds() {
        let values = seq(json!([0, 1, 2, 3, 4]));
        assert_eq!(reduce_slice(values.clone(), &json!([1, 3])).unwrap(), seq(json!([1, 2])));
        assert_eq!(reduce_slice(values, &json!([3, 1])).unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn slice_start_past_end_of_input() {
        // end is within bounds, start is not
        let values = seq(json!([0, 1, 2]));
        assert!(reduce_slice(values, &json!([5, 3])).unwrap().is_empty());
    }

    #[test]
    fn slice_requires_pair() {
        assert!(reduce_slice(Vec::new(), &json!(2)).is_err());
        assert!(reduce_slice(Vec::new(), &json!([1])).is_err());
        assert!(reduce_slice(Vec::new(), &json!(["a", "b"])).is_err());
    }

    #[test]
    fn phase_dispatches_by_op() {
        let phase = ReducePhase::new(ReduceOp::Slice, json!([0, 1]));
        assert_eq!(phase.apply(seq(json!([5, 6]))).unwrap(), seq(json!([5])));
        assert!(format!("{phase:?}").contains("Slice"));
    }

    proptest! {
        #[test]
        fn limit_keeps_one_less(len in 0usize..20, limit in 1i64..25) {
            let values: Vec<Value> = (0..len).map(Value::from).collect();
            let kept = reduce_limit(values, &json!(limit)).unwrap();
            let expected = usize::try_from(limit - 1).unwrap().min(len);
            prop_assert_eq!(kept.len(), expected);
        }

        #[test]
        fn numeric_sort_is_ascending(ns in proptest::collection::vec(-1000i64..1000, 0..30)) {
            let values: Vec<Value> = ns.iter().map(|n| Value::from(*n)).collect();
            let sorted = reduce_numeric_sort(values);
            let numbers: Vec<i64> = sorted.iter().map(|v| v.as_i64().unwrap()).collect();
            prop_assert!(numbers.windows(2).all(|w| w[0] <= w[1]));
            prop_assert_eq!(numbers.len(), ns.len());
        }
    }
}
