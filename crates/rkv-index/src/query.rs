//! Equality and range lookups over a secondary index.
//!
//! Both lookups return the matching entries intact, under their original
//! keys. Entries without the named index never match.

use rkv_store::{Bucket, Entry, ObjectSet};
use rkv_types::{IndexName, IndexValue};
use tracing::debug;

use crate::error::{IndexError, IndexResult};

fn select(bucket: &Bucket, predicate: impl Fn(&Entry) -> bool) -> ObjectSet {
    bucket
        .objects()
        .iter()
        .filter(|(_, entry)| predicate(entry))
        .map(|(key, entry)| (key.clone(), entry.clone()))
        .collect()
}

/// Entries whose `index` value equals `value`.
///
/// Integers compare numerically and strings exactly; an integer never
/// equals a string.
pub fn equality_query(bucket: &Bucket, index: &IndexName, value: &IndexValue) -> ObjectSet {
    let matches = select(bucket, |entry| entry.index(index) == Some(value));
    debug!(bucket = bucket.name(), %index, %value, matched = matches.len(), "equality lookup");
    matches
}

/// Entries whose `index` value lies in `[low, high]`, both ends inclusive.
///
/// `low` and `high` must have the same type.
pub fn range_query(
    bucket: &Bucket,
    index: &IndexName,
    low: &IndexValue,
    high: &IndexValue,
) -> IndexResult<ObjectSet> {
    if low.kind() != high.kind() {
        return Err(IndexError::MismatchedBounds {
            low: low.clone(),
            high: high.clone(),
        });
    }
    let matches = select(bucket, |entry| {
        entry
            .index(index)
            .is_some_and(|value| value.within(low, high))
    });
    debug!(bucket = bucket.name(), %index, %low, %high, matched = matches.len(), "range lookup");
    Ok(matches)
}

/// Keys of [`equality_query`] matches.
pub fn keys_for_equality(bucket: &Bucket, index: &IndexName, value: &IndexValue) -> Vec<String> {
    equality_query(bucket, index, value).into_keys().collect()
}

/// Keys of [`range_query`] matches.
pub fn keys_for_range(
    bucket: &Bucket,
    index: &IndexName,
    low: &IndexValue,
    high: &IndexValue,
) -> IndexResult<Vec<String>> {
    Ok(range_query(bucket, index, low, high)?.into_keys().collect())
}
