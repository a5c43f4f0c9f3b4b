use rkv_types::Indexes;
use serde_json::Value;

use crate::bucket::Bucket;
use crate::entry::{Entry, Revision};
use crate::error::StoreResult;

/// Bucket/key object store.
///
/// All implementations must satisfy these invariants:
/// - Any operation naming a bucket creates that bucket if it is unknown.
/// - Reads of a missing key fail with `StoreError::NotFound`.
/// - `put_value` bumps the revision by exactly one; `put_indexes` replaces
///   the full index set and never touches the revision.
/// - Each call is applied atomically with respect to concurrent readers.
pub trait KvStore: Send + Sync {
    /// Names of all buckets ever referenced, in no guaranteed order.
    fn list_buckets(&self) -> StoreResult<Vec<String>>;

    /// A consistent copy of the bucket's current contents.
    fn bucket_snapshot(&self, bucket: &str) -> StoreResult<Bucket>;

    /// Keys of the bucket, in no guaranteed order.
    fn list_keys(&self, bucket: &str) -> StoreResult<Vec<String>>;

    fn has_key(&self, bucket: &str, key: &str) -> StoreResult<bool>;

    /// The full entry for `key`.
    fn get_entry(&self, bucket: &str, key: &str) -> StoreResult<Entry>;

    /// Replace the value of `key`, creating the key if absent.
    fn put_value(&self, bucket: &str, key: &str, value: Value) -> StoreResult<()>;

    /// Replace the entire index set of `key`, creating the key if absent.
    fn put_indexes(&self, bucket: &str, key: &str, indexes: Indexes) -> StoreResult<()>;

    /// `put_value` followed by `put_indexes`, applied as one write.
    fn put(&self, bucket: &str, key: &str, value: Value, indexes: Indexes) -> StoreResult<()>;

    /// Remove `key`. Returns `true` if it existed; deleting a missing key is
    /// a no-op.
    fn delete_key(&self, bucket: &str, key: &str) -> StoreResult<bool>;

    fn get_value(&self, bucket: &str, key: &str) -> StoreResult<Value> {
        self.get_entry(bucket, key).map(|entry| entry.value)
    }

    fn get_indexes(&self, bucket: &str, key: &str) -> StoreResult<Indexes> {
        self.get_entry(bucket, key).map(|entry| entry.indexes)
    }

    fn get_revision(&self, bucket: &str, key: &str) -> StoreResult<Revision> {
        self.get_entry(bucket, key).map(|entry| entry.revision)
    }
}
