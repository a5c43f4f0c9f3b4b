use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rkv_types::Indexes;
use serde_json::Value;
use tracing::debug;

use crate::bucket::Bucket;
use crate::database::Database;
use crate::entry::Entry;
use crate::error::{StoreError, StoreResult};
use crate::traits::KvStore;

/// In-memory store backed by a single [`Database`].
///
/// One `RwLock` serializes writers across all buckets, so a revision bump
/// and an index replacement are each observed atomically by readers.
/// Reads of an already-known bucket only take the read lock.
pub struct InMemoryStore {
    db: RwLock<Database>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::with_database(Database::new())
    }

    /// Wrap an existing database.
    pub fn with_database(db: Database) -> Self {
        Self { db: RwLock::new(db) }
    }

    /// Number of buckets referenced so far.
    pub fn bucket_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Database>> {
        self.db
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Database>> {
        self.db
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    /// Run `f` against the named bucket, creating it first if it is unknown.
    fn with_bucket<R>(&self, name: &str, f: impl FnOnce(&Bucket) -> R) -> StoreResult<R> {
        {
            let db = self.read()?;
            if let Some(bucket) = db.bucket(name) {
                return Ok(f(bucket));
            }
        }
        let mut db = self.write()?;
        Ok(f(db.get_or_create_bucket(name)))
    }

    fn with_bucket_mut<R>(&self, name: &str, f: impl FnOnce(&mut Bucket) -> R) -> StoreResult<R> {
        let mut db = self.write()?;
        Ok(f(db.get_or_create_bucket(name)))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for InMemoryStore {
    fn list_buckets(&self) -> StoreResult<Vec<String>> {
        Ok(self.read()?.bucket_names())
    }

    fn bucket_snapshot(&self, bucket: &str) -> StoreResult<Bucket> {
        self.with_bucket(bucket, Bucket::clone)
    }

    fn list_keys(&self, bucket: &str) -> StoreResult<Vec<String>> {
        self.with_bucket(bucket, Bucket::keys)
    }

    fn has_key(&self, bucket: &str, key: &str) -> StoreResult<bool> {
        self.with_bucket(bucket, |b| b.has_key(key))
    }

    fn get_entry(&self, bucket: &str, key: &str) -> StoreResult<Entry> {
        self.with_bucket(bucket, |b| b.get(key).cloned())?
            .ok_or_else(|| StoreError::not_found(bucket, key))
    }

    fn put_value(&self, bucket: &str, key: &str, value: Value) -> StoreResult<()> {
        let revision = self.with_bucket_mut(bucket, |b| b.put_value(key, value))?;
        debug!(bucket, key, revision, "value written");
        Ok(())
    }

    fn put_indexes(&self, bucket: &str, key: &str, indexes: Indexes) -> StoreResult<()> {
        let count = indexes.len();
        self.with_bucket_mut(bucket, |b| b.put_indexes(key, indexes))?;
        debug!(bucket, key, count, "indexes replaced");
        Ok(())
    }

    fn put(&self, bucket: &str, key: &str, value: Value, indexes: Indexes) -> StoreResult<()> {
        let revision = self.with_bucket_mut(bucket, |b| {
            let revision = b.put_value(key, value);
            b.put_indexes(key, indexes);
            revision
        })?;
        debug!(bucket, key, revision, "object written");
        Ok(())
    }

    fn delete_key(&self, bucket: &str, key: &str) -> StoreResult<bool> {
        let existed = self.with_bucket_mut(bucket, |b| b.delete(key).is_some())?;
        debug!(bucket, key, existed, "key deleted");
        Ok(existed)
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.bucket_count().unwrap_or_default();
        f.debug_struct("InMemoryStore")
            .field("bucket_count", &count)
            .finish()
    }
}
