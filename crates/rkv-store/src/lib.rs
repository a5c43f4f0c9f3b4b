//! Bucket/key object storage for rkv.
//!
//! A [`Database`] maps bucket names to [`Bucket`]s, and a bucket maps keys to
//! [`Entry`]s. Each entry carries an opaque JSON value, its secondary
//! [`Indexes`](rkv_types::Indexes), and a revision counter that increments on
//! every value write.
//!
//! # Storage Backends
//!
//! All backends implement the [`KvStore`] trait:
//!
//! - [`InMemoryStore`] -- `RwLock`-guarded [`Database`], the only backend
//!
//! # Rules
//!
//! 1. Buckets are created on first reference and never removed.
//! 2. Writing to a missing key creates it with no indexes and revision 0
//!    before applying the write.
//! 3. Only value writes bump the revision; index writes replace the whole
//!    index set and leave the revision alone.
//! 4. Deleting a key drops its entry entirely. There are no tombstones.
//! 5. Nothing is persisted.

pub mod bucket;
pub mod database;
pub mod entry;
pub mod error;
pub mod memory;
pub mod traits;

pub use bucket::{Bucket, ObjectSet};
pub use database::Database;
pub use entry::{Entry, Revision};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use traits::KvStore;
