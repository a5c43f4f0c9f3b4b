//! Foundation types for rkv, an in-memory Riak test double.
//!
//! Every other rkv crate depends on `rkv-types`.
//!
//! # Key Types
//!
//! - [`IndexType`] -- Integer vs. string index, resolved from the index name
//! - [`IndexName`] -- A lower-cased index name with its resolved type
//! - [`IndexValue`] -- A typed secondary index value
//! - [`Indexes`] -- The secondary index set attached to one stored key
//!
//! The [`loose`] module holds the dynamically-typed comparison rules that
//! key filters and reduce phases share.

pub mod error;
pub mod index;
pub mod loose;

pub use error::TypeError;
pub use index::{IndexName, IndexType, IndexValue, Indexes, INTEGER_INDEX_SUFFIX};
