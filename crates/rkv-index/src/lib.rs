//! Index query engine for rkv.
//!
//! Read-only lookups over a [`Bucket`](rkv_store::Bucket): equality and
//! inclusive-range matches on a named secondary index, and an ordered chain
//! of predicates over key names. Every lookup is a linear scan.
//!
//! # Key Types
//!
//! - [`equality_query`] / [`range_query`] -- index lookups returning an
//!   [`ObjectSet`](rkv_store::ObjectSet)
//! - [`KeyFilter`] -- one key predicate, parsed from `[name, argument]`
//! - [`KeyFilterChain`] -- filters applied in order, each narrowing the set
//! - [`UnknownFilterPolicy`] -- what an unrecognized filter name does

pub mod error;
pub mod filter;
pub mod query;

pub use error::{IndexError, IndexResult};
pub use filter::{KeyFilter, KeyFilterChain, UnknownFilterPolicy};
pub use query::{equality_query, keys_for_equality, keys_for_range, range_query};
