//! Map/reduce query pipeline for rkv.
//!
//! A query selects objects from one bucket (whole bucket, index equality,
//! or index range), narrows them with a [`KeyFilterChain`](rkv_index::KeyFilterChain),
//! runs a caller-supplied [`MapFunction`] over each survivor, and
//! concatenates the outputs. The built-in reduces in [`reduce`] can then be
//! applied to that output; chaining them is up to the caller.
//!
//! # Trust
//!
//! Map functions and sort comparators are arbitrary caller code, run with
//! full trust and no sandboxing. Turning query text into a [`MapFunction`]
//! is the transport layer's job.
//!
//! # Modules
//!
//! - [`object`] -- the record handed to map functions
//! - [`function`] -- [`MapFunction`] and [`Comparator`] strategy traits
//! - [`builtin`] -- stock map functions (`mapValues`, `mapValuesJson`, `mapByFields`)
//! - [`reduce`] -- built-in reduce operations
//! - [`query`] -- request inputs and input selection
//! - [`engine`] -- [`MapReduceEngine`], running queries against a store

pub mod builtin;
pub mod engine;
pub mod error;
pub mod function;
pub mod object;
pub mod query;
pub mod reduce;

pub use builtin::{MapByFields, MapValues, MapValuesJson};
pub use engine::{run_map, MapReduceEngine};
pub use error::{MapReduceError, MapReduceResult, TransformError};
pub use function::{Comparator, MapFunction};
pub use object::{MapMetadata, MapObject, MapValue};
pub use query::{InputSelector, MapPhase, MapReduceQuery, QueryInputs};
pub use reduce::{ReduceOp, ReducePhase};
