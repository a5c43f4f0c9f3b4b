//! Riak-compatible HTTP server for the rkv store.
//!
//! Serves the subset of the Riak 1.4 HTTP API that client test suites rely
//! on: bucket and key listing, object get/put/delete with secondary index
//! headers, index queries, and `/mapred`. Map transforms are resolved
//! through a [`FunctionRegistry`] rather than evaluated.

pub mod config;
pub mod error;
pub mod handler;
pub mod registry;
pub mod request;
pub mod router;
pub mod server;
pub mod state;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use error::{ServerError, ServerResult};
pub use registry::FunctionRegistry;
pub use request::{MapRedRequest, Phase, PhaseSpec};
pub use server::{RkvServer, ServerHandle};
pub use state::AppState;
