use std::fmt;
use std::sync::Arc;

use rkv_store::KvStore;

use crate::registry::FunctionRegistry;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KvStore>,
    pub registry: Arc<FunctionRegistry>,
}

impl AppState {
    pub fn new(store: Arc<dyn KvStore>, registry: Arc<FunctionRegistry>) -> Self {
        Self { store, registry }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
