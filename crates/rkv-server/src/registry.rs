//! Named map functions and sort comparators.
//!
//! Map/reduce requests carry their transforms as text. The server never
//! evaluates that text; it looks the transform up here instead, either by
//! `name` or by the exact `source` string a test suite registered ahead of
//! time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rkv_mapred::{Comparator, MapByFields, MapFunction, MapReduceError, MapReduceResult, MapValues, MapValuesJson};

use crate::request::PhaseSpec;

#[derive(Clone)]
pub struct FunctionRegistry {
    named: HashMap<String, Arc<dyn MapFunction>>,
    sources: HashMap<String, Arc<dyn MapFunction>>,
    comparators: HashMap<String, Arc<dyn Comparator>>,
}

impl FunctionRegistry {
    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Self {
            named: HashMap::new(),
            sources: HashMap::new(),
            comparators: HashMap::new(),
        }
    }

    /// A registry holding the stock `Riak.map*` functions.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry
            .register_named("Riak.mapValues", MapValues)
            .register_named("Riak.mapValuesJson", MapValuesJson)
            .register_named("Riak.mapByFields", MapByFields);
        registry
    }

    pub fn register_named(
        &mut self,
        name: impl Into<String>,
        function: impl MapFunction + 'static,
    ) -> &mut Self {
        self.named.insert(name.into(), Arc::new(function));
        self
    }

    /// Register a transform under its source text. Surrounding whitespace is
    /// ignored on both sides of the lookup.
    pub fn register_source(
        &mut self,
        source: impl AsRef<str>,
        function: impl MapFunction + 'static,
    ) -> &mut Self {
        self.sources
            .insert(source.as_ref().trim().to_string(), Arc::new(function));
        self
    }

    pub fn register_comparator(
        &mut self,
        source: impl AsRef<str>,
        comparator: impl Comparator + 'static,
    ) -> &mut Self {
        self.comparators
            .insert(source.as_ref().trim().to_string(), Arc::new(comparator));
        self
    }

    /// Find the transform a map phase asks for. `name` wins over `source`.
    pub fn resolve_map(&self, spec: &PhaseSpec) -> MapReduceResult<Arc<dyn MapFunction>> {
        if let Some(name) = spec.name.as_deref() {
            return self
                .named
                .get(name)
                .cloned()
                .ok_or_else(|| MapReduceError::invalid(format!("unknown map function: {name}")));
        }
        if let Some(source) = spec.source.as_deref() {
            return self
                .sources
                .get(source.trim())
                .cloned()
                .ok_or_else(|| MapReduceError::invalid("map source is not registered"));
        }
        Err(MapReduceError::invalid("map phase has neither name nor source"))
    }

    /// The comparator registered for `source`, if any.
    pub fn comparator(&self, source: &str) -> Option<Arc<dyn Comparator>> {
        self.comparators.get(source.trim()).cloned()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut named: Vec<&String> = self.named.keys().collect();
        named.sort();
        f.debug_struct("FunctionRegistry")
            .field("named", &named)
            .field("sources", &self.sources.len())
            .field("comparators", &self.comparators.len())
            .finish()
    }
}
