//! Riak HTTP API handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use rkv_index::{keys_for_equality, keys_for_range};
use rkv_mapred::{
    MapPhase, MapReduceEngine, MapReduceError, MapReduceQuery, QueryInputs, ReduceOp, ReducePhase,
};
use rkv_store::StoreError;
use rkv_types::{IndexName, Indexes};

use crate::error::{ServerError, ServerResult};
use crate::registry::FunctionRegistry;
use crate::request::{MapRedRequest, Phase, PhaseSpec};
use crate::state::AppState;

/// Prefix of the headers carrying secondary indexes.
pub const INDEX_HEADER_PREFIX: &str = "x-riak-index-";

/// Header carrying the entry's revision.
pub const VCLOCK_HEADER: &str = "x-riak-vclock";

#[derive(Debug, Default, Deserialize)]
pub struct BucketsParams {
    pub buckets: Option<String>,
}

/// `GET /buckets?buckets=true`
pub async fn list_buckets(
    State(state): State<AppState>,
    Query(params): Query<BucketsParams>,
) -> ServerResult<Json<Value>> {
    if params.buckets.as_deref() != Some("true") {
        return Err(ServerError::invalid("you need to call this with ?buckets=true"));
    }
    Ok(Json(json!({ "buckets": state.store.list_buckets()? })))
}

/// `GET /riak/{bucket}?keys=true|stream`
///
/// Both key modes answer with one JSON document.
pub async fn list_keys(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
) -> ServerResult<Json<Value>> {
    Ok(Json(json!({ "keys": state.store.list_keys(&bucket)? })))
}

/// `GET /{riak|buckets}/{bucket}/index/{index}/{value}`
pub async fn index_equality(
    State(state): State<AppState>,
    Path((bucket, index, value)): Path<(String, String, String)>,
) -> ServerResult<Json<Value>> {
    let index = IndexName::new(&index);
    let value = index.parse_value(&value)?;
    let snapshot = state.store.bucket_snapshot(&bucket)?;
    Ok(Json(json!({ "keys": keys_for_equality(&snapshot, &index, &value) })))
}

/// `GET /{riak|buckets}/{bucket}/index/{index}/{from}/{to}`
pub async fn index_range(
    State(state): State<AppState>,
    Path((bucket, index, from, to)): Path<(String, String, String, String)>,
) -> ServerResult<Json<Value>> {
    let index = IndexName::new(&index);
    let (low, high) = (index.parse_value(&from)?, index.parse_value(&to)?);
    let snapshot = state.store.bucket_snapshot(&bucket)?;
    Ok(Json(json!({ "keys": keys_for_range(&snapshot, &index, &low, &high)? })))
}

/// `GET /riak/{bucket}/{key}`
pub async fn get_object(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> ServerResult<Response> {
    let entry = state.store.get_entry(&bucket, &key)?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(HeaderName::from_static(VCLOCK_HEADER), HeaderValue::from(entry.revision));
    for (name, value) in &entry.indexes {
        let name = HeaderName::try_from(format!("{INDEX_HEADER_PREFIX}{name}"))
            .map_err(|e| ServerError::Internal(format!("index header {name}: {e}")))?;
        let value = HeaderValue::try_from(value.to_string())
            .map_err(|e| ServerError::Internal(format!("index header {name}: {e}")))?;
        headers.append(name, value);
    }

    let body = serde_json::to_vec(&entry.value).map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok((headers, body).into_response())
}

/// `PUT /riak/{bucket}/{key}`
///
/// Stores the JSON body (an empty body stores `{}`) and replaces the index
/// set with the `x-riak-index-*` headers.
pub async fn put_object(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<StatusCode> {
    let value = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ServerError::invalid(format!("body is not JSON: {e}")))?
    };
    let indexes = indexes_from_headers(&headers)?;
    state.store.put(&bucket, &key, value, indexes)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /riak/{bucket}/{key}`
pub async fn delete_object(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> ServerResult<StatusCode> {
    if !state.store.delete_key(&bucket, &key)? {
        return Err(StoreError::not_found(&bucket, &key).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /mapred`
pub async fn map_reduce(State(state): State<AppState>, body: Bytes) -> ServerResult<Json<Vec<Value>>> {
    let request = MapRedRequest::from_slice(&body)
        .map_err(|e| ServerError::invalid(format!("malformed map/reduce request: {e}")))?;
    let results = run_map_reduce(&state, &request)?;
    debug!(phases = request.query.len(), results = results.len(), "map/reduce done");
    Ok(Json(results))
}

/// Run the leading map phase, then each reduce phase in order.
pub fn run_map_reduce(state: &AppState, request: &MapRedRequest) -> ServerResult<Vec<Value>> {
    let mut phases = request.query.iter();
    let Some(Phase::Map(map_spec)) = phases.next() else {
        return Err(MapReduceError::invalid("the first phase must be a map").into());
    };

    let inputs = QueryInputs::from_json(&request.inputs)?;
    let map = MapPhase::new(state.registry.resolve_map(map_spec)?, map_spec.arg.clone());
    let query = MapReduceQuery::from_inputs(&inputs, map)?;
    let mut values = MapReduceEngine::new(Arc::clone(&state.store)).run(&query)?;

    for phase in phases {
        let Phase::Reduce(spec) = phase else {
            return Err(MapReduceError::invalid("only one map phase is supported").into());
        };
        values = reduce_phase(&state.registry, spec)?.apply(values)?;
    }
    Ok(values)
}

// A `sort` reduce takes its comparator source as the phase argument.
fn reduce_phase(registry: &FunctionRegistry, spec: &PhaseSpec) -> ServerResult<ReducePhase> {
    let name = spec
        .name
        .as_deref()
        .ok_or_else(|| MapReduceError::invalid("reduce phase must name a built-in reduce"))?;
    let op: ReduceOp = name.parse()?;
    let phase = ReducePhase::new(op, spec.arg.clone());
    let comparator = match op {
        ReduceOp::Sort => spec.arg.as_str().and_then(|source| registry.comparator(source)),
        _ => None,
    };
    Ok(match comparator {
        Some(comparator) => phase.with_comparator(comparator),
        None => phase,
    })
}

/// Collect the index set carried by `x-riak-index-*` headers.
///
/// Header names arrive lower-cased, so an `_INT` suffix is seen as `_int`.
pub fn indexes_from_headers(headers: &HeaderMap) -> ServerResult<Indexes> {
    let mut indexes = Indexes::new();
    for (name, value) in headers {
        let Some(raw) = name.as_str().strip_prefix(INDEX_HEADER_PREFIX) else {
            continue;
        };
        let index = IndexName::new(raw);
        let text = value
            .to_str()
            .map_err(|e| ServerError::invalid(format!("header {name}: {e}")))?;
        indexes.insert(index.as_str(), index.parse_value(text)?);
    }
    Ok(indexes)
}
