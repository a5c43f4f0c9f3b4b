use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handler;
use crate::state::AppState;

/// Build the axum router with the Riak HTTP endpoints.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/buckets", get(handler::list_buckets))
        .route("/riak/:bucket", get(handler::list_keys))
        .route(
            "/riak/:bucket/:key",
            get(handler::get_object)
                .put(handler::put_object)
                .delete(handler::delete_object),
        )
        .route("/riak/:bucket/index/:index/:value", get(handler::index_equality))
        .route("/buckets/:bucket/index/:index/:value", get(handler::index_equality))
        .route("/riak/:bucket/index/:index/:from/:to", get(handler::index_range))
        .route("/buckets/:bucket/index/:index/:from/:to", get(handler::index_range))
        .route("/mapred", post(handler::map_reduce))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
