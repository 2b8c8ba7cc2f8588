//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    extract::{MatchedPath, Request},
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        // Collections
        .route("/collections", post(handlers::create_collection))
        .route(
            "/collections/:id",
            get(handlers::get_collection)
                .put(handlers::update_collection)
                .delete(handlers::delete_collection),
        )
        // Share tokens
        .route(
            "/collections/:id/share-tokens",
            post(handlers::mint_share_token),
        )
        .route("/share-tokens/:token", delete(handlers::revoke_share_token))
        .route("/shared/:token", get(handlers::get_shared_collection));

    // Spans carry the route template, never the raw path, so share tokens
    // stay out of the logs.
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str)
            .unwrap_or("unmatched");
        tracing::info_span!("http_request", method = %request.method(), route)
    });

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(trace)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
