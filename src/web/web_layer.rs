// Web layer - the axum router and its handlers.
// Handlers only translate HTTP to core calls; all rules live in core.

#[path = "api_error.rs"]
pub mod error;

#[path = "routes/route_catalog.rs"]
pub mod routes;

#[path = "app_state.rs"]
pub mod state;

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;

pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

/// Request bodies above this are cut off before reaching a handler. It sits
/// above the photo limit so oversized photos still get a readable error.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/memories/:slug",
            get(routes::memories::list_memories).post(routes::memories::submit_memory),
        )
        .route("/api/pending/:slug", get(routes::moderation::list_pending))
        .route("/api/approve/:slug/:id", post(routes::moderation::approve))
        .route("/api/reject/:slug/:id", post(routes::moderation::reject))
        .route("/api/admin/:slug", post(routes::admin::provision_admin))
        .route("/api/photo/:key", get(routes::photos::get_photo))
        .route("/api/review/:slug", get(routes::review::review_page))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
        .with_state(state)
}
