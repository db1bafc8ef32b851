use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints any client may call. Session-aware handlers here still answer for
/// anonymous callers; they just see an empty session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /api/session
        // Role, user id and expiry of the caller's session. Never the bearer token.
        .route("/api/session", get(handlers::get_session))
        // GET /api/navigation
        // Sidebar entries filtered by the caller's capabilities.
        .route("/api/navigation", get(handlers::get_navigation))
}
