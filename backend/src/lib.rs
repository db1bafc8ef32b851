use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod policy;

// Routers grouped by audience (public, account pages, dashboard pages).
pub mod routes;
use routes::{account, dashboard, public};

// --- Public Re-exports ---

pub use auth::{JwtSessionResolver, Session, SessionClaim, SessionResolver, SessionResolverState};
pub use config::AppConfig;
pub use guard::{Decision, evaluate};
pub use policy::{Capability, Role, RoutePolicy};

/// Shared, immutable route policy.
pub type PolicyState = Arc<RoutePolicy>;

/// ApiDoc
///
/// OpenAPI document for the console's own JSON endpoints, served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_session, handlers::get_navigation, handlers::sign_in_page,
        handlers::unauthorized_page, handlers::sign_out
    ),
    components(
        schemas(
            models::SessionView, models::NavigationItem, models::PageView, models::PageLink,
            models::SignInView, models::AccessDeniedView, policy::Role,
        )
    ),
    tags(
        (name = "stockzy-console", description = "StockZy admin console gateway")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a request may need, built once at startup and shared read-only.
#[derive(Clone)]
pub struct AppState {
    /// Loaded, immutable environment configuration.
    pub config: AppConfig,
    /// Seam to the credential issuer: turns cookies into identities.
    pub sessions: SessionResolverState,
    /// Route policy table consulted by the guard and the navigation endpoint.
    pub policy: PolicyState,
}

impl AppState {
    /// Default wiring: JWT session cookies checked against the configured secret,
    /// and the built-in route table.
    pub fn new(config: AppConfig) -> Self {
        let sessions = Arc::new(JwtSessionResolver::new(&config)) as SessionResolverState;
        Self {
            config,
            sessions,
            policy: Arc::new(RoutePolicy::default()),
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for SessionResolverState {
    fn from_ref(app_state: &AppState) -> SessionResolverState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for PolicyState {
    fn from_ref(app_state: &AppState) -> PolicyState {
        app_state.policy.clone()
    }
}

/// create_router
///
/// Assembles every route, puts the route guard in front of all of them (the
/// fallback included), and adds the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(account::account_routes())
        .merge(dashboard::dashboard_routes(&state.policy))
        .fallback(handlers::not_found)
        // The guard sees every request before any handler does.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::route_guard,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer` that carries the request id, so every log line of one
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
