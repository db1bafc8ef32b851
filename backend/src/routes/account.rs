use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Account Router Module
///
/// `/auth/signin` is sign-in only: the guard sends signed-in callers to the
/// dashboard before the handler runs.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signin", get(handlers::sign_in_page))
        .route("/auth/unauthorized", get(handlers::unauthorized_page))
        // POST /auth/signout
        // Expires the session cookie. Used after the backend answers 401.
        .route("/auth/signout", post(handlers::sign_out))
}
