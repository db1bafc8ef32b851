use crate::{AppState, handlers, policy::RoutePolicy};
use axum::{Router, routing::get};

/// Dashboard Router Module
///
/// Registers one page per row of the route policy table, so a route cannot exist
/// without a policy entry. The guard has already applied the row's requirement by
/// the time `dashboard_page` runs.
pub fn dashboard_routes(policy: &RoutePolicy) -> Router<AppState> {
    policy
        .rules()
        .iter()
        .fold(Router::new(), |router, rule| {
            router.route(rule.path, get(handlers::dashboard_page))
        })
}
