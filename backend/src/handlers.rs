use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderValue, Uri, header},
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    PolicyState,
    auth::Session,
    config::{AppConfig, Env},
    error::{ApiError, ApiResult},
    guard::{DASHBOARD_PATH, SIGN_IN_PATH},
    models::{
        AccessDeniedView, NavigationItem, PageLink, PageView, SessionView, SignInQuery, SignInView,
    },
    policy::Role,
};
use url::Url;

// --- Session & Navigation ---

/// get_session
///
/// [Public Route] Describes the caller's session. Anonymous callers get
/// `authenticated: false` rather than an error.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Current session", body = SessionView))
)]
pub async fn get_session(session: Session) -> Json<SessionView> {
    Json(SessionView::from(&session))
}

/// get_navigation
///
/// [Public Route] Sidebar entries the caller's role may see, in menu order.
/// Anonymous callers and unrecognized roles get an empty list.
#[utoipa::path(
    get,
    path = "/api/navigation",
    responses((status = 200, description = "Visible menu entries", body = [NavigationItem]))
)]
pub async fn get_navigation(
    session: Session,
    State(policy): State<PolicyState>,
) -> Json<Vec<NavigationItem>> {
    let role = session
        .claim()
        .map(|claim| claim.role)
        .unwrap_or(Role::Unrecognized);

    let items = policy
        .navigation_for(role)
        .into_iter()
        .map(NavigationItem::from)
        .collect();

    Json(items)
}

// --- Account Pages ---

/// sign_in_page
///
/// [Public Route] Sign-in page descriptor. The callback is resolved against the
/// console's public URL and kept only when it stays on that origin; anything else
/// falls back to the dashboard.
#[utoipa::path(
    get,
    path = "/auth/signin",
    params(SignInQuery),
    responses((status = 200, description = "Sign-in page", body = SignInView))
)]
pub async fn sign_in_page(
    State(config): State<AppConfig>,
    Query(query): Query<SignInQuery>,
) -> Json<SignInView> {
    Json(SignInView {
        title: "Sign In".to_string(),
        callback_url: same_origin_callback(&config.public_url, query.callback_url.as_deref()),
    })
}

/// Joins `callback` onto `base` the way a browser would (`\` as `/`, tabs and
/// newlines dropped) and returns its path and query if the origin is unchanged.
fn same_origin_callback(base: &Url, callback: Option<&str>) -> String {
    callback
        .and_then(|raw| base.join(raw).ok())
        .filter(|target| target.origin() == base.origin())
        .map(|target| match target.query() {
            Some(query) => format!("{}?{}", target.path(), query),
            None => target.path().to_string(),
        })
        .unwrap_or_else(|| DASHBOARD_PATH.to_string())
}

/// unauthorized_page
///
/// [Public Route] Where the guard sends signed-in callers lacking a capability.
#[utoipa::path(
    get,
    path = "/auth/unauthorized",
    responses((status = 200, description = "Access denied page", body = AccessDeniedView))
)]
pub async fn unauthorized_page() -> Json<AccessDeniedView> {
    Json(AccessDeniedView {
        title: "Access Denied".to_string(),
        message: "You don't have permission to access this page. Please contact your \
                  administrator if you believe this is an error."
            .to_string(),
        links: vec![
            PageLink {
                label: "Go to Dashboard".to_string(),
                href: DASHBOARD_PATH.to_string(),
            },
            PageLink {
                label: "Sign In Again".to_string(),
                href: SIGN_IN_PATH.to_string(),
            },
        ],
    })
}

/// sign_out
///
/// [Public Route] Expires the session cookie and sends the caller to sign-in.
/// The front-end calls this when the backend rejects the bearer token with 401.
#[utoipa::path(
    post,
    path = "/auth/signout",
    responses((status = 303, description = "Session cleared, redirect to sign-in"))
)]
pub async fn sign_out(State(config): State<AppConfig>) -> ApiResult<Response> {
    let mut cookie = format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
        config.session_cookie_name()
    );
    if config.env == Env::Production {
        cookie.push_str("; Secure");
    }

    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::Internal(format!("invalid session cookie header: {e}")))?;

    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(SIGN_IN_PATH)).into_response())
}

// --- Dashboard Pages ---

/// dashboard_page
///
/// [Protected Route] Page descriptor for any route in the policy table. Access was
/// already decided by the guard.
pub async fn dashboard_page(
    uri: Uri,
    State(policy): State<PolicyState>,
) -> ApiResult<Json<PageView>> {
    let rule = policy
        .rules()
        .iter()
        .find(|rule| rule.path == uri.path())
        .ok_or_else(|| ApiError::NotFound(uri.path().to_string()))?;

    Ok(Json(PageView {
        title: rule.label.to_string(),
        route: rule.path.to_string(),
    }))
}

/// Fallback for paths no router claims.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
