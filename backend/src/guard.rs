//! Route guard
//!
//! Runs in front of every route. Resolves the caller's session, checks the target
//! path against the route policy, and either lets the request through or answers
//! with a redirect.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use url::form_urlencoded;

use crate::{
    PolicyState,
    auth::{Session, SessionResolverState},
    policy::RoutePolicy,
};

pub const DASHBOARD_PATH: &str = "/dashboard";
pub const SIGN_IN_PATH: &str = "/auth/signin";
pub const UNAUTHORIZED_PATH: &str = "/auth/unauthorized";

/// Decision
///
/// What the guard does with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Signed-in caller hit a page meant for signed-out users.
    RedirectToDashboard,
    /// Anonymous caller hit a protected page. `callback` is where to send them
    /// after they sign in.
    RedirectToSignIn { callback: String },
    /// Signed-in caller lacks the capability an enforced route requires.
    RedirectToUnauthorized,
}

impl Decision {
    /// Relative redirect target, or `None` for `Allow`.
    pub fn location(&self) -> Option<String> {
        match self {
            Decision::Allow => None,
            Decision::RedirectToDashboard => Some(DASHBOARD_PATH.to_string()),
            Decision::RedirectToSignIn { callback } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair("callbackUrl", callback)
                    .finish();
                Some(format!("{SIGN_IN_PATH}?{query}"))
            }
            Decision::RedirectToUnauthorized => Some(UNAUTHORIZED_PATH.to_string()),
        }
    }
}

/// evaluate
///
/// Pure decision function. Rules, first match wins:
/// 1. signed in and the path is sign-in only: go to the dashboard
/// 2. anonymous and the path is protected: go to sign-in, remembering the path
/// 3. signed in, the path is enforced, and the role lacks its capability: unauthorized
/// 4. otherwise allow
pub fn evaluate(path: &str, session: &Session, policy: &RoutePolicy) -> Decision {
    match session {
        Session::Authenticated(_) if policy.is_auth_only(path) => Decision::RedirectToDashboard,
        Session::Anonymous if policy.is_protected(path) => Decision::RedirectToSignIn {
            callback: path.to_string(),
        },
        Session::Authenticated(claim) => match policy.admin_rule(path) {
            Some(rule) if !claim.role.has(rule.capability) => Decision::RedirectToUnauthorized,
            _ => Decision::Allow,
        },
        Session::Anonymous => Decision::Allow,
    }
}

/// route_guard
///
/// Middleware wrapping the whole router. Session failures never surface as errors:
/// the resolver's error is logged and the caller is treated as signed out. On
/// `Allow` the resolved session is stored in the request extensions for the
/// `Session` extractor.
pub async fn route_guard(
    State(sessions): State<SessionResolverState>,
    State(policy): State<PolicyState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let session = Session::from_resolution(sessions.resolve(request.headers()).await);
    let decision = evaluate(&path, &session, &policy);

    match decision.location() {
        Some(location) => {
            tracing::debug!(
                path = %path,
                authenticated = session.is_authenticated(),
                ?decision,
                "Route guard redirect"
            );
            Redirect::temporary(&location).into_response()
        }
        None => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
    }
}
