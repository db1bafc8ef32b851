use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    auth::Session,
    policy::{Role, RouteRule},
};

// --- Session & Navigation ---

/// SessionView
///
/// What the front-end is told about the caller. The backend bearer token is
/// deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionView {
    pub authenticated: bool,
    pub role: Option<Role>,
    pub user_id: Option<String>,
    pub name: Option<String>,
    #[ts(type = "string | null")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        match session.claim() {
            Some(claim) => Self {
                authenticated: true,
                role: Some(claim.role),
                user_id: claim.user_id.clone(),
                name: claim.name.clone(),
                expires_at: claim.expires_at,
            },
            None => Self {
                authenticated: false,
                role: None,
                user_id: None,
                name: None,
                expires_at: None,
            },
        }
    }
}

/// NavigationItem
///
/// One sidebar entry. `id` is the capability's menu id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigationItem {
    pub id: u8,
    pub label: String,
    pub route: String,
}

impl From<&RouteRule> for NavigationItem {
    fn from(rule: &RouteRule) -> Self {
        Self {
            id: rule.capability.id(),
            label: rule.label.to_string(),
            route: rule.path.to_string(),
        }
    }
}

// --- Page Descriptors ---
// The pages themselves are rendered by the front-end; these carry what it needs.

/// PageView
///
/// Dashboard page descriptor: the menu label of the route and the route itself.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageView {
    pub title: String,
    pub route: String,
}

/// PageLink
///
/// A labelled link rendered as a button on a page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageLink {
    pub label: String,
    pub href: String,
}

/// SignInView
///
/// Sign-in page descriptor. `callback_url` is where the caller goes once signed in.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SignInView {
    pub title: String,
    pub callback_url: String,
}

/// AccessDeniedView
///
/// Shown when the guard refuses a signed-in caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AccessDeniedView {
    pub title: String,
    pub message: String,
    pub links: Vec<PageLink>,
}

/// Query accepted by the sign-in page.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SignInQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}
