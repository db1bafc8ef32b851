//! Route policy
//!
//! One static table describes every dashboard route: its navigation label, the
//! capability it belongs to, and whether the route guard enforces that capability
//! on deep links. The sidebar menu and the guard's admin-only list are both derived
//! from this table, so they cannot drift apart.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Prefix under which every dashboard page lives.
const DASHBOARD_ROOT: &str = "/dashboard";

/// Pages an authenticated user is bounced away from.
const AUTH_ONLY_PATHS: &[&str] = &["/auth/signin"];

/// Role
///
/// The role claim carried inside the backend's access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    SalesAdmin,
    SalesEmployee,
    OnboardingTeam,
    /// Missing role, or a value this console does not know about.
    Unrecognized,
}

impl Role {
    /// Parses the raw claim. Matching is exact; anything else is `Unrecognized`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("ADMIN") => Role::Admin,
            Some("SALESADMIN") => Role::SalesAdmin,
            Some("SALESEMPLOYEE") => Role::SalesEmployee,
            Some("ONBOARDINGTEAM") => Role::OnboardingTeam,
            _ => Role::Unrecognized,
        }
    }

    /// Capabilities granted to this role. Unrecognized roles get none.
    pub fn capabilities(self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Admin => &[Dashboard, RevenueAnalytics, SendInvoice, UserManagement],
            Role::SalesAdmin => &[Dashboard, RevenueAnalytics, UserManagement],
            Role::SalesEmployee => &[Dashboard, RevenueAnalytics],
            Role::OnboardingTeam => &[Dashboard, SendInvoice],
            Role::Unrecognized => &[],
        }
    }

    pub fn has(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Capability
///
/// One navigation entry / route family. The discriminants are the menu ids the
/// front-end uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Capability {
    Dashboard = 1,
    RevenueAnalytics = 2,
    SendInvoice = 3,
    UserManagement = 4,
}

impl Capability {
    pub fn id(self) -> u8 {
        self as u8
    }
}

/// RouteRule
///
/// A single row of the route policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRule {
    pub path: &'static str,
    pub label: &'static str,
    pub capability: Capability,
    /// When set, the guard refuses signed-in callers lacking `capability`.
    /// Otherwise the capability only decides menu visibility.
    pub enforced: bool,
}

/// The dashboard's route policy. Order is menu order.
pub const ROUTE_TABLE: &[RouteRule] = &[
    RouteRule {
        path: "/dashboard",
        label: "Dashboard",
        capability: Capability::Dashboard,
        enforced: false,
    },
    RouteRule {
        path: "/dashboard/payments",
        label: "Revenue Analytics",
        capability: Capability::RevenueAnalytics,
        enforced: false,
    },
    RouteRule {
        path: "/dashboard/send-invoice",
        label: "Send Invoice",
        capability: Capability::SendInvoice,
        enforced: false,
    },
    RouteRule {
        path: "/dashboard/users",
        label: "User Management",
        capability: Capability::UserManagement,
        enforced: true,
    },
];

/// RouteClass
///
/// What a path demands from the caller before the guard lets it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
    AdminOnly,
}

/// RoutePolicy
///
/// Immutable view over a route table. Built once at startup and shared by the
/// guard and the navigation endpoint.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    rules: &'static [RouteRule],
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::new(ROUTE_TABLE)
    }
}

impl RoutePolicy {
    pub fn new(rules: &'static [RouteRule]) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'static [RouteRule] {
        self.rules
    }

    /// True for every table row and for `/dashboard` or anything below it.
    /// This is a prefix test, not a router: `/dashboardx` is public.
    pub fn is_protected(&self, path: &str) -> bool {
        if self.rules.iter().any(|rule| rule.path == path) {
            return true;
        }

        match path.strip_prefix(DASHBOARD_ROOT) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// The enforced rule matching `path` exactly, if any.
    pub fn admin_rule(&self, path: &str) -> Option<&'static RouteRule> {
        self.rules
            .iter()
            .find(|rule| rule.enforced && rule.path == path)
    }

    pub fn is_admin_only(&self, path: &str) -> bool {
        self.admin_rule(path).is_some()
    }

    pub fn is_auth_only(&self, path: &str) -> bool {
        AUTH_ONLY_PATHS.contains(&path)
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        if self.is_admin_only(path) {
            RouteClass::AdminOnly
        } else if self.is_protected(path) {
            RouteClass::Protected
        } else {
            RouteClass::Public
        }
    }

    /// Menu entries visible to `role`, in table order.
    pub fn navigation_for(&self, role: Role) -> Vec<&'static RouteRule> {
        self.rules
            .iter()
            .filter(|rule| role.has(rule.capability))
            .collect()
    }
}
