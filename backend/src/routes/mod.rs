/// Router Module Index
///
/// Groups the console's routes by who they are meant for. Access itself is
/// decided by the route guard layered over the merged router; these modules only
/// decide where a route is registered.

/// Health, session and navigation endpoints. Open to everyone.
pub mod public;

/// Sign-in, sign-out and access-denied pages.
pub mod account;

/// Dashboard pages, one per row of the route policy table.
pub mod dashboard;
