//! Route tables, split by the access level the authorization policy assigns
//! to their paths.

/// Liveness and `/api/auth/**`. Open to anonymous callers.
pub mod public;

/// Stand, calendar, button-link, hero-image and popup reads. Requires any
/// authenticated principal.
pub mod authenticated;

/// `/api/admin/**`. Requires the ADMIN role.
pub mod admin;
