/// Router Module Index
///
/// Splits the routing surface into access-segregated modules so control is
/// applied at the module level rather than per-handler ad hoc.
///
/// The API modules map to the three access tiers; the pages module is the
/// browser-facing surface governed by the access router middleware.

/// API routes open to any client (anonymous, read-only catalogue plus the
/// registration/login gateway).
pub mod public;

/// API routes behind the `AuthUser` extractor middleware.
pub mod authenticated;

/// API routes restricted to the 'admin' role, checked in-handler.
pub mod admin;

/// HTML page shells for the browser: /, /login, /dashboard, /admin. The
/// access router middleware decides who lands where.
pub mod pages;
