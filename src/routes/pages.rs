use crate::AppState;
use axum::{Router, response::Html, routing::get};

/// Page Router
///
/// The browser-facing surface: shell pages that the SPA frontend hydrates.
/// Which shell a visitor actually reaches is decided by the access router
/// middleware layered over this module in `create_router` — anonymous
/// visitors are bounced off the protected areas to /login, admins off the
/// student dashboard to /admin, and students off /admin to /dashboard.
///
/// The shells themselves carry no data and no authorization logic; they are
/// deliberately inert so the redirect policy is the only gate.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Landing page, open to everyone.
        .route("/", get(home_page))
        // GET /login
        // Sign-in form shell. Not a protected prefix, so anonymous visitors
        // land here rather than bouncing.
        .route("/login", get(login_page))
        // GET /dashboard and everything under it
        // The student area: exercises, learning paths, essay history.
        .route("/dashboard", get(dashboard_page))
        .route("/dashboard/{*rest}", get(dashboard_page))
        // GET /admin and everything under it
        // The admin console: content authoring, moderation, user management.
        .route("/admin", get(admin_page))
        .route("/admin/{*rest}", get(admin_page))
}

async fn home_page() -> Html<&'static str> {
    Html(
        "<!DOCTYPE html><html><head><title>Prep Portal</title></head>\
         <body><div id=\"root\" data-page=\"home\"></div></body></html>",
    )
}

async fn login_page() -> Html<&'static str> {
    Html(
        "<!DOCTYPE html><html><head><title>Sign in - Prep Portal</title></head>\
         <body><div id=\"root\" data-page=\"login\"></div></body></html>",
    )
}

async fn dashboard_page() -> Html<&'static str> {
    Html(
        "<!DOCTYPE html><html><head><title>Dashboard - Prep Portal</title></head>\
         <body><div id=\"root\" data-page=\"dashboard\"></div></body></html>",
    )
}

async fn admin_page() -> Html<&'static str> {
    Html(
        "<!DOCTYPE html><html><head><title>Admin - Prep Portal</title></head>\
         <body><div id=\"root\" data-page=\"admin\"></div></body></html>",
    )
}
