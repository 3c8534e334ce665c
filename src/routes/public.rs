use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public API Router
///
/// Unauthenticated endpoints: the health probe, the auth gateway (register
/// and login, both proxied to the external auth service), and the published
/// learning catalogue.
///
/// Every catalogue read in this module must enforce `is_published=true` at
/// the repository level, so drafts and hidden content never reach anonymous
/// clients.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /api/health
        // Unauthenticated liveness probe for monitors and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/register
        // Account creation, proxied to the external auth service; mirrors
        // the resulting profile locally.
        .route("/register", post(handlers::register_user))
        // POST /api/login
        // Password grant against the auth service; returns the token payload.
        .route("/login", post(handlers::login_user))
        // GET /api/exercises?exam=...&skill=...&search=...
        // Published exercises with filtering and search.
        .route("/exercises", get(handlers::get_exercises))
        // GET /api/exercises/{id}
        // Published exercise detail. Hidden items 404.
        .route("/exercises/{id}", get(handlers::get_exercise_details))
        // GET /api/exercises/{id}/questions
        // Question set for a published exercise, in position order.
        .route(
            "/exercises/{id}/questions",
            get(handlers::get_exercise_questions),
        )
        // GET /api/paths?exam=...
        // Published learning paths.
        .route("/paths", get(handlers::get_learning_paths))
        // GET /api/paths/{id}
        // Published learning path detail.
        .route("/paths/{id}", get(handlers::get_learning_path_details))
}
