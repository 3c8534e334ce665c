use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Admin API Router
///
/// Content management and oversight: exercise/question authoring, learning
/// path curation, user role management, dashboard stats.
///
/// Access Control:
/// The surrounding layer authenticates the request; every handler here then
/// checks `role == "admin"` explicitly before touching the repository, so
/// the guard is visible at the point of use.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/admin/stats
        // Dashboard counters (users, exercises, submissions, review queue).
        .route("/stats", get(handlers::get_admin_stats))
        // --- Exercise Authoring ---
        // GET /api/admin/exercises
        // Every exercise including unpublished drafts, review queue first.
        .route(
            "/exercises",
            get(handlers::get_admin_exercises).post(handlers::create_exercise),
        )
        // PUT/DELETE /api/admin/exercises/{id}
        // Content edits and removal.
        .route(
            "/exercises/{id}",
            put(handlers::update_exercise).delete(handlers::delete_exercise),
        )
        // PUT /api/admin/exercises/{id}/status
        // Publish or hide — the moderation switch for the public catalogue.
        .route(
            "/exercises/{id}/status",
            put(handlers::update_exercise_status),
        )
        // POST /api/admin/exercises/{id}/questions
        // Appends a question to an exercise.
        .route(
            "/exercises/{id}/questions",
            post(handlers::create_question),
        )
        // DELETE /api/admin/questions/{id}
        .route("/questions/{id}", delete(handlers::delete_question))
        // --- Learning Path Curation ---
        .route("/paths", post(handlers::create_learning_path))
        .route(
            "/paths/{id}",
            put(handlers::update_learning_path).delete(handlers::delete_learning_path),
        )
        // --- User Management ---
        // GET /api/admin/users
        .route("/users", get(handlers::list_users))
        // PUT /api/admin/users/{id}/role
        // Grants or revokes admin; picked up by the access router on the
        // user's next request.
        .route("/users/{id}/role", put(handlers::update_user_role))
}
