use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated API Router
///
/// Routes for any signed-in user (the 'student' tier): profile, media
/// upload, and the essay-grading flow.
///
/// Access Control Strategy:
/// The router layer above this module applies the `AuthUser` extractor
/// middleware, so every handler here receives a validated identity; handlers
/// then apply their own ownership checks where rows belong to a user.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/me
        // The authenticated user's profile.
        .route("/me", get(handlers::get_me))
        // POST /api/upload/presigned
        // Short-lived direct-to-bucket upload URL for exercise media; the
        // upload itself bypasses the application server entirely.
        .route("/upload/presigned", post(handlers::get_presigned_url))
        // --- Essay Grading ---
        // POST /api/essays
        // Submits a writing task for AI grading; the graded submission is
        // persisted and returned in one round trip.
        .route("/essays", post(handlers::submit_essay))
        // GET /api/me/essays
        // The user's submission history, newest first.
        .route("/me/essays", get(handlers::get_my_essays))
        // GET /api/essays/{id}
        // Single submission: owner or admin only.
        .route("/essays/{id}", get(handlers::get_essay_details))
}
