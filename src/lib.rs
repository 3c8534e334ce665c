use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod access;
pub mod auth;
pub mod config;
pub mod grading;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;

// Routing segregation (Pages, Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, pages, public};

// --- Public Re-exports ---

// Core state types, accessible to the binary entry point and the tests.
pub use config::AppConfig;
pub use grading::{GenerativeGraderClient, GraderState, MockGrader};
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Aggregates every annotated handler and schema into the OpenAPI document
/// served at `/api-docs/openapi.json` and rendered by the Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::login_user, handlers::get_exercises,
        handlers::get_exercise_details, handlers::get_exercise_questions,
        handlers::get_learning_paths, handlers::get_learning_path_details,
        handlers::get_me, handlers::get_presigned_url, handlers::submit_essay,
        handlers::get_my_essays, handlers::get_essay_details,
        handlers::get_admin_stats, handlers::get_admin_exercises,
        handlers::create_exercise, handlers::update_exercise,
        handlers::delete_exercise, handlers::update_exercise_status,
        handlers::create_question, handlers::delete_question,
        handlers::create_learning_path, handlers::update_learning_path,
        handlers::delete_learning_path, handlers::list_users,
        handlers::update_user_role
    ),
    components(
        schemas(
            models::User, models::Exercise, models::Question, models::LearningPath,
            models::EssaySubmission, models::RegisterUserRequest, models::LoginRequest,
            models::CreateExerciseRequest, models::UpdateExerciseRequest,
            models::CreateQuestionRequest, models::CreateLearningPathRequest,
            models::UpdateLearningPathRequest, models::PresignedUrlRequest,
            models::PresignedUrlResponse, models::SubmitEssayRequest,
            models::UpdateRoleRequest, models::AdminDashboardStats, models::UserProfile,
        )
    ),
    tags(
        (name = "prep-portal", description = "IELTS/TOEIC Prep Portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single immutable container of shared services, cloned into every
/// request: persistence, object storage, the essay grader, and the loaded
/// configuration (which carries the page-access policy).
#[derive(Clone)]
pub struct AppState {
    /// Repository layer over the Postgres pool.
    pub repo: RepositoryState,
    /// Object storage for exercise media and presigned uploads.
    pub storage: StorageState,
    /// Essay-grading collaborator.
    pub grader: GraderState,
    /// Immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors pull individual services out of the shared state instead of
// depending on the whole AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for GraderState {
    fn from_ref(app_state: &AppState) -> GraderState {
        app_state.grader.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Gate for the authenticated API routes. The `AuthUser` extractor does the
/// work: a failed extraction rejects with 401 before the handler runs, a
/// successful one lets the request through.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the full routing tree:
/// - `/api/...` — the JSON API (public, authenticated, admin tiers). Exempt
///   from the access router; endpoint auth is the extractor plus in-handler
///   role checks.
/// - page routes — wrapped in the access router middleware, which owns the
///   anonymous/admin/student redirect policy.
/// - Swagger UI, request-id correlation, tracing, CORS.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // The JSON API tree, mounted under /api.
    let api_router = Router::new()
        // Public tier: no middleware.
        .merge(public::public_routes())
        // Authenticated tier: the AuthUser gate.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin tier: authentication via the extractor in each handler,
        // role checks in-handler.
        .nest("/admin", admin::admin_routes());

    let base_router = Router::new()
        // Generated API documentation.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_router)
        // Browser pages behind the access router's redirect policy.
        .merge(pages::page_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            access::access_router_middleware,
        )))
        .with_state(state);

    // Observability and correlation layers, outermost.
    base_router
        .layer(
            ServiceBuilder::new()
                // Unique UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // Request/response lifecycle spans carrying the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Echo the request id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: one span per request, tagged with method,
/// URI and the generated `x-request-id` so every log line of a request is
/// correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
