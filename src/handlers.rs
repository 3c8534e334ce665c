use crate::{
    AppState,
    auth::AuthUser,
    models::{
        self, AdminDashboardStats, CreateExerciseRequest, CreateLearningPathRequest,
        CreateQuestionRequest, EssaySubmission, Exercise, LearningPath, LoginRequest,
        PresignedUrlRequest, PresignedUrlResponse, Question, RegisterUserRequest,
        SubmitEssayRequest, UpdateExerciseRequest, UpdateLearningPathRequest, UpdateRoleRequest,
        User, UserProfile,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// ExerciseFilter
///
/// Query parameters accepted by the public exercise listing
/// (GET /api/exercises). Bound via Axum's Query extractor.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ExerciseFilter {
    /// Optional exam filter: "ielts" or "toeic".
    pub exam: Option<String>,
    /// Optional skill filter: listening/reading/writing/speaking.
    pub skill: Option<String>,
    /// Optional search string matched against title and description.
    pub search: Option<String>,
}

/// PathFilter
///
/// Query parameters for the learning-path listing (GET /api/paths).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PathFilter {
    pub exam: Option<String>,
}

/// SupabaseAuthResponse
///
/// Minimal view of the auth service's signup response; only the new user's
/// UUID matters here.
#[derive(Deserialize)]
struct SupabaseAuthResponse {
    id: Uuid,
}

// --- Public Handlers ---

/// register_user
///
/// [Public Route] Creates an account with the external auth service, then
/// mirrors the profile into `public.profiles` under the same UUID so tokens
/// issued by the service resolve locally. New accounts are always students.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "Registered", body = User),
        (status = 400, description = "Rejected by auth service")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<User>, StatusCode> {
    let client = reqwest::Client::new();
    let signup_url = format!("{}/auth/v1/signup", state.config.auth_url);

    let response = client
        .post(signup_url)
        .header("apikey", &state.config.auth_key)
        .header("Content-Type", "application/json")
        .json(&serde_json::json!({ "email": payload.email, "password": payload.password }))
        .send()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !response.status().is_success() {
        // Duplicate email, weak password, etc. — the service's call.
        return Err(StatusCode::BAD_REQUEST);
    }

    let auth_user = response
        .json::<SupabaseAuthResponse>()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let created_user = state
        .repo
        .create_user(User {
            id: auth_user.id,
            email: payload.email,
            role: "student".to_string(),
        })
        .await;

    Ok(Json(created_user))
}

/// login_user
///
/// [Public Route] Exchanges credentials for a token via the auth service's
/// password grant and passes the token payload through untouched; the
/// frontend stores the access token in the `session` cookie.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token payload"),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let client = reqwest::Client::new();
    let token_url = format!(
        "{}/auth/v1/token?grant_type=password",
        state.config.auth_url
    );

    let response = client
        .post(token_url)
        .header("apikey", &state.config.auth_key)
        .header("Content-Type", "application/json")
        .json(&serde_json::json!({ "email": payload.email, "password": payload.password }))
        .send()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !response.status().is_success() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let token_payload = response
        .json::<serde_json::Value>()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(token_payload))
}

/// get_exercises
///
/// [Public Route] Lists published exercises with exam/skill/search filters.
/// The repository applies `is_published=true` unconditionally, so drafts
/// never leak to the catalogue.
#[utoipa::path(
    get,
    path = "/api/exercises",
    params(ExerciseFilter),
    responses((status = 200, description = "Published exercises", body = [Exercise]))
)]
pub async fn get_exercises(
    State(state): State<AppState>,
    Query(filter): Query<ExerciseFilter>,
) -> Json<Vec<models::Exercise>> {
    let exercises = state
        .repo
        .get_exercises(filter.exam, filter.skill, filter.search)
        .await;
    Json(exercises)
}

/// get_exercise_details
///
/// [Public Route] Single published exercise by ID. Hidden exercises return
/// 404, indistinguishable from missing ones.
#[utoipa::path(
    get,
    path = "/api/exercises/{id}",
    params(("id" = Uuid, Path, description = "Exercise ID")),
    responses((status = 200, description = "Found", body = Exercise))
)]
pub async fn get_exercise_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::Exercise>, StatusCode> {
    match state.repo.get_published_exercise(id).await {
        Some(exercise) => Ok(Json(exercise)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// get_exercise_questions
///
/// [Public Route] Questions for a published exercise, in position order.
/// The parent's publication state gates the whole set.
#[utoipa::path(
    get,
    path = "/api/exercises/{id}/questions",
    params(("id" = Uuid, Path, description = "Exercise ID")),
    responses((status = 200, description = "Questions", body = [Question]))
)]
pub async fn get_exercise_questions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<models::Question>>, StatusCode> {
    if state.repo.get_published_exercise(id).await.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(state.repo.get_questions(id).await))
}

/// get_learning_paths
///
/// [Public Route] Lists published learning paths, optionally per exam.
#[utoipa::path(
    get,
    path = "/api/paths",
    params(PathFilter),
    responses((status = 200, description = "Published paths", body = [LearningPath]))
)]
pub async fn get_learning_paths(
    State(state): State<AppState>,
    Query(filter): Query<PathFilter>,
) -> Json<Vec<models::LearningPath>> {
    Json(state.repo.get_published_paths(filter.exam).await)
}

/// get_learning_path_details
///
/// [Public Route] Single published learning path by ID.
#[utoipa::path(
    get,
    path = "/api/paths/{id}",
    params(("id" = Uuid, Path, description = "Learning path ID")),
    responses((status = 200, description = "Found", body = LearningPath))
)]
pub async fn get_learning_path_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::LearningPath>, StatusCode> {
    match state.repo.get_published_path(id).await {
        Some(path) => Ok(Json(path)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

// --- Authenticated Handlers ---

/// get_me
///
/// [Authenticated Route] The requesting user's profile, with a generated
/// avatar URL (DiceBear keyed on the UUID, so it is stable per user).
#[utoipa::path(
    get,
    path = "/api/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    AuthUser { id, role }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, StatusCode> {
    let user = state
        .repo
        .get_user(id)
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    Ok(Json(UserProfile {
        id,
        email: user.email,
        role,
        avatar_url: Some(format!(
            "https://api.dicebear.com/7.x/avataaars/svg?seed={}",
            id
        )),
    }))
}

/// get_presigned_url
///
/// [Authenticated Route] Generates a short-lived direct-to-bucket upload URL
/// for exercise media. The object key is a fresh UUID plus the original
/// extension, so uploads can never collide or overwrite each other.
#[utoipa::path(
    post,
    path = "/api/upload/presigned",
    request_body = PresignedUrlRequest,
    responses((status = 200, description = "URL", body = PresignedUrlResponse))
)]
pub async fn get_presigned_url(
    AuthUser { .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> impl IntoResponse {
    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin");
    let object_key = format!("uploads/{}.{}", Uuid::new_v4(), extension);

    match state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
    {
        Ok(url) => {
            let response = PresignedUrlResponse {
                upload_url: url,
                resource_key: object_key,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            // Log the storage error; the client gets a generic failure.
            tracing::error!("presigned url error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed").into_response()
        }
    }
}

/// submit_essay
///
/// [Authenticated Route] Sends the essay to the grading API and persists the
/// graded submission. Grader failure maps to 502 and persists nothing — the
/// student can simply resubmit.
#[utoipa::path(
    post,
    path = "/api/essays",
    request_body = SubmitEssayRequest,
    responses(
        (status = 200, description = "Graded", body = EssaySubmission),
        (status = 502, description = "Grading service unavailable")
    )
)]
pub async fn submit_essay(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitEssayRequest>,
) -> Result<Json<models::EssaySubmission>, StatusCode> {
    let assessment = match state
        .grader
        .grade(&payload.exam, &payload.task_prompt, &payload.essay_text)
        .await
    {
        Ok(assessment) => assessment,
        Err(e) => {
            tracing::error!("essay grading failed: {}", e);
            return Err(StatusCode::BAD_GATEWAY);
        }
    };

    let word_count = payload.essay_text.split_whitespace().count() as i32;

    let submission = state
        .repo
        .create_submission(EssaySubmission {
            id: Uuid::new_v4(),
            user_id,
            exam: payload.exam,
            task_prompt: payload.task_prompt,
            essay_text: payload.essay_text,
            word_count,
            band_score: assessment.band_score,
            feedback: assessment.feedback,
            status: "graded".to_string(),
            created_at: Utc::now(),
        })
        .await;

    Ok(Json(submission))
}

/// get_my_essays
///
/// [Authenticated Route] The requesting user's submission history, newest
/// first.
#[utoipa::path(
    get,
    path = "/api/me/essays",
    responses((status = 200, description = "My Submissions", body = [EssaySubmission]))
)]
pub async fn get_my_essays(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<models::EssaySubmission>> {
    Json(state.repo.get_my_submissions(id).await)
}

/// get_essay_details
///
/// [Authenticated Route] A single submission. Two access tiers: the owner,
/// or an admin reviewing any student's work.
#[utoipa::path(
    get,
    path = "/api/essays/{id}",
    params(("id" = Uuid, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Found", body = EssaySubmission),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn get_essay_details(
    AuthUser { id: user_id, role }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::EssaySubmission>, StatusCode> {
    let submission = state
        .repo
        .get_submission(id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    // 404 rather than 403 for someone else's essay: its existence is not
    // the requester's business.
    if submission.user_id != user_id && role != "admin" {
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(Json(submission))
}

// --- Admin Handlers ---

/// get_admin_stats
///
/// [Admin Route] Dashboard counters.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn get_admin_stats(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.repo.get_stats().await))
}

/// get_admin_exercises
///
/// [Admin Route] Every exercise including drafts, review queue first.
#[utoipa::path(
    get,
    path = "/api/admin/exercises",
    responses((status = 200, description = "All exercises", body = [Exercise]))
)]
pub async fn get_admin_exercises(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<models::Exercise>>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.repo.get_all_exercises().await))
}

/// create_exercise
///
/// [Admin Route] Creates a draft exercise; publication is a separate step.
#[utoipa::path(
    post,
    path = "/api/admin/exercises",
    request_body = CreateExerciseRequest,
    responses((status = 200, description = "Created", body = Exercise))
)]
pub async fn create_exercise(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<models::CreateExerciseRequest>,
) -> Result<Json<models::Exercise>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.repo.create_exercise(payload).await))
}

/// update_exercise
///
/// [Admin Route] Partial update of an exercise's content fields.
#[utoipa::path(
    put,
    path = "/api/admin/exercises/{id}",
    request_body = UpdateExerciseRequest,
    responses((status = 200, description = "Updated", body = Exercise))
)]
pub async fn update_exercise(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExerciseRequest>,
) -> Result<Json<models::Exercise>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    match state.repo.update_exercise(id, payload).await {
        Some(exercise) => Ok(Json(exercise)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// delete_exercise
///
/// [Admin Route] Removes an exercise and (via FK cascade) its questions.
#[utoipa::path(
    delete,
    path = "/api/admin/exercises/{id}",
    params(("id" = Uuid, Path, description = "Exercise ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_exercise(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if role != "admin" {
        return StatusCode::FORBIDDEN;
    }
    if state.repo.delete_exercise(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// update_exercise_status
///
/// [Admin Route] Publishes or hides an exercise — the moderation endpoint
/// feeding the public catalogue.
#[utoipa::path(
    put,
    path = "/api/admin/exercises/{id}/status",
    params(("id" = Uuid, Path, description = "Exercise ID")),
    request_body = bool,
    responses((status = 200, description = "Updated", body = Exercise))
)]
pub async fn update_exercise_status(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(is_published): Json<bool>,
) -> Result<Json<models::Exercise>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    match state.repo.set_exercise_published(id, is_published).await {
        Some(exercise) => Ok(Json(exercise)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// create_question
///
/// [Admin Route] Appends a question to an exercise. The parent must exist;
/// drafts are fine since question authoring precedes publication.
#[utoipa::path(
    post,
    path = "/api/admin/exercises/{id}/questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 200, description = "Created", body = Question),
        (status = 404, description = "No such exercise")
    )
)]
pub async fn create_question(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(exercise_id): Path<Uuid>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<Json<models::Question>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    if state.repo.get_exercise(exercise_id).await.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(state.repo.create_question(exercise_id, payload).await))
}

/// delete_question
///
/// [Admin Route] Removes a single question.
#[utoipa::path(
    delete,
    path = "/api/admin/questions/{id}",
    params(("id" = i64, Path, description = "Question ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_question(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> StatusCode {
    if role != "admin" {
        return StatusCode::FORBIDDEN;
    }
    if state.repo.delete_question(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// create_learning_path
///
/// [Admin Route] Creates a draft learning path.
#[utoipa::path(
    post,
    path = "/api/admin/paths",
    request_body = CreateLearningPathRequest,
    responses((status = 200, description = "Created", body = LearningPath))
)]
pub async fn create_learning_path(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateLearningPathRequest>,
) -> Result<Json<models::LearningPath>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.repo.create_path(payload).await))
}

/// update_learning_path
///
/// [Admin Route] Partial update; supplying `exercise_ids` replaces the whole
/// ordered list.
#[utoipa::path(
    put,
    path = "/api/admin/paths/{id}",
    request_body = UpdateLearningPathRequest,
    responses((status = 200, description = "Updated", body = LearningPath))
)]
pub async fn update_learning_path(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLearningPathRequest>,
) -> Result<Json<models::LearningPath>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    match state.repo.update_path(id, payload).await {
        Some(path) => Ok(Json(path)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// delete_learning_path
///
/// [Admin Route] Removes a learning path. Member exercises are untouched.
#[utoipa::path(
    delete,
    path = "/api/admin/paths/{id}",
    params(("id" = Uuid, Path, description = "Learning path ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_learning_path(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if role != "admin" {
        return StatusCode::FORBIDDEN;
    }
    if state.repo.delete_path(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// list_users
///
/// [Admin Route] Every profile, for the user-management table.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses((status = 200, description = "Users", body = [User]))
)]
pub async fn list_users(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<models::User>>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(state.repo.list_users().await))
}

/// update_user_role
///
/// [Admin Route] Grants or revokes the admin role. Takes effect on the
/// user's next request — the access router re-reads the role every time.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses((status = 200, description = "Updated", body = User))
)]
pub async fn update_user_role(
    AuthUser { role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<models::User>, StatusCode> {
    if role != "admin" {
        return Err(StatusCode::FORBIDDEN);
    }
    match state.repo.set_user_role(id, payload.role).await {
        Some(user) => Ok(Json(user)),
        None => Err(StatusCode::NOT_FOUND),
    }
}
