use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Canonical identity record from the `public.profiles` table, mirrored from
/// the external auth service. The `role` column is the role-assignment store
/// consulted by both the access router and the admin API guards.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    // Primary key, shared with the external auth.users table.
    pub id: Uuid,
    pub email: String,
    // 'student' or 'admin'.
    pub role: String,
}

/// Exercise
///
/// One practice exercise from `public.exercises`: a listening/reading/
/// writing/speaking task for either exam, optionally carrying audio and a
/// cover image stored in the media bucket.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Exercise {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    // "ielts" | "toeic"
    pub exam: String,
    // "listening" | "reading" | "writing" | "speaking"
    pub skill: String,
    // 1 (starter) through 5 (exam-level).
    pub difficulty: i32,

    // Bucket keys for media assets.
    pub audio: Option<String>,
    pub cover_image: Option<String>,

    // Unpublished exercises are visible to admins only.
    pub is_published: bool,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Question
///
/// A single multiple-choice question belonging to an exercise, from
/// `public.questions`. Ordered within the exercise by `position`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Question {
    pub id: i64,
    pub exercise_id: Uuid,
    pub prompt: String,
    // Answer choices, in display order.
    pub options: Vec<String>,
    pub answer: String,
    pub position: i32,
}

/// LearningPath
///
/// An ordered study plan from `public.learning_paths`. The member exercises
/// are stored as an ordered UUID array rather than a join table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct LearningPath {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub exam: String,
    pub exercise_ids: Vec<Uuid>,
    pub is_published: bool,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// EssaySubmission
///
/// A writing-task submission from `public.essay_submissions`, stored together
/// with the verdict returned by the grading API.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct EssaySubmission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exam: String,
    pub task_prompt: String,
    pub essay_text: String,
    pub word_count: i32,
    // 0.0 to 9.0, IELTS band scale (TOEIC scores are mapped onto it).
    pub band_score: f64,
    pub feedback: String,
    // "graded" for now; kept as a column for a future async-grading queue.
    pub status: String,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input for POST /api/register. The password passes straight through to the
/// external auth service and is never persisted or logged here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
}

/// LoginRequest
///
/// Input for POST /api/login, forwarded to the auth service's password grant.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// CreateExerciseRequest
///
/// Admin input for creating an exercise. Media keys come out of the
/// presigned-upload flow.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateExerciseRequest {
    pub title: String,
    pub description: String,
    pub exam: String,
    pub skill: String,
    pub difficulty: i32,
    pub audio_key: Option<String>,
    pub cover_image_key: Option<String>,
}

/// UpdateExerciseRequest
///
/// Partial update for an exercise. `Option<T>` on every field plus
/// `skip_serializing_if` keeps the JSON payload down to the fields actually
/// being changed; the repository pairs this with COALESCE.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateExerciseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_key: Option<String>,
}

/// CreateQuestionRequest
///
/// Admin input for appending a question to an exercise.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateQuestionRequest {
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: String,
    pub position: i32,
}

/// CreateLearningPathRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateLearningPathRequest {
    pub title: String,
    pub description: String,
    pub exam: String,
    pub exercise_ids: Vec<Uuid>,
}

/// UpdateLearningPathRequest
///
/// Partial update for a learning path, same COALESCE pairing as exercises.
/// Replacing `exercise_ids` replaces the whole ordered list.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateLearningPathRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_ids: Option<Vec<Uuid>>,
}

/// PresignedUrlRequest
///
/// Input for requesting a short-lived upload URL for exercise media.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// Original filename, used to derive the extension.
    #[schema(example = "listening_part1.mp3")]
    pub filename: String,
    /// MIME type the generated URL is constrained to.
    #[schema(example = "audio/mpeg")]
    pub file_type: String,
}

/// PresignedUrlResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// Time-limited URL for the PUT request.
    pub upload_url: String,
    /// Object key to reference the file with afterwards.
    pub resource_key: String,
}

/// SubmitEssayRequest
///
/// Input for POST /api/essays: the writing task and the candidate's essay,
/// sent to the grading API before persistence.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SubmitEssayRequest {
    pub exam: String,
    pub task_prompt: String,
    pub essay_text: String,
}

/// UpdateRoleRequest
///
/// Admin input for PUT /api/admin/users/{id}/role.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// --- Dashboard & Profile Schemas (Output) ---

/// AdminDashboardStats
///
/// Counters for the admin dashboard (GET /api/admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_users: i64,
    pub total_exercises: i64,
    pub total_submissions: i64,
    /// Exercises where `is_published` is false.
    pub pending_exercises: i64,
}

/// UserProfile
///
/// Output for GET /api/me. A slightly richer view than the internal `User`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub avatar_url: Option<String>,
}
