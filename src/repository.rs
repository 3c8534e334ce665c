use crate::models::{
    AdminDashboardStats, CreateExerciseRequest, CreateLearningPathRequest, CreateQuestionRequest,
    EssaySubmission, Exercise, LearningPath, Question, UpdateExerciseRequest,
    UpdateLearningPathRequest, User,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Abstract contract for all persistence operations, so handlers talk to the
/// data layer without knowing the concrete implementation (Postgres in
/// production, mocks in tests).
///
/// Reads degrade to empty/None on a database error, logged at the call site.
/// The one deliberate exception is `get_user_role`: it keeps the error in the
/// signature because the access router's fail-open rule needs to observe a
/// failed lookup as distinct from a missing role.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Exercises ---
    // Public listing with filtering. Must enforce is_published=true.
    async fn get_exercises(
        &self,
        exam: Option<String>,
        skill: Option<String>,
        search: Option<String>,
    ) -> Vec<Exercise>;
    // Admin access: every exercise regardless of publication state.
    async fn get_all_exercises(&self) -> Vec<Exercise>;
    async fn get_exercise(&self, id: Uuid) -> Option<Exercise>;
    // Retrieval gated on is_published=true, for the public detail view.
    async fn get_published_exercise(&self, id: Uuid) -> Option<Exercise>;
    async fn create_exercise(&self, req: CreateExerciseRequest) -> Exercise;
    // Partial update via COALESCE; only Some fields change.
    async fn update_exercise(&self, id: Uuid, req: UpdateExerciseRequest) -> Option<Exercise>;
    async fn delete_exercise(&self, id: Uuid) -> bool;
    // Admin action: publish or hide an exercise.
    async fn set_exercise_published(&self, id: Uuid, is_published: bool) -> Option<Exercise>;

    // --- Questions ---
    async fn get_questions(&self, exercise_id: Uuid) -> Vec<Question>;
    async fn create_question(&self, exercise_id: Uuid, req: CreateQuestionRequest) -> Question;
    async fn delete_question(&self, id: i64) -> bool;

    // --- Learning Paths ---
    async fn get_published_paths(&self, exam: Option<String>) -> Vec<LearningPath>;
    async fn get_path(&self, id: Uuid) -> Option<LearningPath>;
    async fn get_published_path(&self, id: Uuid) -> Option<LearningPath>;
    async fn create_path(&self, req: CreateLearningPathRequest) -> LearningPath;
    async fn update_path(&self, id: Uuid, req: UpdateLearningPathRequest) -> Option<LearningPath>;
    async fn delete_path(&self, id: Uuid) -> bool;

    // --- Users / Auth ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    /// Role lookup for the access router. Error-transparent by contract.
    async fn get_user_role(&self, id: Uuid) -> Result<Option<String>, String>;
    async fn create_user(&self, user: User) -> User;
    async fn list_users(&self) -> Vec<User>;
    async fn set_user_role(&self, id: Uuid, role: String) -> Option<User>;

    // --- Essay Submissions ---
    async fn create_submission(&self, submission: EssaySubmission) -> EssaySubmission;
    async fn get_my_submissions(&self, user_id: Uuid) -> Vec<EssaySubmission>;
    async fn get_submission(&self, id: Uuid) -> Option<EssaySubmission>;

    // --- Dashboard ---
    async fn get_stats(&self) -> AdminDashboardStats;
}

/// RepositoryState
///
/// The shared handle to the persistence layer used across the app state.
pub type RepositoryState = Arc<dyn Repository>;

const EXERCISE_COLUMNS: &str = "id, title, description, exam, skill, difficulty, audio, \
     cover_image, is_published, created_at, updated_at";

const PATH_COLUMNS: &str =
    "id, title, description, exam, exercise_ids, is_published, created_at, updated_at";

const SUBMISSION_COLUMNS: &str = "id, user_id, exam, task_prompt, essay_text, word_count, \
     band_score, feedback, status, created_at";

/// PostgresRepository
///
/// Concrete `Repository` backed by PostgreSQL. Queries use the runtime-bound
/// sqlx API so the crate builds without a reachable database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// get_exercises
    ///
    /// Filtered public listing built with QueryBuilder, so every filter value
    /// is bound rather than interpolated. Strictly enforces
    /// `WHERE is_published = true` in the base query.
    async fn get_exercises(
        &self,
        exam: Option<String>,
        skill: Option<String>,
        search: Option<String>,
    ) -> Vec<Exercise> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises WHERE is_published = true "
        ));

        if let Some(e) = exam {
            builder.push(" AND exam = ");
            builder.push_bind(e);
        }

        if let Some(s) = skill {
            builder.push(" AND skill = ");
            builder.push_bind(s);
        }

        if let Some(s) = search {
            // Case-insensitive match across title and description.
            let pattern = format!("%{}%", s);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC");

        match builder.build_query_as::<Exercise>().fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("get_exercises error: {:?}", e);
                vec![]
            }
        }
    }

    /// get_all_exercises
    ///
    /// Administrative listing; no `is_published` restriction, unpublished
    /// items sort first to surface the review queue.
    async fn get_all_exercises(&self) -> Vec<Exercise> {
        let sql = format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises ORDER BY is_published ASC, created_at DESC"
        );
        match sqlx::query_as::<_, Exercise>(&sql).fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("get_all_exercises error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_exercise(&self, id: Uuid) -> Option<Exercise> {
        let sql = format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = $1");
        sqlx::query_as::<_, Exercise>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_exercise error: {:?}", e);
                None
            })
    }

    /// get_published_exercise
    ///
    /// Detail retrieval for the public catalogue; hidden exercises are
    /// indistinguishable from missing ones.
    async fn get_published_exercise(&self, id: Uuid) -> Option<Exercise> {
        let sql =
            format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = $1 AND is_published = true");
        sqlx::query_as::<_, Exercise>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_published_exercise error: {:?}", e);
                None
            })
    }

    /// create_exercise
    ///
    /// New exercises start unpublished and enter the admin review queue.
    async fn create_exercise(&self, req: CreateExerciseRequest) -> Exercise {
        let sql = format!(
            "INSERT INTO exercises (id, title, description, exam, skill, difficulty, audio, \
             cover_image, is_published, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, false, NOW(), NOW()) \
             RETURNING {EXERCISE_COLUMNS}"
        );
        sqlx::query_as::<_, Exercise>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.title)
            .bind(req.description)
            .bind(req.exam)
            .bind(req.skill)
            .bind(req.difficulty)
            .bind(req.audio_key)
            .bind(req.cover_image_key)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to insert exercise")
    }

    /// update_exercise
    ///
    /// COALESCE keeps unset fields at their current value, pairing with the
    /// all-Option update payload.
    async fn update_exercise(&self, id: Uuid, req: UpdateExerciseRequest) -> Option<Exercise> {
        let sql = format!(
            "UPDATE exercises \
             SET title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 difficulty = COALESCE($4, difficulty), \
                 audio = COALESCE($5, audio), \
                 cover_image = COALESCE($6, cover_image), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {EXERCISE_COLUMNS}"
        );
        sqlx::query_as::<_, Exercise>(&sql)
            .bind(id)
            .bind(req.title)
            .bind(req.description)
            .bind(req.difficulty)
            .bind(req.audio_key)
            .bind(req.cover_image_key)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("update_exercise error: {:?}", e);
                None
            })
    }

    async fn delete_exercise(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_exercise error: {:?}", e);
                false
            }
        }
    }

    /// set_exercise_published
    ///
    /// The moderation switch behind PUT /api/admin/exercises/{id}/status.
    async fn set_exercise_published(&self, id: Uuid, is_published: bool) -> Option<Exercise> {
        let sql = format!(
            "UPDATE exercises SET is_published = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {EXERCISE_COLUMNS}"
        );
        sqlx::query_as::<_, Exercise>(&sql)
            .bind(id)
            .bind(is_published)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("set_exercise_published error: {:?}", e);
                None
            })
    }

    // --- QUESTIONS ---

    async fn get_questions(&self, exercise_id: Uuid) -> Vec<Question> {
        sqlx::query_as::<_, Question>(
            "SELECT id, exercise_id, prompt, options, answer, position \
             FROM questions WHERE exercise_id = $1 ORDER BY position ASC",
        )
        .bind(exercise_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_questions error: {:?}", e);
            vec![]
        })
    }

    async fn create_question(&self, exercise_id: Uuid, req: CreateQuestionRequest) -> Question {
        sqlx::query_as::<_, Question>(
            "INSERT INTO questions (exercise_id, prompt, options, answer, position) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, exercise_id, prompt, options, answer, position",
        )
        .bind(exercise_id)
        .bind(req.prompt)
        .bind(req.options)
        .bind(req.answer)
        .bind(req.position)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to insert question")
    }

    async fn delete_question(&self, id: i64) -> bool {
        match sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_question error: {:?}", e);
                false
            }
        }
    }

    // --- LEARNING PATHS ---

    async fn get_published_paths(&self, exam: Option<String>) -> Vec<LearningPath> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {PATH_COLUMNS} FROM learning_paths WHERE is_published = true "
        ));

        if let Some(e) = exam {
            builder.push(" AND exam = ");
            builder.push_bind(e);
        }

        builder.push(" ORDER BY created_at DESC");

        match builder
            .build_query_as::<LearningPath>()
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("get_published_paths error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_path(&self, id: Uuid) -> Option<LearningPath> {
        let sql = format!("SELECT {PATH_COLUMNS} FROM learning_paths WHERE id = $1");
        sqlx::query_as::<_, LearningPath>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_path error: {:?}", e);
                None
            })
    }

    async fn get_published_path(&self, id: Uuid) -> Option<LearningPath> {
        let sql = format!(
            "SELECT {PATH_COLUMNS} FROM learning_paths WHERE id = $1 AND is_published = true"
        );
        sqlx::query_as::<_, LearningPath>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_published_path error: {:?}", e);
                None
            })
    }

    /// create_path
    ///
    /// Paths also start unpublished, mirroring the exercise review flow.
    async fn create_path(&self, req: CreateLearningPathRequest) -> LearningPath {
        let sql = format!(
            "INSERT INTO learning_paths (id, title, description, exam, exercise_ids, \
             is_published, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, false, NOW(), NOW()) \
             RETURNING {PATH_COLUMNS}"
        );
        sqlx::query_as::<_, LearningPath>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.title)
            .bind(req.description)
            .bind(req.exam)
            .bind(req.exercise_ids)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to insert learning path")
    }

    async fn update_path(&self, id: Uuid, req: UpdateLearningPathRequest) -> Option<LearningPath> {
        let sql = format!(
            "UPDATE learning_paths \
             SET title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 exercise_ids = COALESCE($4, exercise_ids), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PATH_COLUMNS}"
        );
        sqlx::query_as::<_, LearningPath>(&sql)
            .bind(id)
            .bind(req.title)
            .bind(req.description)
            .bind(req.exercise_ids)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("update_path error: {:?}", e);
                None
            })
    }

    async fn delete_path(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM learning_paths WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_path error: {:?}", e);
                false
            }
        }
    }

    // --- USERS / AUTH ---

    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT id, email, role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or(None)
    }

    /// get_user_role
    ///
    /// The access router's role lookup. Propagates database errors instead of
    /// degrading, so the caller can apply its fail-open handling and log the
    /// failure itself.
    async fn get_user_role(&self, id: Uuid) -> Result<Option<String>, String> {
        sqlx::query_scalar::<_, String>("SELECT role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.to_string())
    }

    /// create_user
    ///
    /// Mirrors the profile row after the external auth service accepts the
    /// signup. New accounts are always students; roles are granted later by
    /// an admin.
    async fn create_user(&self, user: User) -> User {
        sqlx::query_as::<_, User>(
            "INSERT INTO profiles (id, email, role) VALUES ($1, $2, $3) RETURNING id, email, role",
        )
        .bind(user.id)
        .bind(user.email)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create user")
    }

    async fn list_users(&self) -> Vec<User> {
        sqlx::query_as::<_, User>("SELECT id, email, role FROM profiles ORDER BY email ASC")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_users error: {:?}", e);
                vec![]
            })
    }

    async fn set_user_role(&self, id: Uuid, role: String) -> Option<User> {
        sqlx::query_as::<_, User>(
            "UPDATE profiles SET role = $2 WHERE id = $1 RETURNING id, email, role",
        )
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_user_role error: {:?}", e);
            None
        })
    }

    // --- ESSAY SUBMISSIONS ---

    async fn create_submission(&self, submission: EssaySubmission) -> EssaySubmission {
        let sql = format!(
            "INSERT INTO essay_submissions (id, user_id, exam, task_prompt, essay_text, \
             word_count, band_score, feedback, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) \
             RETURNING {SUBMISSION_COLUMNS}"
        );
        sqlx::query_as::<_, EssaySubmission>(&sql)
            .bind(submission.id)
            .bind(submission.user_id)
            .bind(submission.exam)
            .bind(submission.task_prompt)
            .bind(submission.essay_text)
            .bind(submission.word_count)
            .bind(submission.band_score)
            .bind(submission.feedback)
            .bind(submission.status)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to insert essay submission")
    }

    async fn get_my_submissions(&self, user_id: Uuid) -> Vec<EssaySubmission> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM essay_submissions \
             WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, EssaySubmission>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_my_submissions error: {:?}", e);
                vec![]
            })
    }

    async fn get_submission(&self, id: Uuid) -> Option<EssaySubmission> {
        let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM essay_submissions WHERE id = $1");
        sqlx::query_as::<_, EssaySubmission>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_submission error: {:?}", e);
                None
            })
    }

    // --- DASHBOARD ---

    /// get_stats
    ///
    /// All dashboard counters in one call.
    async fn get_stats(&self) -> AdminDashboardStats {
        let count = |sql: &'static str| {
            let pool = self.pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>(sql)
                    .fetch_one(&pool)
                    .await
                    .unwrap_or(0)
            }
        };

        AdminDashboardStats {
            total_users: count("SELECT COUNT(*) FROM profiles").await,
            total_exercises: count("SELECT COUNT(*) FROM exercises").await,
            total_submissions: count("SELECT COUNT(*) FROM essay_submissions").await,
            pending_exercises: count("SELECT COUNT(*) FROM exercises WHERE is_published = false")
                .await,
        }
    }
}
