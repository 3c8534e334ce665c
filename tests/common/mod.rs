// Each test binary pulls in only the pieces of this module it needs.
#![allow(dead_code)]

use async_trait::async_trait;
use prep_portal::{
    AppConfig, AppState, MockGrader, MockStorageService, create_router,
    grading::GraderState,
    models::{
        AdminDashboardStats, CreateExerciseRequest, CreateLearningPathRequest,
        CreateQuestionRequest, EssaySubmission, Exercise, LearningPath, Question,
        UpdateExerciseRequest, UpdateLearningPathRequest, User,
    },
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

/// MockRepo
///
/// Scripted in-memory `Repository` so integration tests exercise the real
/// router and middleware without a database. Only the fields a test sets
/// matter; everything else answers with empty placeholders.
#[derive(Default)]
pub struct MockRepo {
    /// Profile returned by `get_user` (the AuthUser extractor's lookup).
    pub user: Option<User>,
    /// Role returned by `get_user_role` (the access router's lookup).
    pub role: Option<String>,
    /// When true, `get_user_role` simulates a role-store outage.
    pub role_lookup_fails: bool,
    /// Catalogue returned by the exercise listings.
    pub exercises: Vec<Exercise>,
    /// Submission returned by `get_submission` / `get_my_submissions`.
    pub submission: Option<EssaySubmission>,
}

#[async_trait]
impl Repository for MockRepo {
    async fn get_exercises(
        &self,
        _exam: Option<String>,
        _skill: Option<String>,
        _search: Option<String>,
    ) -> Vec<Exercise> {
        self.exercises.clone()
    }

    async fn get_all_exercises(&self) -> Vec<Exercise> {
        self.exercises.clone()
    }

    async fn get_exercise(&self, _id: Uuid) -> Option<Exercise> {
        self.exercises.first().cloned()
    }

    async fn get_published_exercise(&self, _id: Uuid) -> Option<Exercise> {
        self.exercises.iter().find(|e| e.is_published).cloned()
    }

    async fn create_exercise(&self, _req: CreateExerciseRequest) -> Exercise {
        Exercise::default()
    }

    async fn update_exercise(&self, _id: Uuid, _req: UpdateExerciseRequest) -> Option<Exercise> {
        None
    }

    async fn delete_exercise(&self, _id: Uuid) -> bool {
        false
    }

    async fn set_exercise_published(&self, _id: Uuid, _is_published: bool) -> Option<Exercise> {
        None
    }

    async fn get_questions(&self, _exercise_id: Uuid) -> Vec<Question> {
        vec![]
    }

    async fn create_question(&self, _exercise_id: Uuid, _req: CreateQuestionRequest) -> Question {
        Question::default()
    }

    async fn delete_question(&self, _id: i64) -> bool {
        false
    }

    async fn get_published_paths(&self, _exam: Option<String>) -> Vec<LearningPath> {
        vec![]
    }

    async fn get_path(&self, _id: Uuid) -> Option<LearningPath> {
        None
    }

    async fn get_published_path(&self, _id: Uuid) -> Option<LearningPath> {
        None
    }

    async fn create_path(&self, _req: CreateLearningPathRequest) -> LearningPath {
        LearningPath::default()
    }

    async fn update_path(&self, _id: Uuid, _req: UpdateLearningPathRequest) -> Option<LearningPath> {
        None
    }

    async fn delete_path(&self, _id: Uuid) -> bool {
        false
    }

    async fn get_user(&self, _id: Uuid) -> Option<User> {
        self.user.clone()
    }

    async fn get_user_role(&self, _id: Uuid) -> Result<Option<String>, String> {
        if self.role_lookup_fails {
            return Err("simulated role store outage".to_string());
        }
        Ok(self.role.clone())
    }

    async fn create_user(&self, user: User) -> User {
        user
    }

    async fn list_users(&self) -> Vec<User> {
        self.user.clone().into_iter().collect()
    }

    async fn set_user_role(&self, _id: Uuid, _role: String) -> Option<User> {
        self.user.clone()
    }

    /// Echoes the submission back, so handler tests can assert on exactly
    /// what would have been persisted.
    async fn create_submission(&self, submission: EssaySubmission) -> EssaySubmission {
        submission
    }

    async fn get_my_submissions(&self, _user_id: Uuid) -> Vec<EssaySubmission> {
        self.submission.clone().into_iter().collect()
    }

    async fn get_submission(&self, _id: Uuid) -> Option<EssaySubmission> {
        self.submission.clone()
    }

    async fn get_stats(&self) -> AdminDashboardStats {
        AdminDashboardStats::default()
    }
}

pub struct TestApp {
    pub address: String,
}

/// Spawns the full router on an ephemeral port with the scripted repository
/// and the default mocks for storage and grading. `AppConfig::default()`
/// runs in `Env::Local`, so tests authenticate with the `x-user-id` header.
pub async fn spawn_app(repo: MockRepo) -> TestApp {
    spawn_app_with(repo, MockGrader::new()).await
}

/// Same as `spawn_app`, with control over the grader double.
pub async fn spawn_app_with(repo: MockRepo, grader: MockGrader) -> TestApp {
    let state = AppState {
        repo: Arc::new(repo) as RepositoryState,
        storage: Arc::new(MockStorageService::new()) as StorageState,
        grader: Arc::new(grader) as GraderState,
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

/// A client that does NOT follow redirects, so tests can assert on the 307
/// and its Location header directly.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
