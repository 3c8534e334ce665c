mod common;

use common::{MockRepo, client, spawn_app_with};
use prep_portal::grading::{
    EssayAssessment, EssayGrader, MockGrader, build_grading_prompt, parse_assessment,
};
use prep_portal::models::{EssaySubmission, User};
use reqwest::StatusCode;
use uuid::Uuid;

// --- Prompt construction ---

#[test]
fn test_prompt_carries_task_essay_and_exam() {
    let prompt = build_grading_prompt(
        "ielts",
        "Some people think museums should be free.",
        "Museums are a cornerstone of public education.",
    );

    assert!(prompt.contains("ielts"));
    assert!(prompt.contains("Some people think museums should be free."));
    assert!(prompt.contains("Museums are a cornerstone of public education."));
    // The model is told the exact shape of the verdict to emit.
    assert!(prompt.contains("band_score"));
    assert!(prompt.contains("feedback"));
}

// --- Verdict parsing ---

#[test]
fn test_parse_clean_json_verdict() {
    let verdict = parse_assessment(r#"{"band_score": 7.5, "feedback": "Strong cohesion."}"#)
        .expect("clean JSON should parse");

    assert_eq!(
        verdict,
        EssayAssessment {
            band_score: 7.5,
            feedback: "Strong cohesion.".to_string()
        }
    );
}

#[test]
fn test_parse_verdict_wrapped_in_prose_and_fences() {
    // Text models routinely decorate the object; the parser takes the
    // outermost brace span.
    let reply = "Here is my assessment:\n```json\n\
                 {\"band_score\": 6.0, \"feedback\": \"Adequate range.\"}\n\
                 ```\nGood luck!";

    let verdict = parse_assessment(reply).expect("wrapped JSON should parse");
    assert_eq!(verdict.band_score, 6.0);
    assert_eq!(verdict.feedback, "Adequate range.");
}

#[test]
fn test_parse_clamps_band_to_scale() {
    let high = parse_assessment(r#"{"band_score": 11.0, "feedback": "x"}"#).unwrap();
    assert_eq!(high.band_score, 9.0);

    let low = parse_assessment(r#"{"band_score": -2.0, "feedback": "x"}"#).unwrap();
    assert_eq!(low.band_score, 0.0);
}

#[test]
fn test_parse_rejects_replies_without_json() {
    assert!(parse_assessment("I would give this essay a seven.").is_err());
    assert!(parse_assessment("").is_err());
}

#[test]
fn test_parse_rejects_malformed_verdict() {
    // An object without the expected fields is a grader failure, not a zero.
    assert!(parse_assessment(r#"{"score": 7}"#).is_err());
}

// --- Mock grader ---

#[tokio::test]
async fn test_mock_grader_success_and_failure() {
    let verdict = MockGrader::new()
        .grade("ielts", "task", "essay")
        .await
        .expect("mock grade");
    assert!(verdict.band_score > 0.0);
    assert!(!verdict.feedback.is_empty());

    assert!(
        MockGrader::new_failing()
            .grade("ielts", "task", "essay")
            .await
            .is_err()
    );
}

// --- The essay endpoint, end to end against mocks ---

fn student(id: Uuid) -> MockRepo {
    MockRepo {
        user: Some(User {
            id,
            email: "student@prep.test".to_string(),
            role: "student".to_string(),
        }),
        role: Some("student".to_string()),
        ..MockRepo::default()
    }
}

#[tokio::test]
async fn test_submit_essay_returns_graded_submission() {
    let user_id = Uuid::new_v4();
    let app = spawn_app_with(student(user_id), MockGrader::new()).await;

    let response = client()
        .post(format!("{}/api/essays", app.address))
        .header("x-user-id", user_id.to_string())
        .json(&serde_json::json!({
            "exam": "ielts",
            "task_prompt": "Describe the chart.",
            "essay_text": "The chart shows a steady rise in enrolment over the decade."
        }))
        .send()
        .await
        .expect("post fail");

    assert_eq!(response.status(), StatusCode::OK);
    let submission: EssaySubmission = response.json().await.unwrap();

    assert_eq!(submission.user_id, user_id);
    assert_eq!(submission.exam, "ielts");
    assert_eq!(submission.status, "graded");
    assert_eq!(submission.band_score, 6.5);
    assert!(!submission.feedback.is_empty());
    // Word count is computed server-side from the essay body.
    assert_eq!(submission.word_count, 11);
}

#[tokio::test]
async fn test_submit_essay_maps_grader_failure_to_502() {
    let user_id = Uuid::new_v4();
    let app = spawn_app_with(student(user_id), MockGrader::new_failing()).await;

    let response = client()
        .post(format!("{}/api/essays", app.address))
        .header("x-user-id", user_id.to_string())
        .json(&serde_json::json!({
            "exam": "toeic",
            "task_prompt": "Write a complaint email.",
            "essay_text": "Dear sir or madam."
        }))
        .send()
        .await
        .expect("post fail");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_submit_essay_requires_authentication() {
    let app = spawn_app_with(MockRepo::default(), MockGrader::new()).await;

    let response = client()
        .post(format!("{}/api/essays", app.address))
        .json(&serde_json::json!({
            "exam": "ielts",
            "task_prompt": "x",
            "essay_text": "y"
        }))
        .send()
        .await
        .expect("post fail");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_essay_details_hidden_from_other_students() {
    // The submission belongs to someone else; a student sees 404, an admin
    // sees the essay.
    let owner = Uuid::new_v4();
    let reader = Uuid::new_v4();

    let submission = EssaySubmission {
        id: Uuid::new_v4(),
        user_id: owner,
        exam: "ielts".to_string(),
        status: "graded".to_string(),
        ..EssaySubmission::default()
    };

    let repo = MockRepo {
        submission: Some(submission.clone()),
        ..student(reader)
    };
    let app = spawn_app_with(repo, MockGrader::new()).await;

    let response = client()
        .get(format!("{}/api/essays/{}", app.address, submission.id))
        .header("x-user-id", reader.to_string())
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Same request, admin reader.
    let admin_repo = MockRepo {
        submission: Some(submission.clone()),
        user: Some(User {
            id: reader,
            email: "admin@prep.test".to_string(),
            role: "admin".to_string(),
        }),
        ..MockRepo::default()
    };
    let app = spawn_app_with(admin_repo, MockGrader::new()).await;

    let response = client()
        .get(format!("{}/api/essays/{}", app.address, submission.id))
        .header("x-user-id", reader.to_string())
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
}
