use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// EssayAssessment
///
/// The verdict returned by the grading collaborator: an IELTS-scale band and
/// examiner-style feedback. Persisted onto the submission row.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EssayAssessment {
    pub band_score: f64,
    pub feedback: String,
}

/// EssayGrader
///
/// Contract for AI-assisted essay grading. The generative-text API is an
/// external collaborator: its failures surface as `Err` and are mapped to a
/// gateway error by the handler, never persisted.
#[async_trait]
pub trait EssayGrader: Send + Sync {
    async fn grade(
        &self,
        exam: &str,
        task_prompt: &str,
        essay: &str,
    ) -> Result<EssayAssessment, String>;
}

/// GraderState
///
/// The shared handle to the grading service used across the app state.
pub type GraderState = Arc<dyn EssayGrader>;

/// build_grading_prompt
///
/// Assembles the instruction prompt sent to the text model. The model is
/// asked for a bare JSON verdict; `parse_assessment` tolerates any prose it
/// wraps around it anyway.
pub fn build_grading_prompt(exam: &str, task_prompt: &str, essay: &str) -> String {
    format!(
        "You are a certified {exam} writing examiner. Grade the candidate essay \
         below against the official {exam} writing band descriptors (task \
         response, coherence and cohesion, lexical resource, grammatical range \
         and accuracy).\n\n\
         Writing task:\n{task_prompt}\n\n\
         Candidate essay:\n{essay}\n\n\
         Respond with a single JSON object and nothing else, in the form \
         {{\"band_score\": <number between 0 and 9>, \"feedback\": \"<three to \
         five sentences of examiner feedback>\"}}."
    )
}

/// parse_assessment
///
/// Extracts the JSON verdict from the model's reply. Text models routinely
/// wrap the object in prose or code fences, so this takes the outermost
/// brace span rather than requiring a clean body. The band is clamped to the
/// 0-9 scale.
pub fn parse_assessment(reply: &str) -> Result<EssayAssessment, String> {
    let start = reply
        .find('{')
        .ok_or_else(|| format!("no JSON object in grader reply: {:?}", reply))?;
    let end = reply
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| format!("unterminated JSON object in grader reply: {:?}", reply))?;

    let mut assessment: EssayAssessment = serde_json::from_str(&reply[start..=end])
        .map_err(|e| format!("malformed grader verdict: {}", e))?;

    assessment.band_score = assessment.band_score.clamp(0.0, 9.0);
    Ok(assessment)
}

/// Response body of the generative-text API's completion endpoint. Only the
/// generated text is of interest here.
#[derive(Deserialize)]
struct GeneratedText {
    text: String,
}

/// GenerativeGraderClient
///
/// The real `EssayGrader`: posts the grading prompt to the configured
/// generative-text endpoint and parses the JSON verdict out of the reply.
#[derive(Clone)]
pub struct GenerativeGraderClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GenerativeGraderClient {
    /// Constructs the client from the endpoint, key and model resolved by
    /// AppConfig.
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl EssayGrader for GenerativeGraderClient {
    async fn grade(
        &self,
        exam: &str,
        task_prompt: &str,
        essay: &str,
    ) -> Result<EssayAssessment, String> {
        let prompt = build_grading_prompt(exam, task_prompt, essay);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "model": self.model, "prompt": prompt }))
            .send()
            .await
            .map_err(|e| format!("grader request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("grader returned status {}", response.status()));
        }

        let body = response
            .json::<GeneratedText>()
            .await
            .map_err(|e| format!("unreadable grader response: {}", e))?;

        parse_assessment(&body.text)
    }
}

/// MockGrader
///
/// Test double for `EssayGrader`: deterministic verdict, optional simulated
/// failure, no network.
#[derive(Clone)]
pub struct MockGrader {
    /// When true, grading returns a simulated failure.
    pub should_fail: bool,
}

impl MockGrader {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockGrader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EssayGrader for MockGrader {
    async fn grade(
        &self,
        _exam: &str,
        _task_prompt: &str,
        _essay: &str,
    ) -> Result<EssayAssessment, String> {
        if self.should_fail {
            return Err("Mock Grader Error: Simulation requested".to_string());
        }

        Ok(EssayAssessment {
            band_score: 6.5,
            feedback: "A competent response with a clear position throughout. \
                       Paragraphing is logical, though cohesive devices are \
                       occasionally mechanical. Widen the range of complex \
                       structures to reach band 7."
                .to_string(),
        })
    }
}
