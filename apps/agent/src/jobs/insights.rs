use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::models::JobPosting;
use crate::llm_client::prompts::{
    application_text_prompt, talking_points_prompt, CAREER_COACH_SYSTEM, JSON_ONLY_SYSTEM,
};
use crate::llm_client::{LlmClient, LlmError};

/// Prompt-in/text-out helper for the human reviewing a posting.
///
/// Carried in `AppState` as `Option<Arc<dyn InsightGenerator>>`; absent when no API key
/// is configured.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    async fn talking_points(
        &self,
        job: &JobPosting,
        skills: &BTreeSet<String>,
    ) -> Result<Vec<String>, LlmError>;

    /// Cover-letter style text, also handed to the automation for cover-letter fields.
    async fn application_text(&self, job: &JobPosting, resume_text: &str)
        -> Result<String, LlmError>;
}

#[derive(Debug, Deserialize, Serialize)]
struct TalkingPoints {
    points: Vec<String>,
}

pub struct LlmInsightGenerator(pub LlmClient);

#[async_trait]
impl InsightGenerator for LlmInsightGenerator {
    async fn talking_points(
        &self,
        job: &JobPosting,
        skills: &BTreeSet<String>,
    ) -> Result<Vec<String>, LlmError> {
        let system = format!("{CAREER_COACH_SYSTEM} {JSON_ONLY_SYSTEM}");
        let parsed: TalkingPoints = self
            .0
            .call_json(&talking_points_prompt(job, skills), &system)
            .await?;
        Ok(clean_points(parsed.points))
    }

    async fn application_text(
        &self,
        job: &JobPosting,
        resume_text: &str,
    ) -> Result<String, LlmError> {
        self.0
            .complete(&application_text_prompt(job, resume_text), CAREER_COACH_SYSTEM)
            .await
    }
}

fn clean_points(points: Vec<String>) -> Vec<String> {
    points
        .into_iter()
        .map(|p| p.trim().trim_start_matches(['-', '*', '•']).trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}
