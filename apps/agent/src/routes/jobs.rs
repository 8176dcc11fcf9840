use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::jobs::insights::InsightGenerator;
use crate::jobs::matcher::rank_jobs;
use crate::jobs::models::UnknownStatus;
use crate::jobs::{JobPosting, JobStatus};
use crate::resume::{load_resume, ResumeRecord};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// Identifies a stored posting by its URL.
#[derive(Deserialize)]
pub struct JobRef {
    pub url: String,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub url: String,
    pub status: JobStatus,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub url: String,
    pub status: JobStatus,
}

#[derive(Serialize)]
pub struct FetchResponse {
    /// Records read from the source.
    pub fetched: usize,
    /// Records whose URL was not stored yet.
    pub new: usize,
    pub stored: usize,
    pub jobs: Vec<JobPosting>,
}

#[derive(Serialize)]
pub struct InsightsResponse {
    pub url: String,
    pub talking_points: Vec<String>,
}

#[derive(Serialize)]
pub struct ApplicationTextResponse {
    pub url: String,
    pub text: String,
}

/// POST /api/v1/jobs/fetch
pub async fn handle_fetch_jobs(
    State(state): State<AppState>,
) -> Result<Json<FetchResponse>, AppError> {
    let resume = load_current_resume(&state).await?;
    let scraped = state.source.fetch().await?;
    let fetched = scraped.len();

    let known = state.store.known_urls().await?;
    let mut seen = HashSet::new();
    let fresh: Vec<JobPosting> = scraped
        .into_iter()
        .filter(|job| !known.contains(&job.url) && seen.insert(job.url.clone()))
        .collect();
    let new = fresh.len();

    let ranked = rank_jobs(
        state.scorer.as_ref(),
        fresh,
        &resume.skills,
        state.config.relevance_threshold,
    );
    let mut stored = Vec::with_capacity(ranked.len());
    for job in ranked {
        if state.store.add_job(&job).await? {
            stored.push(job);
        }
    }

    info!(
        source = %state.source.describe(),
        fetched,
        new,
        stored = stored.len(),
        "Job fetch complete"
    );
    Ok(Json(FetchResponse {
        fetched,
        new,
        stored: stored.len(),
        jobs: stored,
    }))
}

/// GET /api/v1/jobs?status=found
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    let jobs = match params.status.as_deref() {
        Some(raw) => {
            let status: JobStatus = raw
                .parse()
                .map_err(|e: UnknownStatus| AppError::Validation(e.to_string()))?;
            state.store.jobs_by_status(status).await?
        }
        None => state.store.all_jobs().await?,
    };
    Ok(Json(jobs))
}

/// POST /api/v1/jobs/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<StatusResponse>, AppError> {
    let status = state.store.transition(&req.url, req.status).await?;
    Ok(Json(StatusResponse {
        url: req.url,
        status,
    }))
}

/// POST /api/v1/jobs/insights
pub async fn handle_insights(
    State(state): State<AppState>,
    Json(req): Json<JobRef>,
) -> Result<Json<InsightsResponse>, AppError> {
    let generator = require_insights(&state)?;
    let job = find_job(&state, &req.url).await?;
    let resume = load_current_resume(&state).await?;
    let talking_points = generator.talking_points(&job, &resume.skills).await?;
    Ok(Json(InsightsResponse {
        url: req.url,
        talking_points,
    }))
}

/// POST /api/v1/jobs/application-text
pub async fn handle_application_text(
    State(state): State<AppState>,
    Json(req): Json<JobRef>,
) -> Result<Json<ApplicationTextResponse>, AppError> {
    let generator = require_insights(&state)?;
    let job = find_job(&state, &req.url).await?;
    let resume = load_current_resume(&state).await?;
    let text = generator.application_text(&job, &resume.full_text).await?;
    Ok(Json(ApplicationTextResponse { url: req.url, text }))
}

fn require_insights(state: &AppState) -> Result<Arc<dyn InsightGenerator>, AppError> {
    state
        .insights
        .clone()
        .ok_or(AppError::NotConfigured("ANTHROPIC_API_KEY"))
}

pub(crate) async fn find_job(state: &AppState, url: &str) -> Result<JobPosting, AppError> {
    state
        .store
        .get(url)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {url} not found")))
}

/// Parses the configured resume on a blocking thread (PDF extraction is CPU-bound).
pub(crate) async fn load_current_resume(state: &AppState) -> Result<ResumeRecord, AppError> {
    let path = state.config.resume_path.clone();
    let vocabulary = state.config.skills.clone();
    let record = tokio::task::spawn_blocking(move || load_resume(&path, &vocabulary))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("resume loading task failed: {e}")))??;
    Ok(record)
}
