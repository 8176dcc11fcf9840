//! Job sources: producers of scraped postings.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use super::models::JobPosting;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a valid job export: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait JobSource: Send + Sync {
    /// Human-readable origin, for logs.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Vec<JobPosting>, SourceError>;
}

/// One record of a scraper export (`jobs.json`).
#[derive(Debug, Deserialize)]
struct ScrapedJob {
    #[serde(default)]
    title: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    location: String,
    #[serde(default, alias = "url", alias = "job_url")]
    link: String,
    /// Description markup.
    #[serde(default, alias = "description")]
    criteria: String,
}

impl From<ScrapedJob> for JobPosting {
    fn from(job: ScrapedJob) -> Self {
        JobPosting {
            title: job.title.trim().to_string(),
            company: job.company.trim().to_string(),
            location: job.location.trim().to_string(),
            url: job.link.trim().to_string(),
            description: job.criteria,
            ..Default::default()
        }
    }
}

/// Reads postings from a JSON array exported by a scraper run.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl JobSource for JsonFileSource {
    fn describe(&self) -> String {
        format!("job export {}", self.path.display())
    }

    async fn fetch(&self) -> Result<Vec<JobPosting>, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        let records: Vec<ScrapedJob> =
            serde_json::from_str(&raw).map_err(|source| SourceError::Parse {
                path: self.path.clone(),
                source,
            })?;

        let total = records.len();
        let jobs: Vec<JobPosting> = records
            .into_iter()
            .map(JobPosting::from)
            .filter(|job| !job.url.is_empty())
            .collect();
        if jobs.len() < total {
            warn!(
                skipped = total - jobs.len(),
                "Skipped exported jobs without a link"
            );
        }
        info!(count = jobs.len(), source = %self.describe(), "Loaded jobs");
        Ok(jobs)
    }
}
