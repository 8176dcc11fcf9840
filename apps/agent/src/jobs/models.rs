use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review state of a posting.
///
/// ```text
/// found ──approve──▶ applying ──handed off──▶ applied
///   │                   │
///   └──skip──▶ rejected └──cancel──▶ found
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Found,
    Applying,
    Applied,
    Rejected,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Found => "found",
            JobStatus::Applying => "applying",
            JobStatus::Applied => "applied",
            JobStatus::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Found, JobStatus::Applying)
                | (JobStatus::Found, JobStatus::Rejected)
                | (JobStatus::Applying, JobStatus::Applied)
                | (JobStatus::Applying, JobStatus::Found)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown job status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "found" => Ok(JobStatus::Found),
            "applying" => Ok(JobStatus::Applying),
            "applied" => Ok(JobStatus::Applied),
            "rejected" => Ok(JobStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A scraped job posting. `url` is its only stable identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    /// Description as scraped, usually HTML.
    pub description: String,
    pub match_score: i64,
    pub matched_skills: Vec<String>,
    pub status: JobStatus,
    pub found_at: Option<DateTime<Utc>>,
}
