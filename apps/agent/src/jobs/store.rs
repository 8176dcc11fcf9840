//! Job persistence: one SQLite table keyed by posting URL.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

use super::models::{JobPosting, JobStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("no job stored for {0}")]
    NotFound(String),

    #[error("cannot move a job from '{from}' to '{to}'")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("corrupt job row for {url}: {reason}")]
    Corrupt { url: String, reason: String },
}

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    title: String,
    company: String,
    location: String,
    job_url: String,
    description: String,
    status: String,
    match_score: i64,
    matched_skills: String,
    found_at: Option<DateTime<Utc>>,
}

impl TryFrom<JobRow> for JobPosting {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|e| StoreError::Corrupt {
            url: row.job_url.clone(),
            reason: format!("{e}"),
        })?;
        let matched_skills: Vec<String> =
            serde_json::from_str(&row.matched_skills).map_err(|e| StoreError::Corrupt {
                url: row.job_url.clone(),
                reason: format!("matched_skills: {e}"),
            })?;
        Ok(JobPosting {
            title: row.title,
            company: row.company,
            location: row.location,
            url: row.job_url,
            description: row.description,
            match_score: row.match_score,
            matched_skills,
            status,
            found_at: row.found_at,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT title, company, location, job_url, description, status, \
     match_score, matched_skills, found_at FROM applications";

#[derive(Debug, Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// In-memory store with the schema applied. A single connection keeps every query
    /// on the same database.
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = Self::new(pool);
        store.migrate().await.unwrap();
        store
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                company TEXT NOT NULL,
                location TEXT NOT NULL DEFAULT '',
                job_url TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'found',
                match_score INTEGER NOT NULL DEFAULT 0,
                matched_skills TEXT NOT NULL DEFAULT '[]',
                found_at TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status);")
            .execute(&self.pool)
            .await?;

        info!("Job store schema ready");
        Ok(())
    }

    /// Inserts a new posting. Returns `false` when the URL is already stored; the
    /// existing row is left untouched.
    pub async fn add_job(&self, job: &JobPosting) -> Result<bool, StoreError> {
        let matched_skills = serde_json::to_string(&job.matched_skills).map_err(|e| {
            StoreError::Corrupt {
                url: job.url.clone(),
                reason: e.to_string(),
            }
        })?;
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO applications
                (title, company, location, job_url, description, status, match_score, matched_skills, found_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.url)
        .bind(&job.description)
        .bind(JobStatus::Found.as_str())
        .bind(job.match_score)
        .bind(matched_skills)
        .bind(job.found_at.unwrap_or_else(Utc::now))
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() == 1;
        if inserted {
            debug!(url = %job.url, "Stored new job");
        } else {
            debug!(url = %job.url, "Job already stored, skipped");
        }
        Ok(inserted)
    }

    /// Moves a posting along its review lifecycle. The write only lands if the row
    /// still holds the status the check was made against; a concurrent change in
    /// between surfaces as `InvalidTransition` from the newer status.
    pub async fn transition(&self, url: &str, next: JobStatus) -> Result<JobStatus, StoreError> {
        let current = self
            .job_status(url)
            .await?
            .ok_or_else(|| StoreError::NotFound(url.to_string()))?;
        if !current.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        if !self.set_status_if(url, current, next).await? {
            let now = self
                .job_status(url)
                .await?
                .ok_or_else(|| StoreError::NotFound(url.to_string()))?;
            debug!(url, expected = %current, found = %now, "Job status changed concurrently");
            return Err(StoreError::InvalidTransition { from: now, to: next });
        }
        info!(url, from = %current, to = %next, "Job status updated");
        Ok(next)
    }

    async fn set_status_if(
        &self,
        url: &str,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE applications SET status = ? WHERE job_url = ? AND status = ?")
                .bind(next.as_str())
                .bind(url)
                .bind(expected.as_str())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn job_status(&self, url: &str) -> Result<Option<JobStatus>, StoreError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM applications WHERE job_url = ?")
                .bind(url)
                .fetch_optional(&self.pool)
                .await?;
        status
            .map(|s| {
                s.parse().map_err(|e| StoreError::Corrupt {
                    url: url.to_string(),
                    reason: format!("{e}"),
                })
            })
            .transpose()
    }

    pub async fn get(&self, url: &str) -> Result<Option<JobPosting>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(&format!("{SELECT_COLUMNS} WHERE job_url = ?"))
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        row.map(JobPosting::try_from).transpose()
    }

    /// Postings in `status`, best match first.
    pub async fn jobs_by_status(&self, status: JobStatus) -> Result<Vec<JobPosting>, StoreError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "{SELECT_COLUMNS} WHERE status = ? ORDER BY match_score DESC, id ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(JobPosting::try_from).collect()
    }

    pub async fn all_jobs(&self) -> Result<Vec<JobPosting>, StoreError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!("{SELECT_COLUMNS} ORDER BY id DESC"))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(JobPosting::try_from).collect()
    }

    pub async fn known_urls(&self) -> Result<HashSet<String>, StoreError> {
        let urls: Vec<String> = sqlx::query_scalar("SELECT job_url FROM applications")
            .fetch_all(&self.pool)
            .await?;
        Ok(urls.into_iter().collect())
    }
}
