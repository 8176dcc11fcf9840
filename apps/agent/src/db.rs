use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Creates the SQLite pool, creating the database file (and its directory) if needed.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Opening SQLite database {database_url}...");

    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid DATABASE_URL '{database_url}'"))?
        .create_if_missing(true);

    if let Some(parent) = database_file(database_url).and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Could not create database directory {}", parent.display())
            })?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("Could not open the SQLite database")?;

    info!("SQLite connection pool established");
    Ok(pool)
}

/// File path part of a `sqlite:` URL; `None` for in-memory databases.
fn database_file(url: &str) -> Option<&Path> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    (!path.is_empty() && path != ":memory:").then(|| Path::new(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_file_from_url() {
        assert_eq!(
            database_file("sqlite://data/job_applications.db"),
            Some(Path::new("data/job_applications.db"))
        );
        assert_eq!(database_file("sqlite:jobs.db?mode=rwc"), Some(Path::new("jobs.db")));
        assert_eq!(database_file("sqlite::memory:"), None);
        assert_eq!(database_file("postgres://localhost/db"), None);
    }

    #[tokio::test]
    async fn test_create_pool_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("jobs.db");
        let url = format!("sqlite://{}", file.display());

        let pool = create_pool(&url).await.unwrap();
        sqlx::query("SELECT 1").execute(&pool).await.unwrap();
        assert!(file.exists());
    }
}
