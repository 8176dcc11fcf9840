use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::automation::{AutomationConfig, BrowserConfig, WaitPolicy};
use crate::jobs::matcher::DEFAULT_RELEVANCE_THRESHOLD;
use crate::resume::default_vocabulary;

/// Application configuration loaded from environment variables.
/// Every variable has a default except the optional API key and browser profile.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub resume_path: PathBuf,
    pub jobs_file: PathBuf,
    /// Skill vocabulary matched against the resume.
    pub skills: Vec<String>,
    pub relevance_threshold: i64,
    pub artifacts_dir: PathBuf,
    pub element_timeout: Duration,
    pub upload_timeout: Duration,
    pub poll_interval: Duration,
    pub webdriver_url: String,
    pub browser_headless: bool,
    pub browser_profile_dir: Option<PathBuf>,
    pub browser_extra_args: Vec<String>,
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Plain-text copy of the console log.
    pub log_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let skills = optional_env("SKILLS")
            .map(|raw| parse_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(default_vocabulary);

        Ok(Config {
            database_url: env_or("DATABASE_URL", "sqlite://data/job_applications.db"),
            resume_path: PathBuf::from(env_or("RESUME_PATH", "resume.pdf")),
            jobs_file: PathBuf::from(env_or("JOBS_FILE", "jobs.json")),
            skills,
            relevance_threshold: parse_env("RELEVANCE_THRESHOLD", DEFAULT_RELEVANCE_THRESHOLD)?,
            artifacts_dir: PathBuf::from(env_or("ARTIFACTS_DIR", "artifacts")),
            element_timeout: Duration::from_secs(parse_env("ELEMENT_TIMEOUT_SECS", 15)?),
            upload_timeout: Duration::from_secs(parse_env("UPLOAD_TIMEOUT_SECS", 20)?),
            poll_interval: Duration::from_millis(parse_env("POLL_INTERVAL_MS", 500)?),
            webdriver_url: env_or("WEBDRIVER_URL", "http://localhost:9515"),
            browser_headless: parse_bool(&env_or("BROWSER_HEADLESS", "false"))
                .context("BROWSER_HEADLESS must be true or false")?,
            browser_profile_dir: optional_env("BROWSER_PROFILE_DIR").map(PathBuf::from),
            browser_extra_args: optional_env("BROWSER_EXTRA_ARGS")
                .map(|raw| parse_list(&raw))
                .unwrap_or_default(),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            log_file: PathBuf::from(env_or("LOG_FILE", "data/agent.log")),
        })
    }

    pub fn automation_config(&self) -> AutomationConfig {
        AutomationConfig {
            waits: WaitPolicy {
                element_timeout: self.element_timeout,
                upload_timeout: self.upload_timeout,
                poll_interval: self.poll_interval,
            },
            artifacts_dir: self.artifacts_dir.clone(),
        }
    }

    pub fn browser_config(&self) -> BrowserConfig {
        BrowserConfig {
            headless: self.browser_headless,
            profile_directory: self.browser_profile_dir.clone(),
            extra_arguments: self.browser_extra_args.clone(),
            webdriver_url: self.webdriver_url.clone(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Unset and blank variables both count as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("not a boolean: '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            resume_path: PathBuf::from("cv.pdf"),
            jobs_file: PathBuf::from("jobs.json"),
            skills: vec!["rust".to_string()],
            relevance_threshold: 2,
            artifacts_dir: PathBuf::from("shots"),
            element_timeout: Duration::from_secs(3),
            upload_timeout: Duration::from_secs(4),
            poll_interval: Duration::from_millis(50),
            webdriver_url: "http://localhost:4444".to_string(),
            browser_headless: true,
            browser_profile_dir: Some(PathBuf::from("/tmp/profile")),
            browser_extra_args: vec!["--lang=en".to_string()],
            anthropic_api_key: None,
            port: 8080,
            rust_log: "debug".to_string(),
            log_file: PathBuf::from("data/agent.log"),
        }
    }

    #[test]
    fn test_parse_list_drops_blanks() {
        assert_eq!(parse_list(" rust, ,c++ ,"), vec!["rust", "c++"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("off").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("JOB_AGENT_TEST_SURELY_UNSET", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_automation_and_browser_config() {
        let config = sample();
        let automation = config.automation_config();
        assert_eq!(automation.waits.element_timeout, Duration::from_secs(3));
        assert_eq!(automation.waits.upload_timeout, Duration::from_secs(4));
        assert_eq!(automation.waits.poll_interval, Duration::from_millis(50));
        assert_eq!(automation.artifacts_dir, PathBuf::from("shots"));

        let browser = config.browser_config();
        assert!(browser.headless);
        assert_eq!(browser.webdriver_url, "http://localhost:4444");
        assert!(browser.arguments().contains(&"--lang=en".to_string()));
    }
}
