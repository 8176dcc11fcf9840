//! In-memory application state for the route tests.

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use super::build_router;
use crate::automation::testing::{fast_config, FakeSession};
use crate::automation::{ApplicationRouter, BrowserError, BrowserLauncher, BrowserSession};
use crate::config::Config;
use crate::jobs::insights::InsightGenerator;
use crate::jobs::matcher::KeywordRelevanceScorer;
use crate::jobs::source::{JobSource, SourceError};
use crate::jobs::store::JobStore;
use crate::jobs::JobPosting;
use crate::llm_client::LlmError;
use crate::resume::default_vocabulary;
use crate::state::AppState;

pub const RESUME_TEXT: &str = "Ada Lovelace\n\
    ada@example.com\n\
    Built Rust services backed by SQL, shipped with Docker.\n";

pub fn sample_jobs() -> Vec<JobPosting> {
    let rust = JobPosting {
        title: "Rust Engineer".to_string(),
        company: "Acme".to_string(),
        url: "https://acme.wd1.myworkdayjobs.com/job/rust".to_string(),
        description: "Rust and SQL services".to_string(),
        ..Default::default()
    };
    vec![
        JobPosting {
            title: "Sales Lead".to_string(),
            company: "Acme".to_string(),
            url: "https://careers.example.com/jobs/sales".to_string(),
            description: "Some docker".to_string(),
            ..Default::default()
        },
        rust.clone(),
        JobPosting {
            title: "Platform Engineer".to_string(),
            company: "Initech".to_string(),
            url: "https://careers.example.com/jobs/platform".to_string(),
            description: "<p>Docker, SQL and Rust</p>".to_string(),
            ..Default::default()
        },
        rust,
    ]
}

pub struct StaticSource(pub Vec<JobPosting>);

#[async_trait]
impl JobSource for StaticSource {
    fn describe(&self) -> String {
        "static test source".to_string()
    }

    async fn fetch(&self) -> Result<Vec<JobPosting>, SourceError> {
        Ok(self.0.clone())
    }
}

pub struct CannedInsights;

#[async_trait]
impl InsightGenerator for CannedInsights {
    async fn talking_points(
        &self,
        job: &JobPosting,
        skills: &BTreeSet<String>,
    ) -> Result<Vec<String>, LlmError> {
        let skills: Vec<&str> = skills.iter().map(String::as_str).collect();
        Ok(vec![format!("{}: {}", job.title, skills.join(", "))])
    }

    async fn application_text(
        &self,
        job: &JobPosting,
        _resume_text: &str,
    ) -> Result<String, LlmError> {
        Ok(format!("Dear {}, I build Rust services.", job.company))
    }
}

/// Hands out blank `FakeSession`s and counts how often it was asked.
#[derive(Default)]
pub struct FakeLauncher {
    pub launches: AtomicUsize,
    pub unavailable: bool,
}

impl FakeLauncher {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

impl BrowserLauncher for FakeLauncher {
    fn launch(&self) -> Result<Box<dyn BrowserSession + Send>, BrowserError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(BrowserError::Launch("chromedriver is not running".to_string()));
        }
        Ok(Box::new(FakeSession::new()))
    }
}

pub struct TestApp {
    pub state: AppState,
    pub resume: tempfile::NamedTempFile,
    pub launcher: Arc<FakeLauncher>,
}

impl TestApp {
    pub async fn new(jobs: Vec<JobPosting>) -> Self {
        Self::with_launcher(jobs, FakeLauncher::default()).await
    }

    pub async fn with_launcher(jobs: Vec<JobPosting>, launcher: FakeLauncher) -> Self {
        let mut resume = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        resume.write_all(RESUME_TEXT.as_bytes()).unwrap();

        let store = JobStore::in_memory().await;
        let launcher = Arc::new(launcher);
        let router = ApplicationRouter::new(fast_config());
        let state = AppState {
            store,
            router: Arc::new(router),
            browser: Arc::new(Mutex::new(None)),
            launcher: launcher.clone(),
            insights: None,
            scorer: Arc::new(KeywordRelevanceScorer),
            source: Arc::new(StaticSource(jobs)),
            config: test_config(&resume),
        };
        Self {
            state,
            resume,
            launcher,
        }
    }

    pub fn with_insights(mut self) -> Self {
        self.state.insights = Some(Arc::new(CannedInsights));
        self
    }
}

fn test_config(resume: &tempfile::NamedTempFile) -> Config {
    let automation = fast_config();
    Config {
        database_url: "sqlite::memory:".to_string(),
        resume_path: resume.path().to_path_buf(),
        jobs_file: "jobs.json".into(),
        skills: default_vocabulary(),
        relevance_threshold: 2,
        artifacts_dir: automation.artifacts_dir,
        element_timeout: automation.waits.element_timeout,
        upload_timeout: automation.waits.upload_timeout,
        poll_interval: automation.waits.poll_interval,
        webdriver_url: "http://localhost:9515".to_string(),
        browser_headless: true,
        browser_profile_dir: None,
        browser_extra_args: Vec::new(),
        anthropic_api_key: None,
        port: 0,
        rust_log: "debug".to_string(),
        log_file: std::env::temp_dir().join("job-agent-test.log"),
    }
}

/// Sends one request through a fresh router and returns the status and JSON body.
pub async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = tokio::time::timeout(
        Duration::from_secs(10),
        build_router(state.clone()).oneshot(request),
    )
    .await
    .expect("request timed out")
    .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
