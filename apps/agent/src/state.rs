use std::sync::{Arc, Mutex};

use crate::automation::{ApplicationRouter, BrowserLauncher, BrowserSession};
use crate::config::Config;
use crate::jobs::insights::InsightGenerator;
use crate::jobs::matcher::RelevanceScorer;
use crate::jobs::source::JobSource;
use crate::jobs::store::JobStore;

/// The one browser window shared by every apply request. Opened on first use and only
/// closed through `POST /api/v1/browser/quit`.
pub type SharedBrowser = Arc<Mutex<Option<Box<dyn BrowserSession + Send>>>>;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: JobStore,
    pub router: Arc<ApplicationRouter>,
    pub browser: SharedBrowser,
    pub launcher: Arc<dyn BrowserLauncher>,
    /// Absent when no ANTHROPIC_API_KEY is configured.
    pub insights: Option<Arc<dyn InsightGenerator>>,
    /// Pluggable relevance scorer. Default: KeywordRelevanceScorer.
    pub scorer: Arc<dyn RelevanceScorer>,
    pub source: Arc<dyn JobSource>,
    pub config: Config,
}
