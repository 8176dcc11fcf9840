mod automation;
mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod logging;
mod resume;
mod routes;
mod state;
mod text;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::automation::{ApplicationRouter, WebDriverLauncher};
use crate::config::Config;
use crate::db::create_pool;
use crate::jobs::insights::{InsightGenerator, LlmInsightGenerator};
use crate::jobs::matcher::KeywordRelevanceScorer;
use crate::jobs::source::JsonFileSource;
use crate::jobs::store::JobStore;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging (console and log file)
    let _log_guard = logging::init(&config)?;

    info!(
        "Starting job-agent v{} (log file: {})",
        env!("CARGO_PKG_VERSION"),
        config.log_file.display()
    );

    // Initialize SQLite
    let store = JobStore::new(create_pool(&config.database_url).await?);
    store
        .migrate()
        .await
        .context("Could not create the applications table")?;

    // Initialize LLM client (optional)
    let insights: Option<Arc<dyn InsightGenerator>> = match &config.anthropic_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(LlmInsightGenerator(llm)))
        }
        None => {
            warn!("ANTHROPIC_API_KEY is not set; insight routes are disabled");
            None
        }
    };

    // The browser is launched on the first apply request, not here
    let router = ApplicationRouter::new(config.automation_config());
    let launcher = WebDriverLauncher::new(config.browser_config());
    info!(
        "Automation ready (webdriver: {}, artifacts: {})",
        config.webdriver_url,
        config.artifacts_dir.display()
    );

    // Build app state
    let state = AppState {
        store,
        router: Arc::new(router),
        browser: Arc::new(Mutex::new(None)),
        launcher: Arc::new(launcher),
        insights,
        scorer: Arc::new(KeywordRelevanceScorer),
        source: Arc::new(JsonFileSource::new(config.jobs_file.clone())),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
