pub mod browser;
pub mod health;
pub mod jobs;

#[cfg(test)]
mod testing;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Job review
        .route("/api/v1/jobs", get(jobs::handle_list_jobs))
        .route("/api/v1/jobs/fetch", post(jobs::handle_fetch_jobs))
        .route("/api/v1/jobs/status", post(jobs::handle_update_status))
        .route("/api/v1/jobs/insights", post(jobs::handle_insights))
        .route(
            "/api/v1/jobs/application-text",
            post(jobs::handle_application_text),
        )
        // Automation
        .route("/api/v1/jobs/apply", post(browser::handle_apply))
        .route("/api/v1/browser/quit", post(browser::handle_quit_browser))
        .with_state(state)
}
