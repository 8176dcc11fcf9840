use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::jobs::{find_job, load_current_resume};
use crate::automation::{
    ApplicationPacket, AutomationOutcome, BrowserError, BrowserSession, OutcomeKind,
    RecordingReporter, ReportEvent, StatusReporter,
};
use crate::errors::AppError;
use crate::jobs::{JobPosting, JobStatus};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ApplyRequest {
    pub url: String,
    /// Cover-letter text for portals that have a field for it.
    #[serde(default)]
    pub application_text: Option<String>,
}

#[derive(Serialize)]
pub struct ApplyResponse {
    pub url: String,
    pub status: JobStatus,
    pub outcome: AutomationOutcome,
    pub events: Vec<ReportEvent>,
}

#[derive(Serialize)]
pub struct QuitResponse {
    pub closed: bool,
}

/// POST /api/v1/jobs/apply
///
/// Approves the posting (`found` → `applying`) if needed, runs one automation attempt
/// in the shared browser and marks the posting `applied` only when the form was
/// prepared. Precondition failures come back as a normal outcome, not as an HTTP error.
pub async fn handle_apply(
    State(state): State<AppState>,
    Json(req): Json<ApplyRequest>,
) -> Result<Json<ApplyResponse>, AppError> {
    let job = find_job(&state, &req.url).await?;
    if job.status != JobStatus::Applying {
        state.store.transition(&job.url, JobStatus::Applying).await?;
    }

    let packet = match load_current_resume(&state).await {
        Ok(resume) => resume.application_packet(req.application_text),
        Err(e) => {
            // The router turns a missing resume into a MissingResume outcome.
            warn!("Resume could not be loaded for {}: {e}", job.url);
            ApplicationPacket {
                resume_path: state.config.resume_path.clone(),
                application_text: req.application_text,
                ..Default::default()
            }
        }
    };

    let worker_state = state.clone();
    let worker_job = job.clone();
    let (outcome, events) =
        tokio::task::spawn_blocking(move || run_attempt(&worker_state, &worker_job, &packet))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("automation task failed: {e}")))?;

    let status = if outcome.succeeded {
        state.store.transition(&job.url, JobStatus::Applied).await?
    } else {
        JobStatus::Applying
    };
    info!(url = %job.url, kind = ?outcome.kind, "Apply request finished");

    Ok(Json(ApplyResponse {
        url: job.url,
        status,
        outcome,
        events,
    }))
}

/// One attempt, holding the browser lock throughout. Blocking.
///
/// A window the user closed since the last attempt is replaced once.
fn run_attempt(
    state: &AppState,
    job: &JobPosting,
    packet: &ApplicationPacket,
) -> (AutomationOutcome, Vec<ReportEvent>) {
    let reporter = RecordingReporter::new();

    // Nothing is launched for an attempt that cannot run.
    if let Some(failure) = state.router.check_preconditions(job, packet) {
        reporter.error(&failure.message, None);
        return (failure, reporter.into_events());
    }

    let mut browser = state
        .browser
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut outcome = attempt_in(state, &mut browser, job, packet, &reporter);
    if outcome.kind == OutcomeKind::SessionClosed {
        discard(&mut browser);
        reporter.warning("The browser window was closed; opening a new one");
        outcome = attempt_in(state, &mut browser, job, packet, &reporter);
    }
    drop(browser);
    (outcome, reporter.into_events())
}

fn attempt_in(
    state: &AppState,
    browser: &mut Option<Box<dyn BrowserSession + Send>>,
    job: &JobPosting,
    packet: &ApplicationPacket,
    reporter: &RecordingReporter,
) -> AutomationOutcome {
    if browser.is_none() {
        match state.launcher.launch() {
            Ok(session) => *browser = Some(session),
            Err(e) => reporter.error("Could not start the browser", Some(&e.to_string())),
        }
    }
    let session = browser
        .as_deref_mut()
        .map(|session| session as &mut dyn BrowserSession);
    state.router.route(session, job, packet, reporter)
}

/// Empties the slot. The session is already dead, so a failed close is only logged.
fn discard(browser: &mut Option<Box<dyn BrowserSession + Send>>) {
    if let Some(mut dead) = browser.take() {
        if let Err(e) = dead.close() {
            debug!("Closing the abandoned browser session failed: {e}");
        }
    }
}

/// POST /api/v1/browser/quit
pub async fn handle_quit_browser(
    State(state): State<AppState>,
) -> Result<Json<QuitResponse>, AppError> {
    let browser = state.browser.clone();
    let closed = tokio::task::spawn_blocking(move || {
        let mut slot = browser
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot.take() {
            // A window the user already closed counts as closed.
            Some(mut session) => match session.close() {
                Ok(()) | Err(BrowserError::SessionClosed) => Ok(true),
                Err(e) => Err(e),
            },
            None => Ok(false),
        }
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("browser shutdown task failed: {e}")))??;

    info!(closed, "Browser quit requested");
    Ok(Json(QuitResponse { closed }))
}
