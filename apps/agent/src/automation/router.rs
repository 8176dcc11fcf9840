//! Application router: the entry point of one automation attempt.
//!
//! Validates preconditions, opens the posting, picks the handler once from the URL and
//! runs it behind a panic boundary. Whatever happens, the browser stays open and the
//! caller gets an `AutomationOutcome` back; nothing is propagated.

use std::any::Any;
use std::fs::File;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, instrument};

use super::handlers::{capture_screenshot, handler_for, ApplicationPacket};
use super::outcome::{AutomationOutcome, OutcomeKind};
use super::portal::classify;
use super::report::StatusReporter;
use super::session::{BrowserError, BrowserSession};
use super::{AutomationConfig, CRITICAL_ARTIFACT};
use crate::jobs::models::JobPosting;

#[derive(Debug, Clone, Default)]
pub struct ApplicationRouter {
    config: AutomationConfig,
}

impl ApplicationRouter {
    pub fn new(config: AutomationConfig) -> Self {
        Self { config }
    }

    /// Checks everything that can be checked without a browser: a posting URL and a
    /// readable resume file. Hosts that open browsers lazily call this first.
    pub fn check_preconditions(
        &self,
        posting: &JobPosting,
        packet: &ApplicationPacket,
    ) -> Option<AutomationOutcome> {
        let url = posting.url.trim();
        let kind = classify(url);
        if url.is_empty() {
            return Some(AutomationOutcome::failed(
                kind,
                OutcomeKind::MissingUrl,
                format!("Posting \"{}\" has no URL", posting.title),
            ));
        }

        let resume = &packet.resume_path;
        let readable = resume.is_file() && File::open(resume).is_ok();
        if !readable {
            return Some(AutomationOutcome::failed(
                kind,
                OutcomeKind::MissingResume,
                format!("Resume file {} is missing or unreadable", resume.display()),
            ));
        }
        None
    }

    /// Runs one automation attempt against `session`.
    #[instrument(skip_all, fields(url = %posting.url))]
    pub fn route(
        &self,
        session: Option<&mut dyn BrowserSession>,
        posting: &JobPosting,
        packet: &ApplicationPacket,
        reporter: &dyn StatusReporter,
    ) -> AutomationOutcome {
        if let Some(failure) = self.check_preconditions(posting, packet) {
            reporter.error(&failure.message, None);
            return failure;
        }
        let url = posting.url.trim();
        let kind = classify(url);

        let Some(session) = session else {
            let failure = AutomationOutcome::failed(
                kind,
                OutcomeKind::MissingSession,
                "No browser session is available",
            );
            reporter.error(&failure.message, None);
            return failure;
        };

        reporter.info(&format!("Opening {url} ({kind} portal)"));
        match session.navigate(url) {
            Ok(()) => {}
            Err(BrowserError::SessionClosed) => {
                let message = format!("Could not open {url}: the browser window was closed");
                reporter.error(&message, None);
                return AutomationOutcome::failed(kind, OutcomeKind::SessionClosed, message);
            }
            Err(e) => {
                let artifact = self.capture_critical(session, reporter);
                let message = format!("Could not open {url}");
                reporter.error(&message, Some(&e.to_string()));
                return AutomationOutcome::failed(
                    kind,
                    OutcomeKind::NavigationFailed,
                    format!("{message}: {e}"),
                )
                .with_artifact(artifact);
            }
        }

        let handler = handler_for(kind);
        debug!(portal = %kind, "Dispatching to portal handler");
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.attempt(&mut *session, packet, reporter, &self.config)
        }));

        let outcome = match attempt {
            Ok(outcome) => outcome,
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                let artifact = self.capture_critical(session, reporter);
                let message = format!("{kind} automation crashed");
                reporter.error(&message, Some(&detail));
                let message = format!("{message}: {detail}");
                AutomationOutcome::failed(kind, OutcomeKind::Crashed, message)
                    .with_artifact(artifact)
            }
        };

        if outcome.kind != OutcomeKind::SessionClosed {
            reporter.info(
                "The browser window stays open for you to review and finish the application",
            );
        }
        outcome
    }

    fn capture_critical(
        &self,
        session: &mut dyn BrowserSession,
        reporter: &dyn StatusReporter,
    ) -> Option<std::path::PathBuf> {
        capture_screenshot(session, &self.config.artifacts_dir, CRITICAL_ARTIFACT, reporter)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
