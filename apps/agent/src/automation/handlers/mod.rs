//! Portal handlers: one fixed choreography per supported portal plus a generic fallback.
//!
//! A handler only implements `drive`, the happy path of its choreography. The shared
//! failure policy lives in the provided `PortalHandler::attempt`: a terminal step error
//! is turned into a screenshot, an error report and a failed outcome, and the session is
//! left open for the human either way.

pub mod generic;
pub mod greenhouse;
pub mod lever;
pub mod workday;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::outcome::{AutomationOutcome, OutcomeKind};
use super::portal::PortalKind;
use super::report::StatusReporter;
use super::session::{BrowserError, BrowserSession, ElementRef, Locator};
use super::wait::{wait_for_any, Condition, WaitPolicy};
use super::AutomationConfig;

pub use generic::GenericHandler;
pub use greenhouse::GreenhouseHandler;
pub use lever::LeverHandler;
pub use workday::WorkdayHandler;

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

/// Applicant fields that portals commonly ask for. Empty strings mean "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Everything a handler may put into a form.
#[derive(Debug, Clone, Default)]
pub struct ApplicationPacket {
    pub resume_path: PathBuf,
    pub applicant: ContactDetails,
    /// Generated cover-letter style text, when the caller has one.
    pub application_text: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Terminal failures of a handler step. Recoverable misses are warnings instead.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("no resume file input appeared on the page")]
    FileInputNotFound,

    #[error("the portal asks for a sign-in before the application form")]
    LoginWall,

    #[error("resume upload failed: {0}")]
    Upload(#[source] BrowserError),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

// ────────────────────────────────────────────────────────────────────────────
// Per-attempt context
// ────────────────────────────────────────────────────────────────────────────

/// State threaded through one handler run.
pub struct Attempt<'a> {
    pub packet: &'a ApplicationPacket,
    pub reporter: &'a dyn StatusReporter,
    pub waits: &'a WaitPolicy,
    warnings: Vec<String>,
}

impl<'a> Attempt<'a> {
    pub fn new(
        packet: &'a ApplicationPacket,
        reporter: &'a dyn StatusReporter,
        waits: &'a WaitPolicy,
    ) -> Self {
        Self {
            packet,
            reporter,
            waits,
            warnings: Vec::new(),
        }
    }

    /// Reports a recoverable miss and keeps it for the outcome.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.reporter.warning(&message);
        self.warnings.push(message);
    }

    #[cfg(test)]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    /// Bounded lookup using the element timeout.
    pub fn find(
        &self,
        session: &mut dyn BrowserSession,
        locators: &[Locator],
        condition: Condition,
    ) -> Result<Option<ElementRef>, HandlerError> {
        self.find_within(session, locators, condition, self.waits.element_timeout)
    }

    pub fn find_within(
        &self,
        session: &mut dyn BrowserSession,
        locators: &[Locator],
        condition: Condition,
        timeout: Duration,
    ) -> Result<Option<ElementRef>, HandlerError> {
        let found = wait_for_any(session, locators, condition, timeout, self.waits.poll_interval)?;
        Ok(found.map(|f| f.element))
    }

    /// Downgrades a failed best-effort command to a warning. A closed session still
    /// ends the attempt.
    pub fn soft<T>(
        &mut self,
        step: &str,
        result: Result<T, BrowserError>,
    ) -> Result<Option<T>, HandlerError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(BrowserError::SessionClosed) => Err(BrowserError::SessionClosed.into()),
            Err(e) => {
                self.warn(format!("{step}: {e}"));
                Ok(None)
            }
        }
    }

    /// Clicks the first interactable match, or records `missing` as a warning.
    pub fn click_if_present(
        &mut self,
        session: &mut dyn BrowserSession,
        locators: &[Locator],
        missing: &str,
    ) -> Result<bool, HandlerError> {
        match self.find(session, locators, Condition::Interactable)? {
            Some(element) => Ok(self.soft("click", session.click(element))?.is_some()),
            None => {
                self.warn(missing);
                Ok(false)
            }
        }
    }

    /// Hands the resume file to `input`. Failure here is terminal.
    pub fn upload_resume(
        &mut self,
        session: &mut dyn BrowserSession,
        input: ElementRef,
    ) -> Result<(), HandlerError> {
        session
            .upload(input, &self.packet.resume_path)
            .map_err(|e| match e {
                BrowserError::SessionClosed => HandlerError::Browser(e),
                other => HandlerError::Upload(other),
            })?;
        self.reporter.success(&format!(
            "Resume {} attached",
            file_label(&self.packet.resume_path)
        ));
        Ok(())
    }

    /// Locates a field and fills it with `value` unless it already holds something.
    pub fn fill_if_empty(
        &mut self,
        session: &mut dyn BrowserSession,
        locators: &[Locator],
        value: &str,
        label: &str,
    ) -> Result<bool, HandlerError> {
        match self.find(session, locators, Condition::Present)? {
            Some(element) => self.fill_element_if_empty(session, element, value, label),
            None => {
                self.warn(format!("{label} field not found; fill it in manually"));
                Ok(false)
            }
        }
    }

    /// Never overwrites a value the portal pre-filled from the parsed resume.
    pub fn fill_element_if_empty(
        &mut self,
        session: &mut dyn BrowserSession,
        element: ElementRef,
        value: &str,
        label: &str,
    ) -> Result<bool, HandlerError> {
        if value.trim().is_empty() {
            self.warn(format!("No {label} available; left blank"));
            return Ok(false);
        }
        let Some(current) = self.soft(label, session.value(element))? else {
            return Ok(false);
        };
        if !current.trim().is_empty() {
            self.reporter
                .info(&format!("Kept the {label} the portal already filled in"));
            return Ok(false);
        }
        let filled = self.soft(label, session.fill(element, value))?.is_some();
        if filled {
            self.reporter.info(&format!("Filled {label}"));
        }
        Ok(filled)
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub(crate) fn css_all(selectors: &[&str]) -> Vec<Locator> {
    selectors.iter().map(|s| Locator::css(s)).collect()
}

/// Saves a screenshot of the current page under `dir`. A failed capture is reported as
/// a warning and yields no artifact.
pub(crate) fn capture_screenshot(
    session: &mut dyn BrowserSession,
    dir: &Path,
    file_name: &str,
    reporter: &dyn StatusReporter,
) -> Option<PathBuf> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        reporter.warning(&format!(
            "Could not create artifacts directory {}: {e}",
            dir.display()
        ));
        return None;
    }
    let path = dir.join(file_name);
    match session.screenshot(&path) {
        Ok(()) => {
            reporter.image(&path);
            Some(path)
        }
        Err(e) => {
            reporter.warning(&format!("Could not capture diagnostic screenshot: {e}"));
            None
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handler trait and dispatch
// ────────────────────────────────────────────────────────────────────────────

pub trait PortalHandler: Sync {
    fn kind(&self) -> PortalKind;

    /// Runs the portal choreography. Returns `Err` only for terminal steps.
    fn drive(
        &self,
        session: &mut dyn BrowserSession,
        attempt: &mut Attempt<'_>,
    ) -> Result<(), HandlerError>;

    /// Drives the portal and applies the shared failure policy. Never closes the session.
    fn attempt(
        &self,
        session: &mut dyn BrowserSession,
        packet: &ApplicationPacket,
        reporter: &dyn StatusReporter,
        config: &AutomationConfig,
    ) -> AutomationOutcome {
        let kind = self.kind();
        reporter.info(&format!("Starting {kind} application flow"));
        let mut attempt = Attempt::new(packet, reporter, &config.waits);

        match self.drive(session, &mut attempt) {
            Ok(()) => {
                let warnings = attempt.into_warnings();
                let message = if warnings.is_empty() {
                    format!("{kind} form prepared; review it and submit manually")
                } else {
                    format!(
                        "{kind} form partly prepared ({} item(s) need attention); \
                         review it and submit manually",
                        warnings.len()
                    )
                };
                reporter.success(&message);
                AutomationOutcome::prepared(kind, message, warnings)
            }
            Err(HandlerError::Browser(BrowserError::SessionClosed)) => {
                let message = format!("{kind} automation stopped: the browser window was closed");
                reporter.error(&message, None);
                AutomationOutcome::failed(kind, OutcomeKind::SessionClosed, message)
                    .with_warnings(attempt.into_warnings())
            }
            Err(e) => {
                let artifact = capture_screenshot(
                    session,
                    &config.artifacts_dir,
                    kind.error_artifact(),
                    reporter,
                );
                let message =
                    format!("{kind} automation stopped; continue in the open browser window");
                reporter.error(&message, Some(&e.to_string()));
                AutomationOutcome::failed(
                    kind,
                    OutcomeKind::HandlerFailed,
                    format!("{message}: {e}"),
                )
                .with_artifact(artifact)
                .with_warnings(attempt.into_warnings())
            }
        }
    }
}

/// Maps a portal kind onto its handler. The mapping is fixed; the kind is decided once
/// per attempt by `classify`.
pub fn handler_for(kind: PortalKind) -> &'static dyn PortalHandler {
    match kind {
        PortalKind::Workday => &WorkdayHandler,
        PortalKind::Greenhouse => &GreenhouseHandler,
        PortalKind::Lever => &LeverHandler,
        PortalKind::Generic => &GenericHandler,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::report::RecordingReporter;
    use crate::automation::testing::{fast_config, packet_for, FakeElement, FakeSession};

    #[test]
    fn test_handler_for_covers_every_kind() {
        for kind in [
            PortalKind::Workday,
            PortalKind::Greenhouse,
            PortalKind::Lever,
            PortalKind::Generic,
        ] {
            assert_eq!(handler_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_fill_if_empty_keeps_prefilled_value() {
        let mut session = FakeSession::new();
        let email = session.add(FakeElement::new("#email").value("parsed@example.com"));
        let reporter = RecordingReporter::new();
        let config = fast_config();
        let packet = packet_for("/tmp/resume.pdf");
        let mut attempt = Attempt::new(&packet, &reporter, &config.waits);

        let filled = attempt
            .fill_if_empty(&mut session, &[Locator::css("#email")], "me@example.com", "email")
            .unwrap();

        assert!(!filled);
        assert_eq!(session.calls.fill, 0);
        assert_eq!(session.value_of(email), "parsed@example.com");
        assert!(attempt.warnings().is_empty());
    }

    #[test]
    fn test_fill_if_empty_warns_when_field_missing() {
        let mut session = FakeSession::new();
        let reporter = RecordingReporter::new();
        let config = fast_config();
        let packet = packet_for("/tmp/resume.pdf");
        let mut attempt = Attempt::new(&packet, &reporter, &config.waits);

        let filled = attempt
            .fill_if_empty(&mut session, &[Locator::css("#phone")], "555", "phone")
            .unwrap();

        assert!(!filled);
        assert_eq!(attempt.warnings().len(), 1);
        assert_eq!(reporter.count_warnings(), 1);
    }

    #[test]
    fn test_soft_keeps_closed_session_terminal() {
        let reporter = RecordingReporter::new();
        let config = fast_config();
        let packet = packet_for("/tmp/resume.pdf");
        let mut attempt = Attempt::new(&packet, &reporter, &config.waits);

        let soft: Result<Option<()>, _> =
            attempt.soft("click", Err(BrowserError::command("click", "not clickable")));
        assert!(matches!(soft, Ok(None)));

        let hard: Result<Option<()>, _> = attempt.soft("click", Err(BrowserError::SessionClosed));
        assert!(matches!(
            hard,
            Err(HandlerError::Browser(BrowserError::SessionClosed))
        ));
    }

    #[test]
    fn test_failed_attempt_screenshots_fixed_artifact_and_keeps_session_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fast_config();
        config.artifacts_dir = dir.path().join("artifacts");
        let mut session = FakeSession::new();
        let reporter = RecordingReporter::new();
        let packet = packet_for("/tmp/resume.pdf");

        let outcome = LeverHandler.attempt(&mut session, &packet, &reporter, &config);

        assert!(!outcome.succeeded);
        assert_eq!(outcome.kind, OutcomeKind::HandlerFailed);
        let artifact = config.artifacts_dir.join("lever_error.png");
        assert_eq!(outcome.diagnostic_artifact_path.as_deref(), Some(artifact.as_path()));
        assert!(artifact.exists());
        assert_eq!(reporter.count_errors(), 1);
        assert_eq!(session.calls.close, 0);
        assert!(!session.is_closed());
    }

    #[test]
    fn test_closed_window_ends_attempt_as_session_closed() {
        let mut session = FakeSession::new();
        session.close().unwrap();
        let reporter = RecordingReporter::new();
        let packet = packet_for("/tmp/resume.pdf");

        let outcome = GreenhouseHandler.attempt(&mut session, &packet, &reporter, &fast_config());

        assert!(!outcome.succeeded);
        assert_eq!(outcome.kind, OutcomeKind::SessionClosed);
        assert!(outcome.diagnostic_artifact_path.is_none());
        assert_eq!(session.calls.screenshot, 0);
    }
}
