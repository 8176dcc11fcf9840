use std::path::PathBuf;

use serde::Serialize;

use super::portal::PortalKind;

/// Why an attempt ended where it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Resume attached (possibly with warnings); the form awaits the human.
    Prepared,
    MissingUrl,
    MissingResume,
    MissingSession,
    NavigationFailed,
    /// The browser window went away; the host may relaunch and try again.
    SessionClosed,
    /// The portal handler hit a terminal step.
    HandlerFailed,
    /// Something escaped the handler boundary and was caught by the router.
    Crashed,
}

/// Result of one automation attempt. Never persisted by the core; the caller decides
/// what to record.
#[derive(Debug, Clone, Serialize)]
pub struct AutomationOutcome {
    pub portal_kind: PortalKind,
    pub kind: OutcomeKind,
    pub succeeded: bool,
    pub diagnostic_artifact_path: Option<PathBuf>,
    pub message: String,
    pub warnings: Vec<String>,
}

impl AutomationOutcome {
    pub fn prepared(
        portal_kind: PortalKind,
        message: impl Into<String>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            portal_kind,
            kind: OutcomeKind::Prepared,
            succeeded: true,
            diagnostic_artifact_path: None,
            message: message.into(),
            warnings,
        }
    }

    pub fn failed(
        portal_kind: PortalKind,
        kind: OutcomeKind,
        message: impl Into<String>,
    ) -> Self {
        debug_assert!(kind != OutcomeKind::Prepared);
        Self {
            portal_kind,
            kind,
            succeeded: false,
            diagnostic_artifact_path: None,
            message: message.into(),
            warnings: Vec::new(),
        }
    }

    pub fn with_artifact(mut self, path: Option<PathBuf>) -> Self {
        self.diagnostic_artifact_path = path;
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}
