// Application automation: portal detection, per-portal form choreography, routing.
// Everything here is synchronous and blocking. One attempt drives one browser session
// at a time; hosts that accept concurrent requests must serialize access to the session.

pub mod handlers;
pub mod outcome;
pub mod portal;
pub mod report;
pub mod router;
pub mod session;
pub mod wait;
pub mod webdriver;

#[cfg(test)]
pub(crate) mod testing;

use std::path::PathBuf;

pub use handlers::ApplicationPacket;
pub use outcome::{AutomationOutcome, OutcomeKind};
pub use report::{RecordingReporter, ReportEvent, StatusReporter};
pub use router::ApplicationRouter;
pub use session::{BrowserError, BrowserLauncher, BrowserSession};
pub use wait::WaitPolicy;
pub use webdriver::{BrowserConfig, WebDriverLauncher};

/// Artifact written when a failure escapes every handler.
pub const CRITICAL_ARTIFACT: &str = "critical_error.png";

/// Settings shared by the router and every portal handler.
#[derive(Debug, Clone)]
pub struct AutomationConfig {
    pub waits: WaitPolicy,
    /// Directory receiving the fixed-name diagnostic screenshots.
    pub artifacts_dir: PathBuf,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            waits: WaitPolicy::default(),
            artifacts_dir: PathBuf::from("artifacts"),
        }
    }
}
