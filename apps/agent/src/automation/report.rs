//! Status reporting: how the core surfaces progress to whatever hosts it.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use tracing::{error, info, warn};

/// Progress sink implemented by the host (console, HTTP response, UI panel).
pub trait StatusReporter: Send + Sync {
    fn info(&self, message: &str);
    fn success(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str, detail: Option<&str>);
    /// A diagnostic image was written to `path`.
    fn image(&self, path: &Path);
}

/// Sends every report to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl StatusReporter for TracingReporter {
    fn info(&self, message: &str) {
        info!("{message}");
    }

    fn success(&self, message: &str) {
        info!(outcome = "success", "{message}");
    }

    fn warning(&self, message: &str) {
        warn!("{message}");
    }

    fn error(&self, message: &str, detail: Option<&str>) {
        match detail {
            Some(detail) => error!(detail, "{message}"),
            None => error!("{message}"),
        }
    }

    fn image(&self, path: &Path) {
        info!(path = %path.display(), "Diagnostic screenshot saved");
    }
}

/// A single report, as recorded by `RecordingReporter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum ReportEvent {
    Info { message: String },
    Success { message: String },
    Warning { message: String },
    Error { message: String, detail: Option<String> },
    Image { path: PathBuf },
}

/// Keeps every report in order (and forwards it to tracing) so a host can return
/// the whole transcript of an attempt.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_events(self) -> Vec<ReportEvent> {
        self.events
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    pub fn count_successes(&self) -> usize {
        self.count(|e| matches!(e, ReportEvent::Success { .. }))
    }

    #[cfg(test)]
    pub fn count_warnings(&self) -> usize {
        self.count(|e| matches!(e, ReportEvent::Warning { .. }))
    }

    #[cfg(test)]
    pub fn count_errors(&self) -> usize {
        self.count(|e| matches!(e, ReportEvent::Error { .. }))
    }

    #[cfg(test)]
    fn count(&self, predicate: impl Fn(&ReportEvent) -> bool) -> usize {
        self.lock().iter().filter(|e| predicate(e)).count()
    }

    fn push(&self, event: ReportEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ReportEvent>> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StatusReporter for RecordingReporter {
    fn info(&self, message: &str) {
        TracingReporter.info(message);
        self.push(ReportEvent::Info {
            message: message.to_string(),
        });
    }

    fn success(&self, message: &str) {
        TracingReporter.success(message);
        self.push(ReportEvent::Success {
            message: message.to_string(),
        });
    }

    fn warning(&self, message: &str) {
        TracingReporter.warning(message);
        self.push(ReportEvent::Warning {
            message: message.to_string(),
        });
    }

    fn error(&self, message: &str, detail: Option<&str>) {
        TracingReporter.error(message, detail);
        self.push(ReportEvent::Error {
            message: message.to_string(),
            detail: detail.map(str::to_string),
        });
    }

    fn image(&self, path: &Path) {
        TracingReporter.image(path);
        self.push(ReportEvent::Image {
            path: path.to_path_buf(),
        });
    }
}
