//! Portal detection: maps a posting URL onto the closed set of supported portals.

use serde::{Deserialize, Serialize};

/// Application portal vendors with a dedicated handler, plus the generic fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalKind {
    Workday,
    Greenhouse,
    Lever,
    Generic,
}

/// Ordered (pattern, kind) pairs. Scanned top to bottom; the first pattern found in the
/// lowercased URL wins. New vendors are appended here, and a vendor whose pattern could
/// overlap an existing one must be placed above it.
pub const PORTAL_PATTERNS: &[(&str, PortalKind)] = &[
    ("workday", PortalKind::Workday),
    ("greenhouse", PortalKind::Greenhouse),
    ("lever", PortalKind::Lever),
];

impl PortalKind {
    pub fn label(&self) -> &'static str {
        match self {
            PortalKind::Workday => "workday",
            PortalKind::Greenhouse => "greenhouse",
            PortalKind::Lever => "lever",
            PortalKind::Generic => "generic",
        }
    }

    /// Fixed screenshot file name written when this portal's handler fails.
    /// Overwritten on every failure.
    pub fn error_artifact(&self) -> &'static str {
        match self {
            PortalKind::Workday => "workday_error.png",
            PortalKind::Greenhouse => "greenhouse_error.png",
            PortalKind::Lever => "lever_error.png",
            PortalKind::Generic => "generic_error.png",
        }
    }
}

impl std::fmt::Display for PortalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifies a posting URL. Pure and total: unknown or empty URLs are `Generic`.
pub fn classify(posting_url: &str) -> PortalKind {
    let url = posting_url.to_lowercase();
    PORTAL_PATTERNS
        .iter()
        .find(|(pattern, _)| url.contains(pattern))
        .map(|(_, kind)| *kind)
        .unwrap_or(PortalKind::Generic)
}
