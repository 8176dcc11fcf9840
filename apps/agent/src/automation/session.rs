//! Browser capability consumed by the automation core.
//!
//! The core never talks to a browser driver directly: it drives whatever implements
//! `BrowserSession`. `webdriver::WebDriverSession` is the production implementation;
//! tests use a scripted in-memory page.

use std::ops::{Deref, DerefMut};
use std::path::Path;

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser session is closed")]
    SessionClosed,

    #[error("{action} failed: {message}")]
    Command { action: &'static str, message: String },

    #[error("could not start browser: {0}")]
    Launch(String),
}

impl BrowserError {
    pub fn command(action: &'static str, message: impl Into<String>) -> Self {
        BrowserError::Command {
            action,
            message: message.into(),
        }
    }
}

/// How to find elements on the current document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: &str) -> Self {
        Locator::Css(selector.to_string())
    }

    pub fn xpath(expr: &str) -> Self {
        Locator::XPath(expr.to_string())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css `{s}`"),
            Locator::XPath(s) => write!(f, "xpath `{s}`"),
        }
    }
}

/// Opaque handle to an element found by the session. Only meaningful to the session
/// that produced it, and only until the next navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef(pub usize);

/// Opens new sessions for hosts that create the browser lazily.
pub trait BrowserLauncher: Send + Sync {
    fn launch(&self) -> Result<Box<dyn BrowserSession + Send>, BrowserError>;
}

/// One controllable browser window.
///
/// Element lookups return immediately; bounded waiting is layered on top by
/// `wait::wait_for_any`. The core never calls `close`; the session outlives every
/// attempt so a human can finish the form in the same window.
pub trait BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;
    /// All elements currently matching `locator` in the active document/frame.
    fn find_all(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, BrowserError>;
    /// Displayed and enabled.
    fn is_interactable(&mut self, element: ElementRef) -> Result<bool, BrowserError>;
    fn attribute(&mut self, element: ElementRef, name: &str)
        -> Result<Option<String>, BrowserError>;
    /// Current value of an input or textarea; empty when unset.
    fn value(&mut self, element: ElementRef) -> Result<String, BrowserError>;
    fn click(&mut self, element: ElementRef) -> Result<(), BrowserError>;
    fn fill(&mut self, element: ElementRef, text: &str) -> Result<(), BrowserError>;
    /// Hands a local file to a file input.
    fn upload(&mut self, element: ElementRef, file: &Path) -> Result<(), BrowserError>;
    fn enter_frame(&mut self, frame: ElementRef) -> Result<(), BrowserError>;
    fn exit_to_parent(&mut self) -> Result<(), BrowserError>;
    fn screenshot(&mut self, path: &Path) -> Result<(), BrowserError>;
    /// Ends the browser. Reserved for the host.
    fn close(&mut self) -> Result<(), BrowserError>;
}

/// Scoped frame context. Entering is optional (the frame may never have appeared);
/// leaving is not: dropping the scope calls `exit_to_parent` exactly once.
pub struct FrameScope<'a> {
    session: &'a mut (dyn BrowserSession + 'a),
    entered: bool,
}

impl<'a> FrameScope<'a> {
    /// Switches into `frame` when one is given. A failed switch is logged and the scope
    /// continues on the parent document.
    pub fn enter(session: &'a mut (dyn BrowserSession + 'a), frame: Option<ElementRef>) -> Self {
        let entered = match frame {
            Some(frame) => match session.enter_frame(frame) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Could not switch into frame, staying on parent document: {e}");
                    false
                }
            },
            None => false,
        };
        Self { session, entered }
    }

    pub fn entered(&self) -> bool {
        self.entered
    }
}

impl<'a> Deref for FrameScope<'a> {
    type Target = dyn BrowserSession + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.session
    }
}

impl<'a> DerefMut for FrameScope<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.session
    }
}

impl Drop for FrameScope<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.session.exit_to_parent() {
            warn!("Could not restore parent document context: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::testing::{FakeElement, FakeSession};

    #[test]
    fn test_scope_restores_parent_once_after_entering() {
        let mut session = FakeSession::new();
        let frame = session.add(FakeElement::frame("iframe#grnhse_iframe"));
        {
            let scope = FrameScope::enter(&mut session, Some(frame));
            assert!(scope.entered());
        }
        assert_eq!(session.calls.enter_frame, 1);
        assert_eq!(session.calls.exit_to_parent, 1);
        assert!(!session.in_frame());
    }

    #[test]
    fn test_scope_restores_parent_once_without_frame() {
        let mut session = FakeSession::new();
        {
            let scope = FrameScope::enter(&mut session, None);
            assert!(!scope.entered());
        }
        assert_eq!(session.calls.enter_frame, 0);
        assert_eq!(session.calls.exit_to_parent, 1);
    }

    #[test]
    fn test_scope_restores_parent_when_switch_fails() {
        let mut session = FakeSession::new();
        let frame = session.add(FakeElement::frame("iframe#grnhse_iframe"));
        session.fail_frame_switch = true;
        {
            let scope = FrameScope::enter(&mut session, Some(frame));
            assert!(!scope.entered());
        }
        assert_eq!(session.calls.exit_to_parent, 1);
    }

    #[test]
    fn test_scope_derefs_to_session() {
        let mut session = FakeSession::new();
        {
            let mut scope = FrameScope::enter(&mut session, None);
            scope.navigate("https://example.com").unwrap();
        }
        assert_eq!(session.calls.navigate, 1);
    }

    #[test]
    fn test_locator_display() {
        assert_eq!(Locator::css("#resume").to_string(), "css `#resume`");
        assert_eq!(Locator::xpath("//a").to_string(), "xpath `//a`");
    }
}
