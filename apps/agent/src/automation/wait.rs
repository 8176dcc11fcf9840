//! Bounded waits: poll the live page until an element is ready or a deadline passes.

use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::session::{BrowserError, BrowserSession, ElementRef, Locator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Present,
    /// Present, displayed and enabled.
    Interactable,
}

/// Timeouts applied to element lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Default bound for locating controls.
    pub element_timeout: Duration,
    /// Bound for post-upload confirmation (the portal parses the file first).
    pub upload_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            element_timeout: Duration::from_secs(15),
            upload_timeout: Duration::from_secs(20),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// An element found by `wait_for_any`, with the index of the locator that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Found {
    pub element: ElementRef,
    pub locator_index: usize,
}

/// Polls `locators` in order until one yields an element meeting `condition`.
///
/// Returns `Ok(None)` once `timeout` has elapsed. Command errors during a poll are
/// treated as "not ready yet"; only a closed session aborts the wait.
pub fn wait_for_any(
    session: &mut dyn BrowserSession,
    locators: &[Locator],
    condition: Condition,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Option<Found>, BrowserError> {
    let deadline = Instant::now() + timeout;
    loop {
        for (locator_index, locator) in locators.iter().enumerate() {
            if let Some(element) = ready_element(session, locator, condition)? {
                return Ok(Some(Found {
                    element,
                    locator_index,
                }));
            }
        }
        if Instant::now() >= deadline {
            debug!("Gave up waiting after {:?} for {:?}", timeout, locators);
            return Ok(None);
        }
        thread::sleep(poll_interval);
    }
}

fn ready_element(
    session: &mut dyn BrowserSession,
    locator: &Locator,
    condition: Condition,
) -> Result<Option<ElementRef>, BrowserError> {
    let candidates = match session.find_all(locator) {
        Ok(found) => found,
        Err(BrowserError::SessionClosed) => return Err(BrowserError::SessionClosed),
        Err(e) => {
            debug!("Lookup of {locator} failed, retrying: {e}");
            return Ok(None);
        }
    };
    for element in candidates {
        match condition {
            Condition::Present => return Ok(Some(element)),
            Condition::Interactable => match session.is_interactable(element) {
                Ok(true) => return Ok(Some(element)),
                Ok(false) => {}
                Err(BrowserError::SessionClosed) => return Err(BrowserError::SessionClosed),
                Err(e) => debug!("Interactability check on {locator} failed: {e}"),
            },
        }
    }
    Ok(None)
}
