//! `BrowserSession` over a WebDriver endpoint (chromedriver by default).
//!
//! `thirtyfour` is async; the automation core is blocking. Every command is driven to
//! completion with the runtime handle captured at launch, so a `WebDriverSession` must
//! be used from a blocking thread (`tokio::task::spawn_blocking`), never from inside an
//! async task.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thirtyfour::prelude::*;
use thirtyfour::ChromiumLikeCapabilities;
use tokio::runtime::Handle;
use tracing::{info, warn};

use super::session::{BrowserError, BrowserLauncher, BrowserSession, ElementRef, Locator};

/// Browser launch options. Passed in explicitly; nothing is read from globals.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    /// Chrome user-data directory, e.g. to reuse logged-in portal sessions.
    pub profile_directory: Option<PathBuf>,
    pub extra_arguments: Vec<String>,
    pub webdriver_url: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            profile_directory: None,
            extra_arguments: Vec::new(),
            webdriver_url: "http://localhost:9515".to_string(),
        }
    }
}

impl BrowserConfig {
    /// Command-line arguments handed to the browser, in order.
    pub fn arguments(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "--start-maximized",
            "--disable-dev-shm-usage",
            "--no-sandbox",
            "--disable-gpu",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if let Some(profile) = &self.profile_directory {
            args.push(format!("--user-data-dir={}", profile.display()));
        }
        args.extend(self.extra_arguments.iter().cloned());
        args
    }
}

pub struct WebDriverSession {
    handle: Handle,
    driver: Option<WebDriver>,
    /// Elements handed out as `ElementRef` indices. Reset whenever the active
    /// document changes, so every lookup after a frame switch starts from zero.
    elements: Vec<WebElement>,
}

impl WebDriverSession {
    /// Starts a browser through the WebDriver server at `config.webdriver_url`.
    pub async fn launch(config: &BrowserConfig) -> Result<Self, BrowserError> {
        let mut caps = DesiredCapabilities::chrome();
        for arg in config.arguments() {
            caps.add_arg(&arg)
                .map_err(|e| BrowserError::Launch(format!("invalid argument {arg}: {e}")))?;
        }

        let driver = WebDriver::new(config.webdriver_url.as_str(), caps)
            .await
            .map_err(|e| {
                BrowserError::Launch(format!(
                    "could not reach WebDriver at {} (is chromedriver running?): {e}",
                    config.webdriver_url
                ))
            })?;
        info!(
            webdriver = %config.webdriver_url,
            headless = config.headless,
            "Browser session started"
        );

        Ok(Self {
            handle: Handle::current(),
            driver: Some(driver),
            elements: Vec::new(),
        })
    }

    /// `launch` for callers already on a blocking thread.
    pub fn launch_blocking(handle: &Handle, config: &BrowserConfig) -> Result<Self, BrowserError> {
        handle.block_on(Self::launch(config))
    }

    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.driver.is_some()
    }

    fn driver(&self) -> Result<&WebDriver, BrowserError> {
        self.driver.as_ref().ok_or(BrowserError::SessionClosed)
    }

    fn element(&self, element: ElementRef) -> Result<&WebElement, BrowserError> {
        self.driver()?;
        self.elements
            .get(element.0)
            .ok_or_else(|| BrowserError::command("lookup", "stale element reference"))
    }

    fn run<T>(
        &self,
        action: &'static str,
        command: impl Future<Output = WebDriverResult<T>>,
    ) -> Result<T, BrowserError> {
        self.handle
            .block_on(command)
            .map_err(|e| browser_error(action, e))
    }
}

/// A vanished window or a dead session id means the user closed the browser.
fn browser_error(action: &'static str, error: WebDriverError) -> BrowserError {
    match error {
        WebDriverError::NoSuchWindow(_) | WebDriverError::InvalidSessionId(_) => {
            warn!(action, "Browser window is gone");
            BrowserError::SessionClosed
        }
        other => BrowserError::command(action, other.to_string()),
    }
}

/// Launches `WebDriverSession`s from a blocking thread.
pub struct WebDriverLauncher {
    handle: Handle,
    config: BrowserConfig,
}

impl WebDriverLauncher {
    /// Captures the current runtime; call from inside it.
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            handle: Handle::current(),
            config,
        }
    }
}

impl BrowserLauncher for WebDriverLauncher {
    fn launch(&self) -> Result<Box<dyn BrowserSession + Send>, BrowserError> {
        let session = WebDriverSession::launch_blocking(&self.handle, &self.config)?;
        Ok(Box::new(session))
    }
}

impl BrowserSession for WebDriverSession {
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let driver = self.driver()?;
        self.run("navigate", driver.goto(url))?;
        self.elements.clear();
        Ok(())
    }

    fn find_all(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, BrowserError> {
        let driver = self.driver()?;
        let by = match locator {
            Locator::Css(selector) => By::Css(selector.as_str()),
            Locator::XPath(expr) => By::XPath(expr.as_str()),
        };
        let found = self.run("find elements", driver.find_all(by))?;
        let start = self.elements.len();
        self.elements.extend(found);
        Ok((start..self.elements.len()).map(ElementRef).collect())
    }

    fn is_interactable(&mut self, element: ElementRef) -> Result<bool, BrowserError> {
        let el = self.element(element)?;
        if !self.run("check visibility", el.is_displayed())? {
            return Ok(false);
        }
        self.run("check enabled", el.is_enabled())
    }

    fn attribute(
        &mut self,
        element: ElementRef,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let el = self.element(element)?;
        self.run("read attribute", el.attr(name))
    }

    fn value(&mut self, element: ElementRef) -> Result<String, BrowserError> {
        let el = self.element(element)?;
        Ok(self.run("read value", el.value())?.unwrap_or_default())
    }

    fn click(&mut self, element: ElementRef) -> Result<(), BrowserError> {
        let el = self.element(element)?;
        self.run("click", el.click())
    }

    fn fill(&mut self, element: ElementRef, text: &str) -> Result<(), BrowserError> {
        let el = self.element(element)?;
        self.run("clear field", el.clear())?;
        self.run("type into field", el.send_keys(text))
    }

    fn upload(&mut self, element: ElementRef, file: &Path) -> Result<(), BrowserError> {
        // The browser resolves the path on its own side; relative paths would not survive.
        let absolute = std::fs::canonicalize(file)
            .map_err(|e| BrowserError::command("upload", format!("{}: {e}", file.display())))?;
        let el = self.element(element)?;
        self.run("upload", el.send_keys(absolute.display().to_string()))
    }

    fn enter_frame(&mut self, frame: ElementRef) -> Result<(), BrowserError> {
        let el = self.element(frame)?.clone();
        self.run("enter frame", el.enter_frame())?;
        self.elements.clear();
        Ok(())
    }

    fn exit_to_parent(&mut self) -> Result<(), BrowserError> {
        let driver = self.driver()?;
        self.run("leave frame", driver.enter_parent_frame())?;
        self.elements.clear();
        Ok(())
    }

    fn screenshot(&mut self, path: &Path) -> Result<(), BrowserError> {
        let driver = self.driver()?;
        self.run("screenshot", driver.screenshot(path))
    }

    fn close(&mut self) -> Result<(), BrowserError> {
        self.elements.clear();
        match self.driver.take() {
            Some(driver) => {
                info!("Closing browser session");
                self.handle
                    .block_on(driver.quit())
                    .map_err(|e| browser_error("quit", e))
            }
            None => {
                warn!("Browser session already closed");
                Ok(())
            }
        }
    }
}

// No Drop impl: `WebDriver::quit` consumes the driver, and an open window is exactly what
// the human needs after an attempt. Hosts close the session explicitly.
