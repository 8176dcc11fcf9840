//! Scripted in-memory browser used by the automation tests.
//!
//! A page is a flat list of `FakeElement`s. An element matches a locator when the
//! locator's selector text is one of the element's registered selectors. Time is the
//! number of `find_all` calls made so far, which lets tests make elements show up
//! "later" without sleeping.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::handlers::{ApplicationPacket, ContactDetails};
use super::session::{BrowserError, BrowserSession, ElementRef, Locator};
use super::wait::WaitPolicy;
use super::AutomationConfig;

/// Selector registered on every form field so the generic scan can see it.
pub const ANY_FIELD: &str = super::handlers::generic::FORM_FIELDS;
const TEXT_AREA: &str = super::handlers::generic::TEXT_AREAS;

/// Millisecond waits so timeouts in tests resolve quickly.
pub fn fast_config() -> AutomationConfig {
    AutomationConfig {
        waits: WaitPolicy {
            element_timeout: Duration::from_millis(20),
            upload_timeout: Duration::from_millis(20),
            poll_interval: Duration::from_millis(1),
        },
        artifacts_dir: std::env::temp_dir().join("job-agent-test-artifacts"),
    }
}

pub fn packet_for(resume_path: impl Into<PathBuf>) -> ApplicationPacket {
    ApplicationPacket {
        resume_path: resume_path.into(),
        applicant: ContactDetails {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+44 20 7946 0000".to_string(),
        },
        application_text: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Main,
    Frame,
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub selectors: Vec<String>,
    pub attrs: HashMap<String, String>,
    pub value: String,
    pub scope: Scope,
    /// Visible once more than this many `find_all` calls have happened.
    pub appears_after: u64,
    pub interactable_after: u64,
    pub enabled: bool,
    pub revealed_by: Option<ElementRef>,
}

impl FakeElement {
    pub fn new(selector: &str) -> Self {
        Self {
            selectors: vec![selector.to_string()],
            attrs: HashMap::new(),
            value: String::new(),
            scope: Scope::Main,
            appears_after: 0,
            interactable_after: 0,
            enabled: true,
            revealed_by: None,
        }
    }

    pub fn frame(selector: &str) -> Self {
        Self::new(selector)
    }

    /// A form field visible to the generic attribute scan.
    pub fn field(attrs: &[(&str, &str)]) -> Self {
        let mut element = Self::new(ANY_FIELD);
        for (k, v) in attrs {
            element.attrs.insert(k.to_string(), v.to_string());
        }
        element
    }

    /// A multi-line form field.
    pub fn text_area(attrs: &[(&str, &str)]) -> Self {
        Self::field(attrs).also(TEXT_AREA)
    }

    pub fn also(mut self, selector: &str) -> Self {
        self.selectors.push(selector.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn in_frame(mut self) -> Self {
        self.scope = Scope::Frame;
        self
    }

    pub fn appears_after(mut self, polls: u64) -> Self {
        self.appears_after = polls;
        self
    }

    pub fn interactable_after(mut self, polls: u64) -> Self {
        self.interactable_after = polls;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn revealed_by(mut self, trigger: ElementRef) -> Self {
        self.revealed_by = Some(trigger);
        self
    }
}

#[derive(Debug, Default, Clone)]
pub struct CallCounts {
    pub navigate: u32,
    pub find_all: u64,
    pub click: u32,
    pub fill: u32,
    pub upload: u32,
    pub enter_frame: u32,
    pub exit_to_parent: u32,
    pub screenshot: u32,
    pub close: u32,
}

#[derive(Debug, Default)]
pub struct FakeSession {
    pub elements: Vec<FakeElement>,
    pub calls: CallCounts,
    pub navigated: Vec<String>,
    pub clicked: Vec<ElementRef>,
    pub filled: Vec<(ElementRef, String)>,
    pub uploaded: Vec<(ElementRef, PathBuf)>,
    pub screenshots: Vec<PathBuf>,
    pub fail_navigation: bool,
    pub fail_frame_switch: bool,
    pub fail_upload: bool,
    pub panic_on_find: bool,
    frame_depth: u32,
    closed: bool,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, element: FakeElement) -> ElementRef {
        self.elements.push(element);
        ElementRef(self.elements.len() - 1)
    }

    pub fn in_frame(&self) -> bool {
        self.frame_depth > 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn value_of(&self, element: ElementRef) -> &str {
        &self.elements[element.0].value
    }

    fn visible(&self, index: usize) -> bool {
        let element = &self.elements[index];
        let scope = if self.in_frame() {
            Scope::Frame
        } else {
            Scope::Main
        };
        let revealed = element
            .revealed_by
            .map(|trigger| self.clicked.contains(&trigger))
            .unwrap_or(true);
        element.scope == scope && revealed && self.calls.find_all > element.appears_after
    }

    fn check_open(&self) -> Result<(), BrowserError> {
        if self.closed {
            Err(BrowserError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn element(&self, element: ElementRef) -> Result<&FakeElement, BrowserError> {
        self.elements
            .get(element.0)
            .ok_or_else(|| BrowserError::command("lookup", "stale element"))
    }
}

impl BrowserSession for FakeSession {
    fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.check_open()?;
        self.calls.navigate += 1;
        if self.fail_navigation {
            return Err(BrowserError::command("navigate", "net::ERR_NAME_NOT_RESOLVED"));
        }
        self.navigated.push(url.to_string());
        Ok(())
    }

    fn find_all(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, BrowserError> {
        self.check_open()?;
        if self.panic_on_find {
            panic!("driver crashed");
        }
        self.calls.find_all += 1;
        let wanted = match locator {
            Locator::Css(s) | Locator::XPath(s) => s.as_str(),
        };
        Ok((0..self.elements.len())
            .filter(|&i| self.elements[i].selectors.iter().any(|s| s == wanted))
            .filter(|&i| self.visible(i))
            .map(ElementRef)
            .collect())
    }

    fn is_interactable(&mut self, element: ElementRef) -> Result<bool, BrowserError> {
        self.check_open()?;
        let el = self.element(element)?;
        Ok(el.enabled && self.calls.find_all > el.interactable_after)
    }

    fn attribute(
        &mut self,
        element: ElementRef,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        self.check_open()?;
        Ok(self.element(element)?.attrs.get(name).cloned())
    }

    fn value(&mut self, element: ElementRef) -> Result<String, BrowserError> {
        self.check_open()?;
        Ok(self.element(element)?.value.clone())
    }

    fn click(&mut self, element: ElementRef) -> Result<(), BrowserError> {
        self.check_open()?;
        self.element(element)?;
        self.calls.click += 1;
        self.clicked.push(element);
        Ok(())
    }

    fn fill(&mut self, element: ElementRef, text: &str) -> Result<(), BrowserError> {
        self.check_open()?;
        self.element(element)?;
        self.calls.fill += 1;
        self.elements[element.0].value = text.to_string();
        self.filled.push((element, text.to_string()));
        Ok(())
    }

    fn upload(&mut self, element: ElementRef, file: &Path) -> Result<(), BrowserError> {
        self.check_open()?;
        self.element(element)?;
        self.calls.upload += 1;
        if self.fail_upload {
            return Err(BrowserError::command("upload", "file input rejected the file"));
        }
        self.elements[element.0].value = file.display().to_string();
        self.uploaded.push((element, file.to_path_buf()));
        Ok(())
    }

    fn enter_frame(&mut self, frame: ElementRef) -> Result<(), BrowserError> {
        self.check_open()?;
        self.element(frame)?;
        self.calls.enter_frame += 1;
        if self.fail_frame_switch {
            return Err(BrowserError::command("enter frame", "no such frame"));
        }
        self.frame_depth += 1;
        Ok(())
    }

    fn exit_to_parent(&mut self) -> Result<(), BrowserError> {
        self.check_open()?;
        self.calls.exit_to_parent += 1;
        self.frame_depth = self.frame_depth.saturating_sub(1);
        Ok(())
    }

    fn screenshot(&mut self, path: &Path) -> Result<(), BrowserError> {
        self.check_open()?;
        self.calls.screenshot += 1;
        std::fs::write(path, b"fake-png")
            .map_err(|e| BrowserError::command("screenshot", e.to_string()))?;
        self.screenshots.push(path.to_path_buf());
        Ok(())
    }

    fn close(&mut self) -> Result<(), BrowserError> {
        self.check_open()?;
        self.calls.close += 1;
        self.closed = true;
        Ok(())
    }
}
