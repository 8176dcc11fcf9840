use std::time::Duration;

use super::{css_all, Attempt, HandlerError, PortalHandler};
use crate::automation::portal::PortalKind;
use crate::automation::session::{BrowserSession, Locator};
use crate::automation::wait::Condition;

const APPLY_BUTTONS: &[&str] = &[
    "a[data-automation-id='adventureButton']",
    "[data-automation-id='adventureButton']",
];
const AUTOFILL_BUTTON: &str = "[data-automation-id='autofillWithResume']";
const AUTOFILL_BUTTON_TEXT: &str = "//a[contains(., 'Autofill with Resume')]";
const RESUME_INPUTS: &[&str] = &[
    "input[type='file'][data-automation-id='file-upload-input-ref']",
    "input[type='file']",
];
const LOGIN_WALL: &[&str] = &["[data-automation-id='signInContent']", "input[type='password']"];
const NEXT_BUTTON: &[&str] = &[
    "[data-automation-id='bottom-navigation-next-button']",
    "button[data-automation-id='pageFooterNextButton']",
];

/// Workday: open the application, pick "Autofill with Resume", upload, then wait for the
/// portal to finish parsing. Later pages are left to the human.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkdayHandler;

impl PortalHandler for WorkdayHandler {
    fn kind(&self) -> PortalKind {
        PortalKind::Workday
    }

    fn drive(
        &self,
        session: &mut dyn BrowserSession,
        attempt: &mut Attempt<'_>,
    ) -> Result<(), HandlerError> {
        if attempt.click_if_present(
            session,
            &css_all(APPLY_BUTTONS),
            "No Apply button found; assuming the application form is already open",
        )? {
            attempt.reporter.info("Opened the Workday application");
        }

        let autofill = [Locator::css(AUTOFILL_BUTTON), Locator::xpath(AUTOFILL_BUTTON_TEXT)];
        if attempt.click_if_present(
            session,
            &autofill,
            "No \"Autofill with Resume\" option; looking for the upload control directly",
        )? {
            attempt.reporter.info("Selected \"Autofill with Resume\"");
        }

        let Some(input) = attempt.find(session, &css_all(RESUME_INPUTS), Condition::Present)? else {
            // One scan is enough: the page has settled by now.
            if attempt
                .find_within(session, &css_all(LOGIN_WALL), Condition::Present, Duration::ZERO)?
                .is_some()
            {
                return Err(HandlerError::LoginWall);
            }
            return Err(HandlerError::FileInputNotFound);
        };
        attempt.upload_resume(session, input)?;

        let parsed = attempt.find_within(
            session,
            &css_all(NEXT_BUTTON),
            Condition::Interactable,
            attempt.waits.upload_timeout,
        )?;
        match parsed {
            Some(_) => attempt
                .reporter
                .info("Workday parsed the resume; check the pre-filled fields and continue"),
            None => attempt.warn(
                "Workday did not signal that the resume was parsed; check the form before continuing",
            ),
        }
        Ok(())
    }
}
