use super::{css_all, Attempt, HandlerError, PortalHandler};
use crate::automation::portal::PortalKind;
use crate::automation::session::{BrowserSession, FrameScope, Locator};
use crate::automation::wait::Condition;

const FORM_FRAMES: &[&str] = &["iframe#grnhse_iframe", "iframe[src*='greenhouse']"];
const ATTACH_BUTTON: &[&str] = &["button[data-source='attach']"];
const RESUME_INPUTS: &[&str] = &["#resume_fieldset input[type='file']", "input[type='file']"];
const UPLOAD_CONFIRMATION: &[&str] = &["#resume_filename", ".chosen-file"];
const COVER_LETTER: &str = "#cover_letter_text";

/// Greenhouse: the form is often embedded in an iframe on the company's own site.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreenhouseHandler;

impl PortalHandler for GreenhouseHandler {
    fn kind(&self) -> PortalKind {
        PortalKind::Greenhouse
    }

    fn drive(
        &self,
        session: &mut dyn BrowserSession,
        attempt: &mut Attempt<'_>,
    ) -> Result<(), HandlerError> {
        let frame = attempt.find(session, &css_all(FORM_FRAMES), Condition::Present)?;
        if frame.is_none() {
            attempt
                .reporter
                .info("No embedded Greenhouse frame; using the page itself");
        }

        // Parent context is restored when the scope drops, on every path out of here.
        let mut scope = FrameScope::enter(session, frame);
        fill_form(&mut *scope, attempt)
    }
}

fn fill_form(
    session: &mut dyn BrowserSession,
    attempt: &mut Attempt<'_>,
) -> Result<(), HandlerError> {
    attempt.click_if_present(
        session,
        &css_all(ATTACH_BUTTON),
        "No Attach button found; looking for the file input directly",
    )?;

    let input = attempt
        .find(session, &css_all(RESUME_INPUTS), Condition::Present)?
        .ok_or(HandlerError::FileInputNotFound)?;
    attempt.upload_resume(session, input)?;

    let confirmed = attempt.find_within(
        session,
        &css_all(UPLOAD_CONFIRMATION),
        Condition::Present,
        attempt.waits.upload_timeout,
    )?;
    match confirmed {
        Some(_) => attempt.reporter.info("Greenhouse confirmed the upload"),
        None => {
            attempt.warn("Greenhouse did not show the uploaded file name; check the attachment")
        }
    }

    let packet = attempt.packet;
    let applicant = &packet.applicant;
    for (selector, value, label) in [
        ("#first_name", &applicant.first_name, "first name"),
        ("#last_name", &applicant.last_name, "last name"),
        ("#email", &applicant.email, "email"),
        ("#phone", &applicant.phone, "phone"),
    ] {
        attempt.fill_if_empty(session, &[Locator::css(selector)], value, label)?;
    }

    if let Some(text) = packet.application_text.as_deref() {
        attempt.fill_if_empty(session, &[Locator::css(COVER_LETTER)], text, "cover letter")?;
    }
    Ok(())
}
