use super::{css_all, Attempt, HandlerError, PortalHandler};
use crate::automation::portal::PortalKind;
use crate::automation::session::{BrowserSession, Locator};
use crate::automation::wait::Condition;

const RESUME_INPUT: &str = "input[name='resume']";
const FILENAME_MARKERS: &[&str] = &[".filename", ".resume-upload-filename"];
const TEXT_FIELDS: &[(&str, &str)] = &[
    ("input[name='name']", "name"),
    ("input[name='email']", "email"),
    ("input[name='phone']", "phone"),
    ("textarea[name='comments']", "additional information"),
];

/// Lever: a plain form with a named resume input. Text fields are located but left for
/// the applicant; Lever re-fills several of them from the parsed resume after upload.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeverHandler;

impl PortalHandler for LeverHandler {
    fn kind(&self) -> PortalKind {
        PortalKind::Lever
    }

    fn drive(
        &self,
        session: &mut dyn BrowserSession,
        attempt: &mut Attempt<'_>,
    ) -> Result<(), HandlerError> {
        let input = attempt
            .find(session, &[Locator::css(RESUME_INPUT)], Condition::Present)?
            .ok_or(HandlerError::FileInputNotFound)?;
        attempt.upload_resume(session, input)?;

        let marker = attempt.find_within(
            session,
            &css_all(FILENAME_MARKERS),
            Condition::Present,
            attempt.waits.upload_timeout,
        )?;
        match marker {
            Some(_) => attempt.reporter.info("Lever shows the uploaded file name"),
            None => attempt.warn("Lever did not show the uploaded file name; check the attachment"),
        }

        // TODO: fill these once there is a decision on overwriting Lever's own parse.
        let mut located = Vec::new();
        for (selector, label) in TEXT_FIELDS {
            if attempt
                .find(session, &[Locator::css(selector)], Condition::Present)?
                .is_some()
            {
                located.push(*label);
            }
        }
        if !located.is_empty() {
            attempt.reporter.info(&format!(
                "Left for manual completion: {}",
                located.join(", ")
            ));
        }
        Ok(())
    }
}
