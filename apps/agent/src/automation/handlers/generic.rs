use super::{Attempt, HandlerError, PortalHandler};
use crate::automation::portal::PortalKind;
use crate::automation::session::{BrowserSession, ElementRef, Locator};
use crate::automation::wait::Condition;

/// Every input and textarea on the page.
pub const FORM_FIELDS: &str = "input, textarea";

/// Multi-line fields only; these lean towards the cover-letter role.
pub const TEXT_AREAS: &str = "textarea";

/// Attributes a page author picks for the code behind the form.
const NAMING_ATTRIBUTES: &[&str] = &["name", "id"];

/// Human-facing text. Only consulted when the naming attributes say nothing.
const PROSE_ATTRIBUTES: &[&str] = &["placeholder", "aria-label"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldRole {
    Resume,
    FirstName,
    LastName,
    Email,
    Phone,
    CoverLetter,
}

impl FieldRole {
    fn label(self) -> &'static str {
        match self {
            FieldRole::Resume => "resume",
            FieldRole::FirstName => "first name",
            FieldRole::LastName => "last name",
            FieldRole::Email => "email",
            FieldRole::Phone => "phone",
            FieldRole::CoverLetter => "cover letter",
        }
    }
}

/// Lowercased attribute text of one field, split by how much it can be trusted.
#[derive(Debug, Default)]
struct FieldHints {
    naming: String,
    input_type: String,
    prose: String,
    text_area: bool,
}

fn has_any(text: &str, fragments: &[&str]) -> bool {
    fragments.iter().any(|f| text.contains(f))
}

fn is_cover_text(text: &str) -> bool {
    has_any(text, &["cover", "comment"])
}

/// Role from `name`/`id` values, which are usually short identifiers.
fn role_from_naming(text: &str) -> Option<FieldRole> {
    if has_any(text, &["first_name", "firstname", "first-name", "fname", "given"]) {
        Some(FieldRole::FirstName)
    } else if has_any(text, &["last_name", "lastname", "last-name", "lname", "family", "surname"]) {
        Some(FieldRole::LastName)
    } else if has_any(text, &["email"]) {
        Some(FieldRole::Email)
    } else if has_any(text, &["phone"]) {
        Some(FieldRole::Phone)
    } else if is_cover_text(text) {
        Some(FieldRole::CoverLetter)
    } else {
        None
    }
}

/// Role from placeholder or label prose. Example addresses such as
/// `firstname.lastname@company.com` are common here, so email wins over names.
fn role_from_prose(text: &str) -> Option<FieldRole> {
    if text.contains('@') || has_any(text, &["email", "e-mail"]) {
        Some(FieldRole::Email)
    } else if has_any(text, &["phone", "mobile"]) {
        Some(FieldRole::Phone)
    } else if is_cover_text(text) {
        Some(FieldRole::CoverLetter)
    } else if has_any(text, &["first name", "given name"]) {
        Some(FieldRole::FirstName)
    } else if has_any(text, &["last name", "family name", "surname"]) {
        Some(FieldRole::LastName)
    } else {
        None
    }
}

/// Guesses a field's role. File inputs only ever match the resume role, the input
/// type beats any text, and textareas check for a cover letter before contact roles.
fn classify_field(hints: &FieldHints) -> Option<FieldRole> {
    if hints.input_type == "file" {
        let resume = |text: &str| has_any(text, &["resume", "cv"]);
        return (resume(&hints.naming) || resume(&hints.prose)).then_some(FieldRole::Resume);
    }
    match hints.input_type.as_str() {
        "tel" => return Some(FieldRole::Phone),
        "email" => return Some(FieldRole::Email),
        _ => {}
    }
    if hints.text_area && (is_cover_text(&hints.naming) || is_cover_text(&hints.prose)) {
        return Some(FieldRole::CoverLetter);
    }
    role_from_naming(&hints.naming).or_else(|| role_from_prose(&hints.prose))
}

/// Unknown portals: scan field attributes for keyword fragments and fill what matches.
/// Always ends as prepared; the human is expected to finish most of these forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericHandler;

impl PortalHandler for GenericHandler {
    fn kind(&self) -> PortalKind {
        PortalKind::Generic
    }

    fn drive(
        &self,
        session: &mut dyn BrowserSession,
        attempt: &mut Attempt<'_>,
    ) -> Result<(), HandlerError> {
        let fields_locator = [Locator::css(FORM_FIELDS)];
        let fields = match attempt.find(session, &fields_locator, Condition::Present)? {
            Some(_) => attempt
                .soft("scan form fields", session.find_all(&fields_locator[0]))?
                .unwrap_or_default(),
            None => Vec::new(),
        };
        let text_areas = if fields.is_empty() {
            Vec::new()
        } else {
            attempt
                .soft("scan text areas", session.find_all(&Locator::css(TEXT_AREAS)))?
                .unwrap_or_default()
        };

        let mut matched: Vec<FieldRole> = Vec::new();
        for field in fields {
            let text_area = text_areas.contains(&field);
            let Some(role) = field_role(session, attempt, field, text_area)? else {
                continue;
            };
            if matched.contains(&role) {
                continue;
            }
            matched.push(role);
            fill_role(session, attempt, field, role)?;
        }

        if matched.is_empty() {
            attempt.warn(
                "No recognizable application fields on this page; complete the form manually",
            );
        } else {
            let labels: Vec<&str> = matched.iter().map(|r| r.label()).collect();
            attempt
                .reporter
                .info(&format!("Recognized fields: {}", labels.join(", ")));
        }
        Ok(())
    }
}

fn read_attributes(
    session: &mut dyn BrowserSession,
    attempt: &mut Attempt<'_>,
    field: ElementRef,
    names: &[&str],
) -> Result<String, HandlerError> {
    let mut text = String::new();
    for name in names {
        let read = attempt.soft("read field attribute", session.attribute(field, name))?;
        if let Some(Some(value)) = read {
            text.push_str(&value.to_lowercase());
            text.push(' ');
        }
    }
    Ok(text)
}

fn field_role(
    session: &mut dyn BrowserSession,
    attempt: &mut Attempt<'_>,
    field: ElementRef,
    text_area: bool,
) -> Result<Option<FieldRole>, HandlerError> {
    let hints = FieldHints {
        naming: read_attributes(session, attempt, field, NAMING_ATTRIBUTES)?,
        input_type: read_attributes(session, attempt, field, &["type"])?
            .trim()
            .to_string(),
        prose: read_attributes(session, attempt, field, PROSE_ATTRIBUTES)?,
        text_area,
    };
    Ok(classify_field(&hints))
}

fn fill_role(
    session: &mut dyn BrowserSession,
    attempt: &mut Attempt<'_>,
    field: ElementRef,
    role: FieldRole,
) -> Result<(), HandlerError> {
    let packet = attempt.packet;
    let value = match role {
        FieldRole::Resume => {
            // Unknown forms may reject the upload; the human can attach it by hand.
            if let Err(e) = attempt.upload_resume(session, field) {
                match e {
                    HandlerError::Browser(closed) => return Err(HandlerError::Browser(closed)),
                    other => attempt.warn(format!("Could not attach the resume: {other}")),
                }
            }
            return Ok(());
        }
        FieldRole::FirstName => packet.applicant.first_name.as_str(),
        FieldRole::LastName => packet.applicant.last_name.as_str(),
        FieldRole::Email => packet.applicant.email.as_str(),
        FieldRole::Phone => packet.applicant.phone.as_str(),
        FieldRole::CoverLetter => match packet.application_text.as_deref() {
            Some(text) => text,
            None => return Ok(()),
        },
    };
    attempt.fill_element_if_empty(session, field, value, role.label())?;
    Ok(())
}
