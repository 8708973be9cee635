//! Input checks applied before a command reaches a store.
//!
//! Drafts (create) must carry every required field. Patches (update) are
//! checked only on the fields they carry, but a present required field may
//! not be blank or cleared.

use std::sync::OnceLock;

use regex::Regex;

use crate::activity::ActivityPatch;
use crate::contact::ContactPatch;
use crate::deal::DealPatch;
use crate::error::ValidationError;

/// Highest allowed win probability.
pub const MAX_PROBABILITY: u8 = 100;

fn email_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

/// `local@domain.tld` with no whitespace.
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    email_pattern().is_some_and(|re| re.is_match(value))
}

fn missing(field: &str) -> ValidationError {
    ValidationError::MissingField {
        field: field.to_string(),
    }
}

fn non_blank(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(missing(field))
    } else {
        Ok(())
    }
}

fn required(field: &str, value: Option<&String>) -> Result<(), ValidationError> {
    value.map_or_else(|| Err(missing(field)), |v| non_blank(field, v))
}

fn present(field: &str, value: Option<&String>) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| non_blank(field, v))
}

fn email(value: &str) -> Result<(), ValidationError> {
    if is_valid_email(value.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail {
            value: value.to_string(),
        })
    }
}

fn deal_value(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            field: "value".to_string(),
            value,
        });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue {
            field: "value".to_string(),
            value,
        });
    }
    Ok(())
}

fn probability(value: u8) -> Result<(), ValidationError> {
    if value > MAX_PROBABILITY {
        return Err(ValidationError::OutOfRange {
            field: "probability".to_string(),
            value: f64::from(value),
            min: 0.0,
            max: f64::from(MAX_PROBABILITY),
        });
    }
    Ok(())
}

/// A new contact needs both names, a valid email, phone, company and
/// position.
pub fn validate_contact_draft(draft: &ContactPatch) -> Result<(), ValidationError> {
    required("first_name", draft.first_name.as_ref())?;
    required("last_name", draft.last_name.as_ref())?;
    required("email", draft.email.as_ref())?;
    required("phone", draft.phone.as_ref())?;
    required("company", draft.company.as_ref())?;
    required("position", draft.position.as_ref())?;
    validate_contact_patch(draft)
}

/// Checks the fields present in a contact update.
pub fn validate_contact_patch(patch: &ContactPatch) -> Result<(), ValidationError> {
    present("first_name", patch.first_name.as_ref())?;
    present("last_name", patch.last_name.as_ref())?;
    present("phone", patch.phone.as_ref())?;
    present("company", patch.company.as_ref())?;
    present("position", patch.position.as_ref())?;
    if let Some(value) = &patch.email {
        email(value)?;
    }
    Ok(())
}

/// A new deal needs a title, a contact, a non-negative value, a
/// probability in 0-100, an expected close date and an assignee.
pub fn validate_deal_draft(draft: &DealPatch) -> Result<(), ValidationError> {
    required("title", draft.title.as_ref())?;
    if draft.contact_id.flatten().is_none() {
        return Err(missing("contact_id"));
    }
    if draft.value.is_none() {
        return Err(missing("value"));
    }
    if draft.expected_close_date.flatten().is_none() {
        return Err(missing("expected_close_date"));
    }
    required("assignee", draft.assignee.as_ref())?;
    validate_deal_patch(draft)
}

/// Checks the fields present in a deal update.
pub fn validate_deal_patch(patch: &DealPatch) -> Result<(), ValidationError> {
    present("title", patch.title.as_ref())?;
    present("assignee", patch.assignee.as_ref())?;
    if patch.contact_id == Some(None) {
        return Err(missing("contact_id"));
    }
    if let Some(value) = patch.value {
        deal_value(value)?;
    }
    if let Some(value) = patch.probability {
        probability(value)?;
    }
    Ok(())
}

/// A new activity needs a subject, a contact and an assignee. Type and due
/// time have defaults.
pub fn validate_activity_draft(draft: &ActivityPatch) -> Result<(), ValidationError> {
    required("subject", draft.subject.as_ref())?;
    if draft.contact_id.flatten().is_none() {
        return Err(missing("contact_id"));
    }
    required("assignee", draft.assignee.as_ref())?;
    validate_activity_patch(draft)
}

/// Checks the fields present in an activity update.
pub fn validate_activity_patch(patch: &ActivityPatch) -> Result<(), ValidationError> {
    present("subject", patch.subject.as_ref())?;
    present("assignee", patch.assignee.as_ref())?;
    if patch.contact_id == Some(None) {
        return Err(missing("contact_id"));
    }
    Ok(())
}
