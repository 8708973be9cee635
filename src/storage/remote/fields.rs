//! Field mapping between records and the record service's flat tables.
//!
//! The service names columns differently from the domain types
//! (`title` for a contact's position, `Owner` for an assignee, `Tags` as a
//! comma-joined string, ...). Everything here is a pure renaming layer; no
//! I/O happens in this module.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

use crate::activity::{Activity, ActivityId, ActivityPatch, ActivityType};
use crate::contact::{Contact, ContactId, ContactPatch, ContactSource, ContactStatus};
use crate::deal::{Deal, DealId, DealPatch, DealStage, DEFAULT_PROBABILITY};
use crate::error::RemoteError;
use crate::storage::remote::client::RemoteRecord;

/// Table holding contacts.
pub const CONTACT_TABLE: &str = "contact";
/// Table holding deals.
pub const DEAL_TABLE: &str = "deal";
/// Table holding activities.
pub const ACTIVITY_TABLE: &str = "Activity1";

/// Record id column.
pub const ID: &str = "Id";
const NAME: &str = "Name";
const TAGS: &str = "Tags";
const OWNER: &str = "Owner";
const CREATED_ON: &str = "CreatedOn";
const MODIFIED_ON: &str = "ModifiedOn";

/// Column holding a deal's stage.
pub const STAGE: &str = "stage";
/// Column linking deals and activities to a contact.
pub const CONTACT_ID: &str = "contact_id";

/// Projection requested for contacts.
pub const CONTACT_FIELDS: &[&str] = &[
    ID,
    NAME,
    TAGS,
    CREATED_ON,
    MODIFIED_ON,
    "first_name",
    "last_name",
    "email",
    "phone",
    "company",
    "title",
    "status",
    "source",
];

/// Projection requested for deals.
pub const DEAL_FIELDS: &[&str] = &[
    ID,
    NAME,
    OWNER,
    CREATED_ON,
    MODIFIED_ON,
    "title",
    "value",
    STAGE,
    "probability",
    "close_date",
    CONTACT_ID,
];

/// Projection requested for activities.
pub const ACTIVITY_FIELDS: &[&str] = &[
    ID,
    NAME,
    OWNER,
    CREATED_ON,
    "title",
    "type",
    "description",
    "due_date",
    "completed",
    CONTACT_ID,
];

fn malformed(table: &str, field: &str, value: &Value) -> RemoteError {
    RemoteError::DeserializationFailed {
        message: format!("unexpected value {value} for '{field}' in table '{table}'"),
    }
}

/// Reads a numeric id that may arrive as a number or a numeric string.
fn id_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        // Lookup columns may be expanded to the referenced record.
        Value::Object(o) => o.get(ID).and_then(id_value),
        _ => None,
    }
}

fn record_id(table: &str, record: &RemoteRecord) -> Result<u64, RemoteError> {
    let value = record.get(ID).unwrap_or(&Value::Null);
    id_value(value).ok_or_else(|| malformed(table, ID, value))
}

fn text(record: &RemoteRecord, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn optional_text(record: &RemoteRecord, field: &str) -> Option<String> {
    Some(text(record, field)).filter(|s| !s.is_empty())
}

fn choice<T: FromStr + Default>(
    table: &str,
    record: &RemoteRecord,
    field: &str,
) -> Result<T, RemoteError> {
    let raw = text(record, field);
    if raw.is_empty() {
        return Ok(T::default());
    }
    raw.parse()
        .map_err(|_| malformed(table, field, &Value::String(raw.clone())))
}

/// Like [`choice`], but an absent or blank value is an error.
fn required_choice<T: FromStr>(
    table: &str,
    record: &RemoteRecord,
    field: &str,
) -> Result<T, RemoteError> {
    let raw = text(record, field);
    if raw.trim().is_empty() {
        return Err(malformed(table, field, record.get(field).unwrap_or(&Value::Null)));
    }
    raw.parse()
        .map_err(|_| malformed(table, field, &Value::String(raw.clone())))
}

fn number(table: &str, record: &RemoteRecord, field: &str) -> Result<Option<f64>, RemoteError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(v @ Value::String(s)) => s.trim().parse().map(Some).map_err(|_| malformed(table, field, v)),
        Some(other) => Err(malformed(table, field, other)),
    }
}

fn flag(table: &str, record: &RemoteRecord, field: &str) -> Result<bool, RemoteError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(v @ Value::String(s)) => match s.trim() {
            "" | "false" => Ok(false),
            "true" => Ok(true),
            _ => Err(malformed(table, field, v)),
        },
        Some(other) => Err(malformed(table, field, other)),
    }
}

fn contact_ref(table: &str, record: &RemoteRecord) -> Result<Option<ContactId>, RemoteError> {
    match record.get(CONTACT_ID) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => id_value(v)
            .map(|raw| Some(ContactId::new(raw)))
            .ok_or_else(|| malformed(table, CONTACT_ID, v)),
    }
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    parse_date(raw)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn instant(
    table: &str,
    record: &RemoteRecord,
    field: &str,
    fallback: DateTime<Utc>,
) -> Result<DateTime<Utc>, RemoteError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(fallback),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(fallback),
        Some(v @ Value::String(s)) => parse_instant(s).ok_or_else(|| malformed(table, field, v)),
        Some(other) => Err(malformed(table, field, other)),
    }
}

fn join_tags(tags: &BTreeSet<String>) -> Value {
    Value::String(tags.iter().map(String::as_str).collect::<Vec<_>>().join(","))
}

fn split_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn nullable<T>(value: Option<T>, into: impl FnOnce(T) -> Value) -> Value {
    value.map_or(Value::Null, into)
}

fn date_value(date: NaiveDate) -> Value {
    Value::String(date.format("%Y-%m-%d").to_string())
}

fn instant_value(ts: DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339())
}

// --- contacts ---------------------------------------------------------------

/// Full column set for a new contact (no `Id`, no system timestamps).
#[must_use]
pub fn contact_to_remote(contact: &Contact) -> RemoteRecord {
    let mut out = Map::new();
    out.insert(NAME.into(), Value::String(contact.full_name()));
    out.insert(TAGS.into(), join_tags(&contact.tags));
    out.insert("first_name".into(), contact.first_name.clone().into());
    out.insert("last_name".into(), contact.last_name.clone().into());
    out.insert("email".into(), contact.email.clone().into());
    out.insert("phone".into(), contact.phone.clone().into());
    out.insert("company".into(), contact.company.clone().into());
    out.insert("title".into(), contact.position.clone().into());
    out.insert("status".into(), contact.status.as_str().into());
    out.insert("source".into(), contact.source.as_str().into());
    out
}

/// Columns for the fields present in `patch`.
#[must_use]
pub fn contact_patch_to_remote(patch: &ContactPatch) -> RemoteRecord {
    let mut out = Map::new();
    if let (Some(first), Some(last)) = (&patch.first_name, &patch.last_name) {
        out.insert(NAME.into(), format!("{first} {last}").trim().to_string().into());
    }
    let columns = [
        ("first_name", &patch.first_name),
        ("last_name", &patch.last_name),
        ("email", &patch.email),
        ("phone", &patch.phone),
        ("company", &patch.company),
        ("title", &patch.position),
    ];
    for (column, value) in columns {
        if let Some(v) = value {
            out.insert(column.into(), v.clone().into());
        }
    }
    if let Some(status) = patch.status {
        out.insert("status".into(), status.as_str().into());
    }
    if let Some(source) = patch.source {
        out.insert("source".into(), source.as_str().into());
    }
    if let Some(tags) = &patch.tags {
        out.insert(TAGS.into(), join_tags(tags));
    }
    out
}

/// Rebuilds a contact from a service record.
///
/// `received_at` stands in for system timestamps the service omitted.
pub fn contact_from_remote(
    record: &RemoteRecord,
    received_at: DateTime<Utc>,
) -> Result<Contact, RemoteError> {
    let t = CONTACT_TABLE;
    let created_at = instant(t, record, CREATED_ON, received_at)?;
    Ok(Contact {
        id: ContactId::new(record_id(t, record)?),
        first_name: text(record, "first_name"),
        last_name: text(record, "last_name"),
        email: text(record, "email"),
        phone: text(record, "phone"),
        company: text(record, "company"),
        position: text(record, "title"),
        status: choice::<ContactStatus>(t, record, "status")?,
        source: choice::<ContactSource>(t, record, "source")?,
        tags: split_tags(&text(record, TAGS)),
        created_at,
        updated_at: instant(t, record, MODIFIED_ON, created_at)?,
    })
}

// --- deals ------------------------------------------------------------------

/// Full column set for a new deal.
#[must_use]
pub fn deal_to_remote(deal: &Deal) -> RemoteRecord {
    let mut out = Map::new();
    out.insert(NAME.into(), deal.title.clone().into());
    out.insert(OWNER.into(), deal.assignee.clone().into());
    out.insert("title".into(), deal.title.clone().into());
    out.insert("value".into(), deal.value.into());
    out.insert(STAGE.into(), deal.stage.as_str().into());
    out.insert("probability".into(), deal.probability.into());
    out.insert("close_date".into(), nullable(deal.expected_close_date, date_value));
    out.insert(CONTACT_ID.into(), nullable(deal.contact_id, |id| id.get().into()));
    out
}

/// Columns for the fields present in `patch`. A cleared field is sent as
/// `null`.
#[must_use]
pub fn deal_patch_to_remote(patch: &DealPatch) -> RemoteRecord {
    let mut out = Map::new();
    if let Some(title) = &patch.title {
        out.insert(NAME.into(), title.clone().into());
        out.insert("title".into(), title.clone().into());
    }
    if let Some(assignee) = &patch.assignee {
        out.insert(OWNER.into(), assignee.clone().into());
    }
    if let Some(value) = patch.value {
        out.insert("value".into(), value.into());
    }
    if let Some(stage) = patch.stage {
        out.insert(STAGE.into(), stage.as_str().into());
    }
    if let Some(probability) = patch.probability {
        out.insert("probability".into(), probability.into());
    }
    if let Some(close) = patch.expected_close_date {
        out.insert("close_date".into(), nullable(close, date_value));
    }
    if let Some(contact) = patch.contact_id {
        out.insert(CONTACT_ID.into(), nullable(contact, |id| id.get().into()));
    }
    out
}

/// Rebuilds a deal from a service record.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn deal_from_remote(record: &RemoteRecord, received_at: DateTime<Utc>) -> Result<Deal, RemoteError> {
    let t = DEAL_TABLE;
    let created_at = instant(t, record, CREATED_ON, received_at)?;
    let probability = match number(t, record, "probability")? {
        None => DEFAULT_PROBABILITY,
        Some(p) if (0.0..=100.0).contains(&p) => p.round() as u8,
        Some(p) => return Err(malformed(t, "probability", &Value::from(p))),
    };
    let close_raw = text(record, "close_date");
    let expected_close_date = if close_raw.trim().is_empty() {
        None
    } else {
        Some(parse_date(&close_raw).ok_or_else(|| malformed(t, "close_date", &Value::String(close_raw.clone())))?)
    };
    Ok(Deal {
        id: DealId::new(record_id(t, record)?),
        title: optional_text(record, "title").unwrap_or_else(|| text(record, NAME)),
        contact_id: contact_ref(t, record)?,
        value: number(t, record, "value")?.unwrap_or(0.0),
        stage: required_choice::<DealStage>(t, record, STAGE)?,
        probability,
        expected_close_date,
        assignee: text(record, OWNER),
        created_at,
        updated_at: instant(t, record, MODIFIED_ON, created_at)?,
    })
}

// --- activities -------------------------------------------------------------

/// Full column set for a new activity.
#[must_use]
pub fn activity_to_remote(activity: &Activity) -> RemoteRecord {
    let mut out = Map::new();
    out.insert(NAME.into(), activity.subject.clone().into());
    out.insert(OWNER.into(), activity.assignee.clone().into());
    out.insert("title".into(), activity.subject.clone().into());
    out.insert("type".into(), activity.kind.as_str().into());
    out.insert(
        "description".into(),
        nullable(activity.description.clone(), Value::String),
    );
    out.insert("due_date".into(), instant_value(activity.due_at));
    out.insert("completed".into(), activity.completed.into());
    out.insert(
        CONTACT_ID.into(),
        nullable(activity.contact_id, |id| id.get().into()),
    );
    out
}

/// Columns for the fields present in `patch`.
///
/// `completed` is only ever sent as `true`; the flag cannot be reset.
#[must_use]
pub fn activity_patch_to_remote(patch: &ActivityPatch) -> RemoteRecord {
    let mut out = Map::new();
    if let Some(subject) = &patch.subject {
        out.insert(NAME.into(), subject.clone().into());
        out.insert("title".into(), subject.clone().into());
    }
    if let Some(kind) = patch.kind {
        out.insert("type".into(), kind.as_str().into());
    }
    if let Some(description) = &patch.description {
        out.insert("description".into(), nullable(description.clone(), Value::String));
    }
    if let Some(assignee) = &patch.assignee {
        out.insert(OWNER.into(), assignee.clone().into());
    }
    if let Some(due) = patch.due_at {
        out.insert("due_date".into(), instant_value(due));
    }
    if patch.completed == Some(true) {
        out.insert("completed".into(), true.into());
    }
    if let Some(contact) = patch.contact_id {
        out.insert(CONTACT_ID.into(), nullable(contact, |id| id.get().into()));
    }
    out
}

/// Rebuilds an activity from a service record.
pub fn activity_from_remote(
    record: &RemoteRecord,
    received_at: DateTime<Utc>,
) -> Result<Activity, RemoteError> {
    let t = ACTIVITY_TABLE;
    let created_at = instant(t, record, CREATED_ON, received_at)?;
    let due_raw = record.get("due_date").unwrap_or(&Value::Null);
    let due_at = match due_raw {
        Value::String(s) if !s.trim().is_empty() => {
            parse_instant(s).ok_or_else(|| malformed(t, "due_date", due_raw))?
        }
        Value::Null | Value::String(_) => return Err(malformed(t, "due_date", due_raw)),
        other => return Err(malformed(t, "due_date", other)),
    };
    Ok(Activity {
        id: ActivityId::new(record_id(t, record)?),
        kind: required_choice::<ActivityType>(t, record, "type")?,
        subject: optional_text(record, "title").unwrap_or_else(|| text(record, NAME)),
        description: optional_text(record, "description"),
        contact_id: contact_ref(t, record)?,
        assignee: text(record, OWNER),
        due_at,
        completed: flag(t, record, "completed")?,
        created_at,
    })
}
