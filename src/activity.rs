//! Scheduled activities (calls, meetings, demos, ...).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::contact::ContactId;
use crate::error::ValidationError;

/// Stable activity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(u64);

impl ActivityId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ActivityId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Category of a scheduled activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[default]
    Call,
    Email,
    Meeting,
    Demo,
    Proposal,
    Presentation,
}

impl ActivityType {
    /// All types in display order.
    pub const ALL: [Self; 6] = [
        Self::Call,
        Self::Email,
        Self::Meeting,
        Self::Demo,
        Self::Proposal,
        Self::Presentation,
    ];

    /// Wire identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Email => "email",
            Self::Meeting => "meeting",
            Self::Demo => "demo",
            Self::Proposal => "proposal",
            Self::Presentation => "presentation",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Call => "Phone Call",
            Self::Email => "Email",
            Self::Meeting => "Meeting",
            Self::Demo => "Demo",
            Self::Proposal => "Proposal",
            Self::Presentation => "Presentation",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidChoice {
                field: "type".to_string(),
                value: s.to_string(),
            })
    }
}

/// An activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    pub contact_id: Option<ContactId>,
    pub assignee: String,
    pub due_at: DateTime<Utc>,
    /// Moves false to true only; there is no way back.
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    /// Builds a new activity from a patch, filling absent fields with defaults.
    ///
    /// Without a due time the activity is due one day after creation.
    #[must_use]
    pub fn from_patch(id: ActivityId, now: DateTime<Utc>, patch: ActivityPatch) -> Self {
        Self {
            id,
            kind: patch.kind.unwrap_or_default(),
            subject: patch.subject.unwrap_or_default(),
            description: patch.description.flatten(),
            contact_id: patch.contact_id.flatten(),
            assignee: patch.assignee.unwrap_or_default(),
            due_at: patch.due_at.unwrap_or(now + Duration::days(1)),
            completed: patch.completed.unwrap_or(false),
            created_at: now,
        }
    }

    /// Shallow-merges `patch` into this activity.
    ///
    /// `completed` is monotonic: a patch carrying `completed: false` does not
    /// reopen a completed activity.
    pub fn apply(&mut self, patch: ActivityPatch) {
        if let Some(v) = patch.kind {
            self.kind = v;
        }
        if let Some(v) = patch.subject {
            self.subject = v;
        }
        if let Some(v) = patch.description {
            self.description = v;
        }
        if let Some(v) = patch.contact_id {
            self.contact_id = v;
        }
        if let Some(v) = patch.assignee {
            self.assignee = v;
        }
        if let Some(v) = patch.due_at {
            self.due_at = v;
        }
        if patch.completed == Some(true) {
            self.completed = true;
        }
    }

    /// Due in the past and not completed.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_at < now && !self.completed
    }

    /// Calendar date the activity is due on (UTC).
    #[must_use]
    pub fn due_date(&self) -> NaiveDate {
        self.due_at.date_naive()
    }
}

/// Partial activity used for create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityPatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ActivityType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(
        deserialize_with = "crate::record::nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        deserialize_with = "crate::record::nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_id: Option<Option<ContactId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ActivityPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn kind(mut self, v: ActivityType) -> Self {
        self.kind = Some(v);
        self
    }

    #[must_use]
    pub fn subject(mut self, v: impl Into<String>) -> Self {
        self.subject = Some(v.into());
        self
    }

    #[must_use]
    pub fn description(mut self, v: impl Into<String>) -> Self {
        self.description = Some(Some(v.into()));
        self
    }

    #[must_use]
    pub fn contact(mut self, id: ContactId) -> Self {
        self.contact_id = Some(Some(id));
        self
    }

    #[must_use]
    pub fn assignee(mut self, v: impl Into<String>) -> Self {
        self.assignee = Some(v.into());
        self
    }

    #[must_use]
    pub fn due_at(mut self, v: DateTime<Utc>) -> Self {
        self.due_at = Some(v);
        self
    }

    #[must_use]
    pub fn completed(mut self, v: bool) -> Self {
        self.completed = Some(v);
        self
    }

    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
