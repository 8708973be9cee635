//! Contacts: the people and companies the sales team works with.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Stable contact identifier.
///
/// Assigned by the store on create and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(u64);

impl ContactId {
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

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ContactId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Relationship status of a contact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    #[default]
    Prospect,
    Lead,
    Active,
    Customer,
}

impl ContactStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 4] = [Self::Prospect, Self::Lead, Self::Active, Self::Customer];

    /// Wire identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prospect => "prospect",
            Self::Lead => "lead",
            Self::Active => "active",
            Self::Customer => "customer",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidChoice {
                field: "status".to_string(),
                value: s.to_string(),
            })
    }
}

/// Where a contact came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactSource {
    #[default]
    Website,
    Referral,
    Linkedin,
    ColdCall,
    TradeShow,
}

impl ContactSource {
    /// All sources in display order.
    pub const ALL: [Self; 5] = [
        Self::Website,
        Self::Referral,
        Self::Linkedin,
        Self::ColdCall,
        Self::TradeShow,
    ];

    /// Wire identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Referral => "referral",
            Self::Linkedin => "linkedin",
            Self::ColdCall => "cold_call",
            Self::TradeShow => "trade_show",
        }
    }
}

impl fmt::Display for ContactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidChoice {
                field: "source".to_string(),
                value: s.to_string(),
            })
    }
}

/// A contact record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub position: String,
    pub status: ContactStatus,
    pub source: ContactSource,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Builds a new contact from a patch, filling absent fields with defaults.
    #[must_use]
    pub fn from_patch(id: ContactId, now: DateTime<Utc>, patch: ContactPatch) -> Self {
        Self {
            id,
            first_name: patch.first_name.unwrap_or_default(),
            last_name: patch.last_name.unwrap_or_default(),
            email: patch.email.unwrap_or_default(),
            phone: patch.phone.unwrap_or_default(),
            company: patch.company.unwrap_or_default(),
            position: patch.position.unwrap_or_default(),
            status: patch.status.unwrap_or_default(),
            source: patch.source.unwrap_or_default(),
            tags: patch.tags.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Shallow-merges `patch` into this contact. Absent fields are untouched.
    pub fn apply(&mut self, patch: ContactPatch, now: DateTime<Utc>) {
        if let Some(v) = patch.first_name {
            self.first_name = v;
        }
        if let Some(v) = patch.last_name {
            self.last_name = v;
        }
        if let Some(v) = patch.email {
            self.email = v;
        }
        if let Some(v) = patch.phone {
            self.phone = v;
        }
        if let Some(v) = patch.company {
            self.company = v;
        }
        if let Some(v) = patch.position {
            self.position = v;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = patch.source {
            self.source = v;
        }
        if let Some(v) = patch.tags {
            self.tags = v;
        }
        self.updated_at = now;
    }

    /// "First Last", trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Case-insensitive substring match on name, email and company.
    ///
    /// The query is used as typed; an empty query matches every contact.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.first_name, &self.last_name, &self.email, &self.company]
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Partial contact used for create and update.
///
/// Every `Some` field is written; `None` fields are left alone (update) or
/// defaulted (create).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContactStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ContactSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
}

impl ContactPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn first_name(mut self, v: impl Into<String>) -> Self {
        self.first_name = Some(v.into());
        self
    }

    #[must_use]
    pub fn last_name(mut self, v: impl Into<String>) -> Self {
        self.last_name = Some(v.into());
        self
    }

    #[must_use]
    pub fn email(mut self, v: impl Into<String>) -> Self {
        self.email = Some(v.into());
        self
    }

    #[must_use]
    pub fn phone(mut self, v: impl Into<String>) -> Self {
        self.phone = Some(v.into());
        self
    }

    #[must_use]
    pub fn company(mut self, v: impl Into<String>) -> Self {
        self.company = Some(v.into());
        self
    }

    #[must_use]
    pub fn position(mut self, v: impl Into<String>) -> Self {
        self.position = Some(v.into());
        self
    }

    #[must_use]
    pub fn status(mut self, v: ContactStatus) -> Self {
        self.status = Some(v);
        self
    }

    #[must_use]
    pub fn source(mut self, v: ContactSource) -> Self {
        self.source = Some(v);
        self
    }

    /// Replaces the whole tag set.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
