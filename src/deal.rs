//! Deals and the fixed pipeline stages they move through.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::contact::ContactId;
use crate::error::ValidationError;

/// Probability assigned to a new deal when none is supplied.
pub const DEFAULT_PROBABILITY: u8 = 25;

/// Stable deal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealId(u64);

impl DealId {
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

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DealId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// A step in the sales pipeline.
///
/// The order of [`DealStage::ALL`] is the pipeline order. Any deal may be
/// moved to any stage; no transition rules are enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStage {
    #[default]
    Discovery,
    Qualified,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl DealStage {
    /// All stages in pipeline order.
    pub const ALL: [Self; 6] = [
        Self::Discovery,
        Self::Qualified,
        Self::Proposal,
        Self::Negotiation,
        Self::ClosedWon,
        Self::ClosedLost,
    ];

    /// Wire identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Qualified => "qualified",
            Self::Proposal => "proposal",
            Self::Negotiation => "negotiation",
            Self::ClosedWon => "closed_won",
            Self::ClosedLost => "closed_lost",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Discovery => "Discovery",
            Self::Qualified => "Qualified",
            Self::Proposal => "Proposal",
            Self::Negotiation => "Negotiation",
            Self::ClosedWon => "Closed Won",
            Self::ClosedLost => "Closed Lost",
        }
    }

    /// One-line description shown on the board.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Discovery => "Initial contact and qualification",
            Self::Qualified => "Lead is qualified and interested",
            Self::Proposal => "Proposal sent to prospect",
            Self::Negotiation => "Terms and pricing negotiation",
            Self::ClosedWon => "Deal successfully closed",
            Self::ClosedLost => "Deal lost to competitor or cancelled",
        }
    }

    /// Zero-based position in the pipeline.
    #[must_use]
    pub const fn position(self) -> usize {
        self as usize
    }

    /// The stage after this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Discovery => Some(Self::Qualified),
            Self::Qualified => Some(Self::Proposal),
            Self::Proposal => Some(Self::Negotiation),
            Self::Negotiation => Some(Self::ClosedWon),
            Self::ClosedWon => Some(Self::ClosedLost),
            Self::ClosedLost => None,
        }
    }

    /// True for the two closed stages.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::ClosedWon | Self::ClosedLost)
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealStage {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidChoice {
                field: "stage".to_string(),
                value: s.to_string(),
            })
    }
}

/// A deal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub title: String,
    /// Owning contact. Not checked for existence by the store.
    pub contact_id: Option<ContactId>,
    /// Monetary value, non-negative.
    pub value: f64,
    pub stage: DealStage,
    /// Win probability in percent (0-100).
    pub probability: u8,
    pub expected_close_date: Option<NaiveDate>,
    pub assignee: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    /// Builds a new deal from a patch, filling absent fields with defaults.
    ///
    /// Stage defaults to [`DealStage::Discovery`], probability to
    /// [`DEFAULT_PROBABILITY`].
    #[must_use]
    pub fn from_patch(id: DealId, now: DateTime<Utc>, patch: DealPatch) -> Self {
        Self {
            id,
            title: patch.title.unwrap_or_default(),
            contact_id: patch.contact_id.flatten(),
            value: patch.value.unwrap_or(0.0),
            stage: patch.stage.unwrap_or_default(),
            probability: patch.probability.unwrap_or(DEFAULT_PROBABILITY),
            expected_close_date: patch.expected_close_date.flatten(),
            assignee: patch.assignee.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Shallow-merges `patch` into this deal. Absent fields are untouched.
    pub fn apply(&mut self, patch: DealPatch, now: DateTime<Utc>) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.contact_id {
            self.contact_id = v;
        }
        if let Some(v) = patch.value {
            self.value = v;
        }
        if let Some(v) = patch.stage {
            self.stage = v;
        }
        if let Some(v) = patch.probability {
            self.probability = v;
        }
        if let Some(v) = patch.expected_close_date {
            self.expected_close_date = v;
        }
        if let Some(v) = patch.assignee {
            self.assignee = v;
        }
        self.updated_at = now;
    }

    /// Probability-weighted value.
    #[must_use]
    pub fn weighted_value(&self) -> f64 {
        self.value * f64::from(self.probability) / 100.0
    }
}

/// Partial deal used for create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        deserialize_with = "crate::record::nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_id: Option<Option<ContactId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<DealStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<u8>,
    #[serde(
        deserialize_with = "crate::record::nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_close_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

impl DealPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, v: impl Into<String>) -> Self {
        self.title = Some(v.into());
        self
    }

    #[must_use]
    pub fn contact(mut self, id: ContactId) -> Self {
        self.contact_id = Some(Some(id));
        self
    }

    /// Detaches the deal from its contact.
    #[must_use]
    pub fn clear_contact(mut self) -> Self {
        self.contact_id = Some(None);
        self
    }

    #[must_use]
    pub fn value(mut self, v: f64) -> Self {
        self.value = Some(v);
        self
    }

    #[must_use]
    pub fn stage(mut self, v: DealStage) -> Self {
        self.stage = Some(v);
        self
    }

    #[must_use]
    pub fn probability(mut self, v: u8) -> Self {
        self.probability = Some(v);
        self
    }

    #[must_use]
    pub fn expected_close_date(mut self, v: NaiveDate) -> Self {
        self.expected_close_date = Some(Some(v));
        self
    }

    #[must_use]
    pub fn assignee(mut self, v: impl Into<String>) -> Self {
        self.assignee = Some(v.into());
        self
    }

    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_and_metadata() {
        assert_eq!(DealStage::ALL.len(), 6);
        for (idx, stage) in DealStage::ALL.into_iter().enumerate() {
            assert_eq!(stage.position(), idx);
        }
        assert_eq!(DealStage::ClosedWon.name(), "Closed Won");
        assert_eq!(DealStage::Negotiation.next(), Some(DealStage::ClosedWon));
        assert_eq!(DealStage::ClosedLost.next(), None);
        assert!(DealStage::ClosedLost.is_closed());
        assert!(!DealStage::Proposal.is_closed());
    }

    #[test]
    fn test_stage_parse_and_serde() {
        assert_eq!("closed_won".parse::<DealStage>().unwrap(), DealStage::ClosedWon);
        assert!("prospecting".parse::<DealStage>().is_err());
        let json = serde_json::to_string(&DealStage::ClosedLost).unwrap();
        assert_eq!(json, "\"closed_lost\"");
    }

    #[test]
    fn test_from_patch_defaults() {
        let deal = Deal::from_patch(DealId::new(1), Utc::now(), DealPatch::new().title("Renewal"));
        assert_eq!(deal.stage, DealStage::Discovery);
        assert_eq!(deal.probability, DEFAULT_PROBABILITY);
        assert!(deal.contact_id.is_none());
        assert!(deal.value.abs() < f64::EPSILON);
    }

    #[test]
    fn test_apply_stage_only() {
        let now = Utc::now();
        let mut deal = Deal::from_patch(
            DealId::new(1),
            now,
            DealPatch::new().title("Renewal").value(1200.0).contact(ContactId::new(9)),
        );
        let before = deal.clone();
        deal.apply(DealPatch::new().stage(DealStage::Negotiation), now);

        assert_eq!(deal.stage, DealStage::Negotiation);
        assert_eq!(deal.title, before.title);
        assert_eq!(deal.contact_id, before.contact_id);
        assert!((deal.value - before.value).abs() < f64::EPSILON);
    }

    #[test]
    fn test_patch_can_clear_contact() {
        let now = Utc::now();
        let mut deal = Deal::from_patch(DealId::new(1), now, DealPatch::new().contact(ContactId::new(2)));
        deal.apply(DealPatch::new().clear_contact(), now);
        assert!(deal.contact_id.is_none());

        let patch: DealPatch = serde_json::from_str(r#"{"contact_id":null}"#).unwrap();
        assert_eq!(patch.contact_id, Some(None));
    }

    #[test]
    fn test_weighted_value() {
        let deal = Deal::from_patch(
            DealId::new(1),
            Utc::now(),
            DealPatch::new().value(1000.0).probability(40),
        );
        assert!((deal.weighted_value() - 400.0).abs() < 1e-9);
    }
}
