//! Shared record plumbing: record kinds and patch (de)serialization helpers.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// The three record collections owned by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A person the sales team talks to.
    Contact,
    /// A sales opportunity moving through the pipeline.
    Deal,
    /// A scheduled task (call, meeting, ...).
    Activity,
}

impl RecordKind {
    /// Human-readable singular noun, capitalized.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Contact => "Contact",
            Self::Deal => "Deal",
            Self::Activity => "Activity",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contact => write!(f, "contact"),
            Self::Deal => write!(f, "deal"),
            Self::Activity => write!(f, "activity"),
        }
    }
}

/// Deserializes a nullable patch field.
///
/// A missing key leaves the field `None` (via `#[serde(default)]`), an
/// explicit `null` becomes `Some(None)` and clears the stored value.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "nullable")]
        note: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_distinguishes_missing_and_null() {
        let missing: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.note, None);

        let null: Probe = serde_json::from_str(r#"{"note":null}"#).unwrap();
        assert_eq!(null.note, Some(None));

        let set: Probe = serde_json::from_str(r#"{"note":"hi"}"#).unwrap();
        assert_eq!(set.note, Some(Some("hi".to_string())));
    }

    #[test]
    fn test_record_kind_display() {
        assert_eq!(RecordKind::Contact.to_string(), "contact");
        assert_eq!(RecordKind::Activity.label(), "Activity");
    }
}
