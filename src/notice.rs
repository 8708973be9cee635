//! Transient user-visible messages for command results.

use serde::{Deserialize, Serialize};

use crate::command::CommandAction;
use crate::error::CrmResult;
use crate::record::RecordKind;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short message shown once after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Underlying error text, for failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

const fn plural(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Contact => "contacts",
        RecordKind::Deal => "deals",
        RecordKind::Activity => "activities",
    }
}

const fn verb(action: CommandAction) -> &'static str {
    match action {
        CommandAction::Create => "create",
        CommandAction::Update | CommandAction::Complete => "update",
        CommandAction::Delete => "delete",
        CommandAction::Move => "move",
    }
}

impl Notice {
    /// A success notice.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            detail: None,
        }
    }

    /// A failure notice carrying the error text.
    #[must_use]
    pub fn error(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    /// Message for the result of `action` on a `kind` record, e.g.
    /// "Deal moved successfully" or "Failed to move deal".
    #[must_use]
    pub fn from_result<T>(action: CommandAction, kind: RecordKind, result: &CrmResult<T>) -> Self {
        match result {
            Ok(_) => match action {
                CommandAction::Complete => Self::success(format!("{} marked as completed", kind.label())),
                CommandAction::Create => Self::success(format!("{} created successfully", kind.label())),
                CommandAction::Update => Self::success(format!("{} updated successfully", kind.label())),
                CommandAction::Delete => Self::success(format!("{} deleted successfully", kind.label())),
                CommandAction::Move => Self::success(format!("{} moved successfully", kind.label())),
            },
            Err(err) => Self::error(format!("Failed to {} {kind}", verb(action)), err.to_string()),
        }
    }

    /// Message for a failed initial load of a collection.
    #[must_use]
    pub fn load_failed(kind: RecordKind, detail: impl Into<String>) -> Self {
        Self::error(format!("Failed to load {}", plural(kind)), detail)
    }

    /// Returns true for failure notices.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}
