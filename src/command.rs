//! User actions as data.
//!
//! Every create/edit/delete/move/complete action is a [`Command`]. Wrapping
//! it in a [`CommandRequest`] stamps it with a request id and issue time so
//! the log lines of one action can be correlated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::{Activity, ActivityId, ActivityPatch};
use crate::contact::{Contact, ContactId, ContactPatch};
use crate::deal::{Deal, DealId, DealPatch, DealStage};
use crate::record::RecordKind;

/// What a command does to its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    Create,
    Update,
    Delete,
    /// Move a deal to another stage.
    Move,
    /// Mark an activity completed.
    Complete,
}

/// A user action against one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "payload", rename_all = "snake_case")]
pub enum Command {
    CreateContact(ContactPatch),
    UpdateContact {
        id: ContactId,
        patch: ContactPatch,
    },
    DeleteContact(ContactId),

    CreateDeal(DealPatch),
    UpdateDeal {
        id: DealId,
        patch: DealPatch,
    },
    DeleteDeal(DealId),
    MoveDeal {
        id: DealId,
        stage: DealStage,
    },

    CreateActivity(ActivityPatch),
    UpdateActivity {
        id: ActivityId,
        patch: ActivityPatch,
    },
    DeleteActivity(ActivityId),
    CompleteActivity(ActivityId),
}

impl Command {
    /// Collection the command touches.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::CreateContact(_) | Self::UpdateContact { .. } | Self::DeleteContact(_) => {
                RecordKind::Contact
            }
            Self::CreateDeal(_) | Self::UpdateDeal { .. } | Self::DeleteDeal(_) | Self::MoveDeal { .. } => {
                RecordKind::Deal
            }
            Self::CreateActivity(_)
            | Self::UpdateActivity { .. }
            | Self::DeleteActivity(_)
            | Self::CompleteActivity(_) => RecordKind::Activity,
        }
    }

    /// What the command does.
    #[must_use]
    pub const fn action(&self) -> CommandAction {
        match self {
            Self::CreateContact(_) | Self::CreateDeal(_) | Self::CreateActivity(_) => CommandAction::Create,
            Self::UpdateContact { .. } | Self::UpdateDeal { .. } | Self::UpdateActivity { .. } => {
                CommandAction::Update
            }
            Self::DeleteContact(_) | Self::DeleteDeal(_) | Self::DeleteActivity(_) => CommandAction::Delete,
            Self::MoveDeal { .. } => CommandAction::Move,
            Self::CompleteActivity(_) => CommandAction::Complete,
        }
    }

    /// Stable name for logs, e.g. `move_deal`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateContact(_) => "create_contact",
            Self::UpdateContact { .. } => "update_contact",
            Self::DeleteContact(_) => "delete_contact",
            Self::CreateDeal(_) => "create_deal",
            Self::UpdateDeal { .. } => "update_deal",
            Self::DeleteDeal(_) => "delete_deal",
            Self::MoveDeal { .. } => "move_deal",
            Self::CreateActivity(_) => "create_activity",
            Self::UpdateActivity { .. } => "update_activity",
            Self::DeleteActivity(_) => "delete_activity",
            Self::CompleteActivity(_) => "complete_activity",
        }
    }

    /// Raw id of the addressed record; `None` for creates.
    #[must_use]
    pub const fn target(&self) -> Option<u64> {
        match self {
            Self::CreateContact(_) | Self::CreateDeal(_) | Self::CreateActivity(_) => None,
            Self::UpdateContact { id, .. } | Self::DeleteContact(id) => Some(id.get()),
            Self::UpdateDeal { id, .. } | Self::DeleteDeal(id) | Self::MoveDeal { id, .. } => Some(id.get()),
            Self::UpdateActivity { id, .. } | Self::DeleteActivity(id) | Self::CompleteActivity(id) => {
                Some(id.get())
            }
        }
    }
}

/// A command stamped for tracing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Unique identifier for this request.
    pub request_id: Uuid,
    /// When the request was issued.
    pub issued_at: DateTime<Utc>,
    pub command: Command,
}

impl CommandRequest {
    /// Wraps `command` with a fresh request id.
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            issued_at: Utc::now(),
            command,
        }
    }

    /// Sets a caller-chosen request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }
}

impl From<Command> for CommandRequest {
    fn from(command: Command) -> Self {
        Self::new(command)
    }
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum CommandOutcome {
    Contact(Contact),
    Deal(Deal),
    Activity(Activity),
    /// The record was removed.
    Deleted {
        kind: RecordKind,
        id: u64,
    },
}

impl CommandOutcome {
    /// Raw id of the record the command produced or removed.
    #[must_use]
    pub const fn record_id(&self) -> u64 {
        match self {
            Self::Contact(c) => c.id.get(),
            Self::Deal(d) => d.id.get(),
            Self::Activity(a) => a.id.get(),
            Self::Deleted { id, .. } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_metadata() {
        let cmd = Command::MoveDeal {
            id: DealId::new(7),
            stage: DealStage::Proposal,
        };
        assert_eq!(cmd.kind(), RecordKind::Deal);
        assert_eq!(cmd.action(), CommandAction::Move);
        assert_eq!(cmd.name(), "move_deal");
        assert_eq!(cmd.target(), Some(7));

        let create = Command::CreateContact(ContactPatch::new());
        assert_eq!(create.target(), None);
        assert_eq!(create.action(), CommandAction::Create);
    }

    #[test]
    fn test_command_wire_shape() {
        let cmd = Command::CompleteActivity(ActivityId::new(3));
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["op"], "complete_activity");
        assert_eq!(json["payload"], 3);

        let back: Command = serde_json::from_value(json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = CommandRequest::new(Command::DeleteDeal(DealId::new(1)));
        let b = CommandRequest::from(Command::DeleteDeal(DealId::new(1)));
        assert_ne!(a.request_id, b.request_id);

        let fixed = Uuid::new_v4();
        assert_eq!(a.with_request_id(fixed).request_id, fixed);
    }
}
