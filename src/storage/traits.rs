//! Abstract storage traits for dealflow.
//!
//! These traits define the contract every backend implements. The engine
//! only ever talks to `Arc<dyn ...Store>`, so the in-memory mock store and
//! the remote record-service store are interchangeable.

use thiserror::Error;

use crate::activity::{Activity, ActivityId, ActivityPatch};
use crate::contact::{Contact, ContactId, ContactPatch};
use crate::deal::{Deal, DealId, DealPatch, DealStage};
use crate::error::RemoteError;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Contact not found.
    #[error("Contact not found: {0}")]
    ContactNotFound(ContactId),

    /// Deal not found.
    #[error("Deal not found: {0}")]
    DealNotFound(DealId),

    /// Activity not found.
    #[error("Activity not found: {0}")]
    ActivityNotFound(ActivityId),

    /// Local backend failure (e.g. a poisoned lock).
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Seed data could not be loaded.
    #[error("Fixture error: {0}")]
    Fixture(String),

    /// The remote record service failed.
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}

impl StoreError {
    /// Returns true if the error names a missing record.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ContactNotFound(_) | Self::DealNotFound(_) | Self::ActivityNotFound(_)
        )
    }
}

/// Storage trait for contacts.
///
/// All mutations are single-record atomic. There is no version check:
/// the last write wins.
pub trait ContactStore: Send + Sync {
    /// Snapshot of every contact, ordered by id.
    fn list(&self) -> Result<Vec<Contact>, StoreError>;

    /// Get a contact by id. Returns `ContactNotFound` if absent.
    fn get(&self, id: ContactId) -> Result<Contact, StoreError>;

    /// Create a contact from a partial record. The store assigns the id and
    /// timestamps and defaults the absent fields.
    fn create(&self, patch: ContactPatch) -> Result<Contact, StoreError>;

    /// Shallow-merge `patch` into an existing contact.
    fn update(&self, id: ContactId, patch: ContactPatch) -> Result<Contact, StoreError>;

    /// Delete a contact. Deals and activities pointing at it are left alone.
    fn delete(&self, id: ContactId) -> Result<(), StoreError>;

    /// Case-insensitive substring search over name, email and company.
    fn search(&self, query: &str) -> Result<Vec<Contact>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|contact| contact.matches(query))
            .collect())
    }
}

/// Storage trait for deals.
pub trait DealStore: Send + Sync {
    /// Snapshot of every deal, ordered by id.
    fn list(&self) -> Result<Vec<Deal>, StoreError>;

    /// Get a deal by id. Returns `DealNotFound` if absent.
    fn get(&self, id: DealId) -> Result<Deal, StoreError>;

    /// Create a deal. Stage defaults to discovery.
    fn create(&self, patch: DealPatch) -> Result<Deal, StoreError>;

    /// Shallow-merge `patch` into an existing deal.
    fn update(&self, id: DealId, patch: DealPatch) -> Result<Deal, StoreError>;

    /// Delete a deal.
    fn delete(&self, id: DealId) -> Result<(), StoreError>;

    /// Move a deal to `stage`. Any stage may follow any other.
    fn update_stage(&self, id: DealId, stage: DealStage) -> Result<Deal, StoreError> {
        self.update(id, DealPatch::new().stage(stage))
    }

    /// Deals currently in `stage`.
    fn list_by_stage(&self, stage: DealStage) -> Result<Vec<Deal>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|deal| deal.stage == stage)
            .collect())
    }
}

/// Storage trait for activities.
pub trait ActivityStore: Send + Sync {
    /// Snapshot of every activity, ordered by id.
    fn list(&self) -> Result<Vec<Activity>, StoreError>;

    /// Get an activity by id. Returns `ActivityNotFound` if absent.
    fn get(&self, id: ActivityId) -> Result<Activity, StoreError>;

    /// Create an activity.
    fn create(&self, patch: ActivityPatch) -> Result<Activity, StoreError>;

    /// Shallow-merge `patch` into an existing activity.
    fn update(&self, id: ActivityId, patch: ActivityPatch) -> Result<Activity, StoreError>;

    /// Delete an activity.
    fn delete(&self, id: ActivityId) -> Result<(), StoreError>;

    /// Mark an activity completed. Idempotent.
    fn mark_completed(&self, id: ActivityId) -> Result<Activity, StoreError> {
        self.update(id, ActivityPatch::new().completed(true))
    }

    /// Activities linked to `contact_id`.
    fn list_by_contact(&self, contact_id: ContactId) -> Result<Vec<Activity>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|activity| activity.contact_id == Some(contact_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure traits are object-safe
    fn _assert_contact_store_object_safe(_: &dyn ContactStore) {}
    fn _assert_deal_store_object_safe(_: &dyn DealStore) {}
    fn _assert_activity_store_object_safe(_: &dyn ActivityStore) {}

    #[test]
    fn test_store_error_display() {
        let err = StoreError::DealNotFound(DealId::new(42));
        assert!(err.to_string().contains("Deal not found: 42"));
        assert!(err.is_not_found());

        let err = StoreError::BackendError("poisoned lock".to_string());
        assert!(err.to_string().contains("poisoned lock"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_remote_error_converts() {
        let err: StoreError = RemoteError::ConnectionFailed {
            message: "refused".to_string(),
        }
        .into();
        assert!(matches!(err, StoreError::Remote(_)));
    }
}
