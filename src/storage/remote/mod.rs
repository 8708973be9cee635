//! Remote storage backend.
//!
//! Each record kind lives in a table of the hosted record service. The
//! stores here translate between domain records and table rows
//! ([`fields`]) and delegate the round-trip to a [`RecordClient`]. They hold
//! no local state: every call is a fresh request and nothing is retried.

pub mod client;
pub mod fields;
#[cfg(feature = "remote")]
pub mod http;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::activity::{Activity, ActivityId, ActivityPatch};
use crate::contact::{Contact, ContactId, ContactPatch};
use crate::deal::{Deal, DealId, DealPatch, DealStage};
use crate::error::RemoteError;
use crate::storage::traits::{ActivityStore, ContactStore, DealStore, StoreError};

pub use client::{FetchQuery, PageInfo, RecordClient, RemoteRecord, WhereClause, WhereOperator};
#[cfg(feature = "remote")]
pub use http::HttpRecordClient;

use fields::{ACTIVITY_FIELDS, ACTIVITY_TABLE, CONTACT_FIELDS, CONTACT_TABLE, DEAL_FIELDS, DEAL_TABLE};

fn decode_all<T>(
    rows: Vec<RemoteRecord>,
    decode: impl Fn(&RemoteRecord, DateTime<Utc>) -> Result<T, RemoteError>,
    id_of: impl Fn(&T) -> u64,
) -> Result<Vec<T>, StoreError> {
    let received_at = Utc::now();
    let mut records = rows
        .iter()
        .map(|row| decode(row, received_at))
        .collect::<Result<Vec<_>, _>>()?;
    records.sort_by_key(id_of);
    Ok(records)
}

/// Contact store backed by the `contact` table.
#[derive(Clone)]
pub struct RemoteContactStore {
    client: Arc<dyn RecordClient>,
    paging: PageInfo,
}

impl RemoteContactStore {
    /// Create a store using `client` and the given fetch window.
    #[must_use]
    pub fn new(client: Arc<dyn RecordClient>, paging: PageInfo) -> Self {
        Self { client, paging }
    }
}

impl ContactStore for RemoteContactStore {
    fn list(&self) -> Result<Vec<Contact>, StoreError> {
        debug!(table = CONTACT_TABLE, limit = self.paging.limit, "fetching records");
        let rows = self
            .client
            .fetch_records(CONTACT_TABLE, &FetchQuery::new(CONTACT_FIELDS, self.paging))?;
        decode_all(rows, fields::contact_from_remote, |c| c.id.get())
    }

    fn get(&self, id: ContactId) -> Result<Contact, StoreError> {
        let row = self
            .client
            .get_record(CONTACT_TABLE, id.get(), CONTACT_FIELDS)?
            .ok_or(StoreError::ContactNotFound(id))?;
        Ok(fields::contact_from_remote(&row, Utc::now())?)
    }

    fn create(&self, patch: ContactPatch) -> Result<Contact, StoreError> {
        let now = Utc::now();
        let draft = Contact::from_patch(ContactId::new(0), now, patch);
        let row = self
            .client
            .create_record(CONTACT_TABLE, fields::contact_to_remote(&draft))?;
        Ok(fields::contact_from_remote(&row, now)?)
    }

    fn update(&self, id: ContactId, patch: ContactPatch) -> Result<Contact, StoreError> {
        let columns = fields::contact_patch_to_remote(&patch);
        if columns.is_empty() {
            return self.get(id);
        }
        let row = self
            .client
            .update_record(CONTACT_TABLE, id.get(), columns)?
            .ok_or(StoreError::ContactNotFound(id))?;
        Ok(fields::contact_from_remote(&row, Utc::now())?)
    }

    fn delete(&self, id: ContactId) -> Result<(), StoreError> {
        if self.client.delete_record(CONTACT_TABLE, id.get())? {
            Ok(())
        } else {
            Err(StoreError::ContactNotFound(id))
        }
    }
}

/// Deal store backed by the `deal` table.
#[derive(Clone)]
pub struct RemoteDealStore {
    client: Arc<dyn RecordClient>,
    paging: PageInfo,
}

impl RemoteDealStore {
    /// Create a store using `client` and the given fetch window.
    #[must_use]
    pub fn new(client: Arc<dyn RecordClient>, paging: PageInfo) -> Self {
        Self { client, paging }
    }

    fn fetch(&self, query: &FetchQuery) -> Result<Vec<Deal>, StoreError> {
        debug!(table = DEAL_TABLE, filters = query.where_clauses.len(), "fetching records");
        let rows = self.client.fetch_records(DEAL_TABLE, query)?;
        decode_all(rows, fields::deal_from_remote, |d| d.id.get())
    }
}

impl DealStore for RemoteDealStore {
    fn list(&self) -> Result<Vec<Deal>, StoreError> {
        self.fetch(&FetchQuery::new(DEAL_FIELDS, self.paging))
    }

    fn get(&self, id: DealId) -> Result<Deal, StoreError> {
        let row = self
            .client
            .get_record(DEAL_TABLE, id.get(), DEAL_FIELDS)?
            .ok_or(StoreError::DealNotFound(id))?;
        Ok(fields::deal_from_remote(&row, Utc::now())?)
    }

    fn create(&self, patch: DealPatch) -> Result<Deal, StoreError> {
        let now = Utc::now();
        let draft = Deal::from_patch(DealId::new(0), now, patch);
        let row = self
            .client
            .create_record(DEAL_TABLE, fields::deal_to_remote(&draft))?;
        Ok(fields::deal_from_remote(&row, now)?)
    }

    fn update(&self, id: DealId, patch: DealPatch) -> Result<Deal, StoreError> {
        let columns = fields::deal_patch_to_remote(&patch);
        if columns.is_empty() {
            return self.get(id);
        }
        let row = self
            .client
            .update_record(DEAL_TABLE, id.get(), columns)?
            .ok_or(StoreError::DealNotFound(id))?;
        Ok(fields::deal_from_remote(&row, Utc::now())?)
    }

    fn delete(&self, id: DealId) -> Result<(), StoreError> {
        if self.client.delete_record(DEAL_TABLE, id.get())? {
            Ok(())
        } else {
            Err(StoreError::DealNotFound(id))
        }
    }

    fn list_by_stage(&self, stage: DealStage) -> Result<Vec<Deal>, StoreError> {
        let query = FetchQuery::new(DEAL_FIELDS, self.paging)
            .filter(WhereClause::exact_match(fields::STAGE, stage.as_str()));
        self.fetch(&query)
    }
}

/// Activity store backed by the `Activity1` table.
#[derive(Clone)]
pub struct RemoteActivityStore {
    client: Arc<dyn RecordClient>,
    paging: PageInfo,
}

impl RemoteActivityStore {
    /// Create a store using `client` and the given fetch window.
    #[must_use]
    pub fn new(client: Arc<dyn RecordClient>, paging: PageInfo) -> Self {
        Self { client, paging }
    }

    fn fetch(&self, query: &FetchQuery) -> Result<Vec<Activity>, StoreError> {
        debug!(table = ACTIVITY_TABLE, filters = query.where_clauses.len(), "fetching records");
        let rows = self.client.fetch_records(ACTIVITY_TABLE, query)?;
        decode_all(rows, fields::activity_from_remote, |a| a.id.get())
    }
}

impl ActivityStore for RemoteActivityStore {
    fn list(&self) -> Result<Vec<Activity>, StoreError> {
        self.fetch(&FetchQuery::new(ACTIVITY_FIELDS, self.paging))
    }

    fn get(&self, id: ActivityId) -> Result<Activity, StoreError> {
        let row = self
            .client
            .get_record(ACTIVITY_TABLE, id.get(), ACTIVITY_FIELDS)?
            .ok_or(StoreError::ActivityNotFound(id))?;
        Ok(fields::activity_from_remote(&row, Utc::now())?)
    }

    fn create(&self, patch: ActivityPatch) -> Result<Activity, StoreError> {
        let now = Utc::now();
        let draft = Activity::from_patch(ActivityId::new(0), now, patch);
        let row = self
            .client
            .create_record(ACTIVITY_TABLE, fields::activity_to_remote(&draft))?;
        Ok(fields::activity_from_remote(&row, now)?)
    }

    fn update(&self, id: ActivityId, patch: ActivityPatch) -> Result<Activity, StoreError> {
        let columns = fields::activity_patch_to_remote(&patch);
        if columns.is_empty() {
            return self.get(id);
        }
        let row = self
            .client
            .update_record(ACTIVITY_TABLE, id.get(), columns)?
            .ok_or(StoreError::ActivityNotFound(id))?;
        Ok(fields::activity_from_remote(&row, Utc::now())?)
    }

    fn delete(&self, id: ActivityId) -> Result<(), StoreError> {
        if self.client.delete_record(ACTIVITY_TABLE, id.get())? {
            Ok(())
        } else {
            Err(StoreError::ActivityNotFound(id))
        }
    }

    fn list_by_contact(&self, contact_id: ContactId) -> Result<Vec<Activity>, StoreError> {
        let query = FetchQuery::new(ACTIVITY_FIELDS, self.paging)
            .filter(WhereClause::equal_to(fields::CONTACT_ID, contact_id.get()));
        self.fetch(&query)
    }
}

/// Convenience bundle of the three remote stores sharing one client.
#[derive(Clone)]
pub struct RemoteStores {
    /// Contact store.
    pub contacts: RemoteContactStore,
    /// Deal store.
    pub deals: RemoteDealStore,
    /// Activity store.
    pub activities: RemoteActivityStore,
}

impl RemoteStores {
    /// Stores sharing `client`, fetching with `paging`.
    #[must_use]
    pub fn new(client: Arc<dyn RecordClient>, paging: PageInfo) -> Self {
        Self {
            contacts: RemoteContactStore::new(Arc::clone(&client), paging),
            deals: RemoteDealStore::new(Arc::clone(&client), paging),
            activities: RemoteActivityStore::new(client, paging),
        }
    }
}
