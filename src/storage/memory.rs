//! In-memory storage backend.
//!
//! Thread-safe in-memory implementations of the store traits. This is the
//! mock backend: collections are seeded from fixture data, identifiers for
//! new records are derived from the creation instant, and an optional fixed
//! delay stands in for the network round-trip of the remote backend.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::activity::{Activity, ActivityId, ActivityPatch};
use crate::contact::{Contact, ContactId, ContactPatch};
use crate::deal::{Deal, DealId, DealPatch};
use crate::storage::fixtures::Fixtures;
use crate::storage::traits::{ActivityStore, ContactStore, DealStore, StoreError};

/// Delay applied per call when latency simulation is switched on.
pub const SIMULATED_LATENCY: Duration = Duration::from_millis(300);

fn lock_err(context: &'static str) -> StoreError {
    StoreError::BackendError(format!("poisoned lock: {context}"))
}

fn simulate(latency: Duration) {
    if !latency.is_zero() {
        thread::sleep(latency);
    }
}

/// One collection keyed by raw id.
///
/// Ids are handed out from the creation instant in milliseconds, bumped
/// past the last issued id so they stay unique and increasing even when two
/// records are created within the same millisecond.
#[derive(Debug)]
struct Table<R> {
    rows: BTreeMap<u64, R>,
    last_id: u64,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<R: Clone> Table<R> {
    fn seeded(records: Vec<R>, id_of: impl Fn(&R) -> u64) -> Self {
        let mut table = Self::default();
        for record in records {
            let id = id_of(&record);
            table.last_id = table.last_id.max(id);
            table.rows.insert(id, record);
        }
        table
    }

    fn next_id(&mut self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let instant = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let following = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::BackendError("id space exhausted".to_string()))?;
        let id = instant.max(following);
        if self.rows.contains_key(&id) {
            return Err(StoreError::BackendError(format!("id {id} already issued")));
        }
        self.last_id = id;
        Ok(id)
    }

    fn list(&self) -> Vec<R> {
        self.rows.values().cloned().collect()
    }

    fn get(&self, id: u64) -> Option<R> {
        self.rows.get(&id).cloned()
    }

    fn update(&mut self, id: u64, apply: impl FnOnce(&mut R)) -> Option<R> {
        let row = self.rows.get_mut(&id)?;
        apply(row);
        Some(row.clone())
    }

    fn remove(&mut self, id: u64) -> bool {
        self.rows.remove(&id).is_some()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Thread-safe in-memory contact store.
#[derive(Debug, Default)]
pub struct InMemoryContactStore {
    table: RwLock<Table<Contact>>,
    latency: Duration,
}

impl InMemoryContactStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `contacts`.
    #[must_use]
    pub fn with_records(contacts: Vec<Contact>) -> Self {
        Self {
            table: RwLock::new(Table::seeded(contacts, |c| c.id.get())),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of stored contacts.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.table.read().map_err(|_| lock_err("contact.len"))?.len())
    }

    /// Returns true if the store holds no contacts.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl ContactStore for InMemoryContactStore {
    fn list(&self) -> Result<Vec<Contact>, StoreError> {
        simulate(self.latency);
        let table = self.table.read().map_err(|_| lock_err("contact.list"))?;
        Ok(table.list())
    }

    fn get(&self, id: ContactId) -> Result<Contact, StoreError> {
        simulate(self.latency);
        let table = self.table.read().map_err(|_| lock_err("contact.get"))?;
        table.get(id.get()).ok_or(StoreError::ContactNotFound(id))
    }

    fn create(&self, patch: ContactPatch) -> Result<Contact, StoreError> {
        simulate(self.latency);
        let now = Utc::now();
        let mut table = self.table.write().map_err(|_| lock_err("contact.create"))?;
        let id = table.next_id(now)?;
        let contact = Contact::from_patch(ContactId::new(id), now, patch);
        table.rows.insert(id, contact.clone());
        Ok(contact)
    }

    fn update(&self, id: ContactId, patch: ContactPatch) -> Result<Contact, StoreError> {
        simulate(self.latency);
        let now = Utc::now();
        let mut table = self.table.write().map_err(|_| lock_err("contact.update"))?;
        table
            .update(id.get(), |contact| contact.apply(patch, now))
            .ok_or(StoreError::ContactNotFound(id))
    }

    fn delete(&self, id: ContactId) -> Result<(), StoreError> {
        simulate(self.latency);
        let mut table = self.table.write().map_err(|_| lock_err("contact.delete"))?;
        if table.remove(id.get()) {
            Ok(())
        } else {
            Err(StoreError::ContactNotFound(id))
        }
    }
}

/// Thread-safe in-memory deal store.
#[derive(Debug, Default)]
pub struct InMemoryDealStore {
    table: RwLock<Table<Deal>>,
    latency: Duration,
}

impl InMemoryDealStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `deals`.
    #[must_use]
    pub fn with_records(deals: Vec<Deal>) -> Self {
        Self {
            table: RwLock::new(Table::seeded(deals, |d| d.id.get())),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of stored deals.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.table.read().map_err(|_| lock_err("deal.len"))?.len())
    }

    /// Returns true if the store holds no deals.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl DealStore for InMemoryDealStore {
    fn list(&self) -> Result<Vec<Deal>, StoreError> {
        simulate(self.latency);
        let table = self.table.read().map_err(|_| lock_err("deal.list"))?;
        Ok(table.list())
    }

    fn get(&self, id: DealId) -> Result<Deal, StoreError> {
        simulate(self.latency);
        let table = self.table.read().map_err(|_| lock_err("deal.get"))?;
        table.get(id.get()).ok_or(StoreError::DealNotFound(id))
    }

    fn create(&self, patch: DealPatch) -> Result<Deal, StoreError> {
        simulate(self.latency);
        let now = Utc::now();
        let mut table = self.table.write().map_err(|_| lock_err("deal.create"))?;
        let id = table.next_id(now)?;
        let deal = Deal::from_patch(DealId::new(id), now, patch);
        table.rows.insert(id, deal.clone());
        Ok(deal)
    }

    fn update(&self, id: DealId, patch: DealPatch) -> Result<Deal, StoreError> {
        simulate(self.latency);
        let now = Utc::now();
        let mut table = self.table.write().map_err(|_| lock_err("deal.update"))?;
        table
            .update(id.get(), |deal| deal.apply(patch, now))
            .ok_or(StoreError::DealNotFound(id))
    }

    fn delete(&self, id: DealId) -> Result<(), StoreError> {
        simulate(self.latency);
        let mut table = self.table.write().map_err(|_| lock_err("deal.delete"))?;
        if table.remove(id.get()) {
            Ok(())
        } else {
            Err(StoreError::DealNotFound(id))
        }
    }
}

/// Thread-safe in-memory activity store.
#[derive(Debug, Default)]
pub struct InMemoryActivityStore {
    table: RwLock<Table<Activity>>,
    latency: Duration,
}

impl InMemoryActivityStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `activities`.
    #[must_use]
    pub fn with_records(activities: Vec<Activity>) -> Self {
        Self {
            table: RwLock::new(Table::seeded(activities, |a| a.id.get())),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of stored activities.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.table.read().map_err(|_| lock_err("activity.len"))?.len())
    }

    /// Returns true if the store holds no activities.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl ActivityStore for InMemoryActivityStore {
    fn list(&self) -> Result<Vec<Activity>, StoreError> {
        simulate(self.latency);
        let table = self.table.read().map_err(|_| lock_err("activity.list"))?;
        Ok(table.list())
    }

    fn get(&self, id: ActivityId) -> Result<Activity, StoreError> {
        simulate(self.latency);
        let table = self.table.read().map_err(|_| lock_err("activity.get"))?;
        table.get(id.get()).ok_or(StoreError::ActivityNotFound(id))
    }

    fn create(&self, patch: ActivityPatch) -> Result<Activity, StoreError> {
        simulate(self.latency);
        let now = Utc::now();
        let mut table = self.table.write().map_err(|_| lock_err("activity.create"))?;
        let id = table.next_id(now)?;
        let activity = Activity::from_patch(ActivityId::new(id), now, patch);
        table.rows.insert(id, activity.clone());
        Ok(activity)
    }

    fn update(&self, id: ActivityId, patch: ActivityPatch) -> Result<Activity, StoreError> {
        simulate(self.latency);
        let mut table = self.table.write().map_err(|_| lock_err("activity.update"))?;
        table
            .update(id.get(), |activity| activity.apply(patch))
            .ok_or(StoreError::ActivityNotFound(id))
    }

    fn delete(&self, id: ActivityId) -> Result<(), StoreError> {
        simulate(self.latency);
        let mut table = self.table.write().map_err(|_| lock_err("activity.delete"))?;
        if table.remove(id.get()) {
            Ok(())
        } else {
            Err(StoreError::ActivityNotFound(id))
        }
    }
}

/// Convenience bundle of the three in-memory stores.
#[derive(Debug, Default)]
pub struct InMemoryStores {
    /// Contact store.
    pub contacts: InMemoryContactStore,
    /// Deal store.
    pub deals: InMemoryDealStore,
    /// Activity store.
    pub activities: InMemoryActivityStore,
}

impl InMemoryStores {
    /// Stores seeded with the given fixtures.
    #[must_use]
    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        Self {
            contacts: InMemoryContactStore::with_records(fixtures.contacts),
            deals: InMemoryDealStore::with_records(fixtures.deals),
            activities: InMemoryActivityStore::with_records(fixtures.activities),
        }
    }

    /// Stores seeded with the bundled demo data set.
    pub fn seeded() -> Result<Self, StoreError> {
        Ok(Self::from_fixtures(Fixtures::bundled()?))
    }

    /// Stores seeded from a fixture JSON file.
    pub fn from_fixture_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self::from_fixtures(Fixtures::load(path)?))
    }

    /// Delay every call on every store by `latency`.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        Self {
            contacts: self.contacts.with_latency(latency),
            deals: self.deals.with_latency(latency),
            activities: self.activities.with_latency(latency),
        }
    }
}
