//! Command execution over pluggable stores.
//!
//! [`CrmEngine`] is the single entry point the presentation layer talks to:
//! it validates and applies [`Command`]s, serves read snapshots and builds
//! reports. It is cheap to clone; clones share the same stores.

/// Single-worker command queue.
pub mod runtime;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::activity::{Activity, ActivityId};
use crate::command::{Command, CommandOutcome, CommandRequest};
use crate::config::{AnalyticsConfig, BackendConfig, CrmConfig, RemoteConfig};
use crate::contact::{Contact, ContactId};
use crate::deal::{Deal, DealId, DealStage};
use crate::error::CrmResult;
use crate::notice::Notice;
use crate::record::RecordKind;
use crate::report::{ActivityReport, DashboardReport, PipelineReport, Snapshot};
use crate::storage::{ActivityStore, ContactStore, DealStore, InMemoryStores, RemoteStores};
use crate::validation::{
    validate_activity_draft, validate_activity_patch, validate_contact_draft, validate_contact_patch,
    validate_deal_draft, validate_deal_patch,
};
use crate::view::{self, BoardColumn, CalendarDay};

/// Validating command executor and read facade.
#[derive(Clone)]
pub struct CrmEngine {
    contacts: Arc<dyn ContactStore>,
    deals: Arc<dyn DealStore>,
    activities: Arc<dyn ActivityStore>,
    analytics: AnalyticsConfig,
}

impl CrmEngine {
    /// Create an engine over the given stores with default analytics.
    #[must_use]
    pub fn new(
        contacts: Arc<dyn ContactStore>,
        deals: Arc<dyn DealStore>,
        activities: Arc<dyn ActivityStore>,
    ) -> Self {
        Self {
            contacts,
            deals,
            activities,
            analytics: AnalyticsConfig::default(),
        }
    }

    /// Replaces the analytics settings.
    #[must_use]
    pub fn with_analytics(mut self, analytics: AnalyticsConfig) -> Self {
        self.analytics = analytics;
        self
    }

    /// Engine over the in-memory stores.
    #[must_use]
    pub fn from_memory(stores: InMemoryStores) -> Self {
        Self::new(
            Arc::new(stores.contacts),
            Arc::new(stores.deals),
            Arc::new(stores.activities),
        )
    }

    /// Engine over the remote stores.
    #[must_use]
    pub fn from_remote(stores: RemoteStores) -> Self {
        Self::new(
            Arc::new(stores.contacts),
            Arc::new(stores.deals),
            Arc::new(stores.activities),
        )
    }

    /// Builds the backend `config` selects.
    pub fn from_config(config: &CrmConfig) -> CrmResult<Self> {
        let engine = match &config.backend {
            BackendConfig::Mock(mock) => {
                let stores = match &mock.fixtures {
                    Some(path) => InMemoryStores::from_fixture_file(path)?,
                    None => InMemoryStores::seeded()?,
                };
                Self::from_memory(stores.with_latency(mock.latency))
            }
            BackendConfig::Remote(remote) => Self::from_remote(remote_stores(remote)?),
        };
        info!(backend = config.backend.name(), "engine ready");
        Ok(engine.with_analytics(config.analytics.clone()))
    }

    /// Returns the contact store.
    #[must_use]
    pub fn contact_store(&self) -> &Arc<dyn ContactStore> {
        &self.contacts
    }

    /// Returns the deal store.
    #[must_use]
    pub fn deal_store(&self) -> &Arc<dyn DealStore> {
        &self.deals
    }

    /// Returns the activity store.
    #[must_use]
    pub fn activity_store(&self) -> &Arc<dyn ActivityStore> {
        &self.activities
    }

    /// Returns the analytics settings.
    #[must_use]
    pub const fn analytics(&self) -> &AnalyticsConfig {
        &self.analytics
    }

    /// Validates and applies `command` under a fresh request id.
    pub fn execute(&self, command: Command) -> CrmResult<CommandOutcome> {
        self.execute_request(CommandRequest::new(command))
    }

    /// Validates and applies a stamped command.
    ///
    /// Nothing is written when validation fails. Store failures are
    /// returned as-is; no retry is attempted.
    pub fn execute_request(&self, request: CommandRequest) -> CrmResult<CommandOutcome> {
        let CommandRequest {
            request_id, command, ..
        } = request;
        let name = command.name();
        let target = command.target();

        let result = self.apply(command);
        match &result {
            Ok(outcome) => info!(
                %request_id,
                command = name,
                record_id = outcome.record_id(),
                "command applied"
            ),
            Err(err) => warn!(
                %request_id,
                command = name,
                target = ?target,
                error = %err,
                "command failed"
            ),
        }
        result
    }

    /// Executes `command` and pairs the result with its user-facing notice.
    pub fn execute_with_notice(&self, command: Command) -> (CrmResult<CommandOutcome>, Notice) {
        let action = command.action();
        let kind = command.kind();
        let result = self.execute(command);
        let notice = Notice::from_result(action, kind, &result);
        (result, notice)
    }

    fn apply(&self, command: Command) -> CrmResult<CommandOutcome> {
        let outcome = match command {
            Command::CreateContact(draft) => {
                validate_contact_draft(&draft)?;
                CommandOutcome::Contact(self.contacts.create(draft)?)
            }
            Command::UpdateContact { id, patch } => {
                validate_contact_patch(&patch)?;
                CommandOutcome::Contact(self.contacts.update(id, patch)?)
            }
            Command::DeleteContact(id) => {
                self.contacts.delete(id)?;
                deleted(RecordKind::Contact, id.get())
            }

            Command::CreateDeal(draft) => {
                validate_deal_draft(&draft)?;
                CommandOutcome::Deal(self.deals.create(draft)?)
            }
            Command::UpdateDeal { id, patch } => {
                validate_deal_patch(&patch)?;
                CommandOutcome::Deal(self.deals.update(id, patch)?)
            }
            Command::DeleteDeal(id) => {
                self.deals.delete(id)?;
                deleted(RecordKind::Deal, id.get())
            }
            Command::MoveDeal { id, stage } => CommandOutcome::Deal(self.deals.update_stage(id, stage)?),

            Command::CreateActivity(draft) => {
                validate_activity_draft(&draft)?;
                CommandOutcome::Activity(self.activities.create(draft)?)
            }
            Command::UpdateActivity { id, patch } => {
                validate_activity_patch(&patch)?;
                CommandOutcome::Activity(self.activities.update(id, patch)?)
            }
            Command::DeleteActivity(id) => {
                self.activities.delete(id)?;
                deleted(RecordKind::Activity, id.get())
            }
            Command::CompleteActivity(id) => CommandOutcome::Activity(self.activities.mark_completed(id)?),
        };
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Contact snapshot.
    pub fn contacts(&self) -> CrmResult<Vec<Contact>> {
        let contacts = self.contacts.list()?;
        debug!(count = contacts.len(), "loaded contacts");
        Ok(contacts)
    }

    /// One contact.
    pub fn contact(&self, id: ContactId) -> CrmResult<Contact> {
        Ok(self.contacts.get(id)?)
    }

    /// Contacts matching `query` on name, email or company.
    pub fn search_contacts(&self, query: &str) -> CrmResult<Vec<Contact>> {
        let contacts = self.contacts.search(query)?;
        debug!(query, count = contacts.len(), "searched contacts");
        Ok(contacts)
    }

    /// Deal snapshot.
    pub fn deals(&self) -> CrmResult<Vec<Deal>> {
        let deals = self.deals.list()?;
        debug!(count = deals.len(), "loaded deals");
        Ok(deals)
    }

    /// One deal.
    pub fn deal(&self, id: DealId) -> CrmResult<Deal> {
        Ok(self.deals.get(id)?)
    }

    /// Deals currently in `stage`.
    pub fn deals_in_stage(&self, stage: DealStage) -> CrmResult<Vec<Deal>> {
        let deals = self.deals.list_by_stage(stage)?;
        debug!(stage = stage.as_str(), count = deals.len(), "loaded deals in stage");
        Ok(deals)
    }

    /// Pipeline board, one column per stage.
    pub fn board(&self) -> CrmResult<Vec<BoardColumn>> {
        Ok(view::board_columns(&self.deals()?))
    }

    /// Activity snapshot in list order: open first, then by due time.
    pub fn activities(&self) -> CrmResult<Vec<Activity>> {
        let mut activities = self.activities.list()?;
        view::sort_for_list(&mut activities);
        debug!(count = activities.len(), "loaded activities");
        Ok(activities)
    }

    /// One activity.
    pub fn activity(&self, id: ActivityId) -> CrmResult<Activity> {
        Ok(self.activities.get(id)?)
    }

    /// Activities linked to `contact_id`, in list order.
    pub fn activities_for_contact(&self, contact_id: ContactId) -> CrmResult<Vec<Activity>> {
        let mut activities = self.activities.list_by_contact(contact_id)?;
        view::sort_for_list(&mut activities);
        debug!(contact_id = contact_id.get(), count = activities.len(), "loaded contact activities");
        Ok(activities)
    }

    /// Activities grouped by due date.
    pub fn calendar(&self) -> CrmResult<Vec<CalendarDay>> {
        Ok(view::calendar(&self.activities.list()?))
    }

    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    /// Dashboard numbers and recent activities.
    pub fn dashboard(&self) -> CrmResult<DashboardReport> {
        Ok(DashboardReport::build(
            &self.contacts.list()?,
            &self.deals.list()?,
            &self.activities.list()?,
            self.analytics.recent_limit,
        ))
    }

    /// Stage distribution, conversions and revenue.
    pub fn pipeline_report(&self) -> CrmResult<PipelineReport> {
        Ok(PipelineReport::build(&self.deals.list()?))
    }

    /// Activity analytics as of `now`.
    pub fn activity_report(&self, now: DateTime<Utc>) -> CrmResult<ActivityReport> {
        Ok(ActivityReport::build(&self.activities.list()?, now, &self.analytics))
    }

    /// Every report over one read of each collection.
    pub fn snapshot(&self, now: DateTime<Utc>) -> CrmResult<Snapshot> {
        let contacts = self.contacts.list()?;
        let deals = self.deals.list()?;
        let activities = self.activities.list()?;
        debug!(
            contacts = contacts.len(),
            deals = deals.len(),
            activities = activities.len(),
            "building snapshot"
        );
        Ok(Snapshot::build(&contacts, &deals, &activities, now, &self.analytics))
    }
}

const fn deleted(kind: RecordKind, id: u64) -> CommandOutcome {
    CommandOutcome::Deleted { kind, id }
}

#[cfg(feature = "remote")]
fn remote_stores(config: &RemoteConfig) -> CrmResult<RemoteStores> {
    let client = crate::storage::remote::HttpRecordClient::from_config(config)?;
    Ok(RemoteStores::new(Arc::new(client), config.paging()))
}

#[cfg(not(feature = "remote"))]
fn remote_stores(_config: &RemoteConfig) -> CrmResult<RemoteStores> {
    Err(crate::error::ConfigError::BackendUnavailable {
        backend: "remote".to_string(),
        feature: "remote".to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use tracing_test::traced_test;

    use crate::activity::ActivityPatch;
    use crate::contact::ContactPatch;
    use crate::deal::DealPatch;
    use crate::notice::NoticeLevel;

    fn engine() -> CrmEngine {
        CrmEngine::from_memory(InMemoryStores::default())
    }

    fn contact_draft() -> ContactPatch {
        ContactPatch::new()
            .first_name("Anna")
            .last_name("Smith")
            .email("anna@acme.io")
            .phone("5551234567")
            .company("Acme")
            .position("CTO")
    }

    #[test]
    fn test_create_and_move_deal() {
        let engine = engine();
        let contact = match engine.execute(Command::CreateContact(contact_draft())).unwrap() {
            CommandOutcome::Contact(c) => c,
            other => panic!("unexpected outcome {other:?}"),
        };

        let draft = DealPatch::new()
            .title("Renewal")
            .contact(contact.id)
            .value(1200.0)
            .expected_close_date(NaiveDate::from_ymd_opt(2026, 12, 1).unwrap())
            .assignee("sam");
        let deal_id = DealId::new(engine.execute(Command::CreateDeal(draft)).unwrap().record_id());
        assert_eq!(engine.deal(deal_id).unwrap().stage, DealStage::Discovery);

        let (result, notice) = engine.execute_with_notice(Command::MoveDeal {
            id: deal_id,
            stage: DealStage::Proposal,
        });
        assert!(result.is_ok());
        assert_eq!(notice.message, "Deal moved successfully");
        assert_eq!(engine.deals_in_stage(DealStage::Proposal).unwrap().len(), 1);
        assert_eq!(engine.board().unwrap()[2].deals.len(), 1);
    }

    #[test]
    fn test_validation_blocks_write() {
        let engine = engine();
        let err = engine
            .execute(Command::CreateContact(contact_draft().email("not-an-email")))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(engine.contacts().unwrap().is_empty());

        let err = engine
            .execute(Command::CreateActivity(ActivityPatch::new().subject("Call")))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(engine.activities().unwrap().is_empty());
    }

    #[test]
    fn test_missing_record_notice() {
        let engine = engine();
        let (result, notice) = engine.execute_with_notice(Command::CompleteActivity(ActivityId::new(42)));
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Failed to update activity");
    }

    #[test]
    fn test_complete_activity() {
        let engine = engine();
        let draft = ActivityPatch::new()
            .subject("Intro call")
            .contact(ContactId::new(1))
            .assignee("sam");
        let id = ActivityId::new(engine.execute(Command::CreateActivity(draft)).unwrap().record_id());
        engine.execute(Command::CompleteActivity(id)).unwrap();
        assert!(engine.activity(id).unwrap().completed);
        assert_eq!(engine.activities_for_contact(ContactId::new(1)).unwrap().len(), 1);
        assert_eq!(engine.dashboard().unwrap().stats.open_activities, 0);
    }

    #[test]
    fn test_seeded_snapshot() {
        let engine = CrmEngine::from_config(&CrmConfig::default()).unwrap();
        let snapshot = engine.snapshot(Utc::now()).unwrap();
        assert_eq!(snapshot.dashboard.stats.total_contacts, engine.contacts().unwrap().len());
        assert_eq!(snapshot.pipeline.stages.len(), DealStage::ALL.len());
        assert_eq!(snapshot.activities.weeks.len(), 4);
    }

    #[cfg(not(feature = "remote"))]
    #[test]
    fn test_remote_backend_requires_feature() {
        let config = CrmConfig {
            backend: BackendConfig::Remote(RemoteConfig {
                base_url: "https://records.example.com".to_string(),
                project_id: "proj".to_string(),
                public_key: "key".to_string(),
                page_size: 100,
                timeout: std::time::Duration::from_secs(1),
            }),
            ..CrmConfig::default()
        };
        let err = CrmEngine::from_config(&config).err().unwrap();
        assert!(err.is_config());
    }

    #[traced_test]
    #[test]
    fn test_commands_are_logged() {
        let engine = engine();
        engine.execute(Command::CreateContact(contact_draft())).unwrap();
        let _ = engine.execute(Command::DeleteDeal(DealId::new(5)));
        assert!(logs_contain("command applied"));
        assert!(logs_contain("create_contact"));
        assert!(logs_contain("command failed"));
        assert!(logs_contain("delete_deal"));
    }
}
