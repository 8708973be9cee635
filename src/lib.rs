//! # dealflow
//!
//! Core of a small CRM: contacts, a staged deal pipeline and scheduled
//! activities, with pipeline and activity analytics on top.
//!
//! ## Layers
//!
//! - **Stores** ([`storage`]): one store per record kind behind the
//!   [`ContactStore`], [`DealStore`] and [`ActivityStore`] traits, backed
//!   either by seeded in-memory tables or by a remote record service.
//! - **Aggregators** ([`analytics`]): pure functions over snapshots.
//! - **Engine** ([`engine`]): validates and applies [`Command`]s, serves
//!   reads and builds [`report`]s; [`CommandRuntime`] runs commands in
//!   order on a worker thread.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dealflow::{Command, CrmConfig, CrmEngine, DealId, DealStage};
//!
//! let engine = CrmEngine::from_config(&CrmConfig::from_env()?)?;
//! engine.execute(Command::MoveDeal { id: DealId::new(1), stage: DealStage::Proposal })?;
//! let report = engine.pipeline_report()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Records
pub mod activity;
pub mod contact;
pub mod deal;
pub mod record;

// Stores and errors
pub mod error;
pub mod storage;

// Aggregation and presentation
pub mod analytics;
pub mod format;
pub mod notice;
pub mod report;
pub mod validation;
pub mod view;

// Execution
pub mod command;
pub mod config;
pub mod engine;

pub use activity::{Activity, ActivityId, ActivityPatch, ActivityType};
pub use command::{Command, CommandAction, CommandOutcome, CommandRequest};
pub use config::{AnalyticsConfig, BackendConfig, CrmConfig, MockConfig, RemoteConfig};
pub use contact::{Contact, ContactId, ContactPatch, ContactSource, ContactStatus};
pub use deal::{Deal, DealId, DealPatch, DealStage};
pub use engine::runtime::{CommandHandle, CommandRuntime, CommandRuntimeConfig};
pub use engine::CrmEngine;
pub use error::{ConfigError, CrmError, CrmResult, ExecutionError, RemoteError, ValidationError};
pub use notice::{Notice, NoticeLevel};
pub use record::RecordKind;
pub use report::{ActivityReport, DashboardReport, PipelineReport, Snapshot};
pub use storage::{
    ActivityStore, ContactStore, DealStore, Fixtures, InMemoryStores, RecordClient, RemoteStores, StoreError,
};
