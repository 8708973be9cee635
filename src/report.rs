//! Report bundles assembled from store snapshots.
//!
//! Each report is a plain serializable struct built by a pure function, so
//! the same snapshot always yields the same report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::Activity;
use crate::analytics::{
    completion_stats, conversion_rates, pipeline_totals, sales_metrics, stage_breakdown, type_breakdown,
    weekly_breakdown, CompletionStats, PipelineTotals, SalesMetrics, StageConversion, StageSummary,
    TypeSummary, WeekSummary,
};
use crate::config::AnalyticsConfig;
use crate::contact::Contact;
use crate::deal::Deal;
use crate::view::{recent_activities, DashboardStats};

/// Dashboard numbers plus the latest activities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub stats: DashboardStats,
    pub recent_activities: Vec<Activity>,
}

impl DashboardReport {
    /// Builds the dashboard from full snapshots.
    #[must_use]
    pub fn build(contacts: &[Contact], deals: &[Deal], activities: &[Activity], recent_limit: usize) -> Self {
        Self {
            stats: DashboardStats::compute(contacts, deals, activities),
            recent_activities: recent_activities(activities, recent_limit),
        }
    }
}

/// Stage distribution, conversions and revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub stages: Vec<StageSummary>,
    pub conversions: Vec<StageConversion>,
    pub totals: PipelineTotals,
    pub sales: SalesMetrics,
}

impl PipelineReport {
    /// Builds the pipeline report from a deal snapshot.
    #[must_use]
    pub fn build(deals: &[Deal]) -> Self {
        Self {
            stages: stage_breakdown(deals),
            conversions: conversion_rates(deals),
            totals: pipeline_totals(deals),
            sales: sales_metrics(deals),
        }
    }
}

/// Activity totals by type, by week and overall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityReport {
    pub types: Vec<TypeSummary>,
    /// Oldest week first; always four entries.
    pub weeks: Vec<WeekSummary>,
    pub completion: CompletionStats,
}

impl ActivityReport {
    /// Builds the activity report as seen at `now`.
    #[must_use]
    pub fn build(activities: &[Activity], now: DateTime<Utc>, analytics: &AnalyticsConfig) -> Self {
        Self {
            types: type_breakdown(activities),
            weeks: weekly_breakdown(activities, now.date_naive(), analytics.week_start),
            completion: completion_stats(activities, now),
        }
    }
}

/// Every report at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub dashboard: DashboardReport,
    pub pipeline: PipelineReport,
    pub activities: ActivityReport,
}

impl Snapshot {
    /// Builds all reports from full snapshots.
    #[must_use]
    pub fn build(
        contacts: &[Contact],
        deals: &[Deal],
        activities: &[Activity],
        now: DateTime<Utc>,
        analytics: &AnalyticsConfig,
    ) -> Self {
        Self {
            generated_at: now,
            dashboard: DashboardReport::build(contacts, deals, activities, analytics.recent_limit),
            pipeline: PipelineReport::build(deals),
            activities: ActivityReport::build(activities, now, analytics),
        }
    }
}
