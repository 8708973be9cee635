//! Pure aggregations over store snapshots.
//!
//! Nothing here touches a store: callers fetch a snapshot, pass a slice in
//! and get plain serializable summaries back. Every percentage is in the
//! range 0-100 and is 0 when its denominator is 0.

pub mod activity;
pub mod pipeline;

pub use activity::{
    completion_stats, type_breakdown, week_start_on_or_before, weekly_breakdown, CompletionStats,
    TypeSummary, WeekSummary,
};
pub use pipeline::{
    conversion_rates, pipeline_totals, sales_metrics, stage_breakdown, PipelineTotals, SalesMetrics,
    StageConversion, StageSummary,
};

#[allow(clippy::cast_precision_loss)]
pub(crate) fn to_f64(n: usize) -> f64 {
    n as f64
}

pub(crate) fn percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_guards_zero_denominator() {
        assert_eq!(percent(3.0, 0.0), 0.0);
        assert!((percent(1.0, 4.0) - 25.0).abs() < f64::EPSILON);
    }
}
