//! Activity aggregation: by type, by week and overall completion.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::activity::{Activity, ActivityType};
use crate::analytics::{percent, to_f64};

/// Number of weeks reported by [`weekly_breakdown`].
pub const WEEKS: usize = 4;

/// Totals for one activity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSummary {
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub completion_rate: f64,
}

/// Totals for one calendar week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekSummary {
    /// "Week 1" (oldest) through "Week 4" (current).
    pub label: String,
    /// First day of the week.
    pub start: NaiveDate,
    /// Last day of the week, inclusive.
    pub end: NaiveDate,
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub completion_rate: f64,
}

/// Completion figures across the whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Past due and not completed.
    pub overdue: usize,
    pub completion_rate: f64,
}

fn tally<'a>(activities: impl Iterator<Item = &'a Activity>) -> (usize, usize) {
    activities.fold((0, 0), |(total, done), activity| {
        (total + 1, done + usize::from(activity.completed))
    })
}

/// Per-type totals in type order. Types without activities are omitted.
#[must_use]
pub fn type_breakdown(activities: &[Activity]) -> Vec<TypeSummary> {
    ActivityType::ALL
        .into_iter()
        .filter_map(|kind| {
            let (total, completed) = tally(activities.iter().filter(|a| a.kind == kind));
            (total > 0).then(|| TypeSummary {
                kind,
                total,
                completed,
                pending: total - completed,
                completion_rate: percent(to_f64(completed), to_f64(total)),
            })
        })
        .collect()
}

/// First day of the week containing `day`.
#[must_use]
pub fn week_start_on_or_before(day: NaiveDate, week_start: Weekday) -> NaiveDate {
    let offset = (7 + day.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    day - Duration::days(i64::from(offset))
}

/// The last four calendar weeks, oldest first.
///
/// The current week starts on the `week_start` weekday on or before
/// `today`; earlier weeks trail back seven days at a time. An activity
/// counts toward the week containing its due date. Weeks with nothing due
/// are reported with zero totals.
#[must_use]
pub fn weekly_breakdown(activities: &[Activity], today: NaiveDate, week_start: Weekday) -> Vec<WeekSummary> {
    let current = week_start_on_or_before(today, week_start);
    (0..WEEKS)
        .map(|n| {
            let back = i64::try_from(WEEKS - 1 - n).unwrap_or(0);
            let start = current - Duration::weeks(back);
            let end = start + Duration::days(6);
            let (total, completed) = tally(activities.iter().filter(|a| {
                let due = a.due_date();
                due >= start && due <= end
            }));
            WeekSummary {
                label: format!("Week {}", n + 1),
                start,
                end,
                total,
                completed,
                pending: total - completed,
                completion_rate: percent(to_f64(completed), to_f64(total)),
            }
        })
        .collect()
}

/// Overall completion, including how many activities are overdue at `now`.
#[must_use]
pub fn completion_stats(activities: &[Activity], now: DateTime<Utc>) -> CompletionStats {
    let (total, completed) = tally(activities.iter());
    CompletionStats {
        total,
        completed,
        pending: total - completed,
        overdue: activities.iter().filter(|a| a.is_overdue(now)).count(),
        completion_rate: percent(to_f64(completed), to_f64(total)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    use crate::activity::{ActivityId, ActivityPatch};

    fn activity(id: u64, kind: ActivityType, due: DateTime<Utc>, completed: bool) -> Activity {
        Activity::from_patch(
            ActivityId::new(id),
            due - Duration::days(10),
            ActivityPatch::new().kind(kind).due_at(due).completed(completed),
        )
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_type_breakdown_skips_unused_types() {
        let activities = vec![
            activity(1, ActivityType::Call, noon(2026, 10, 1), true),
            activity(2, ActivityType::Call, noon(2026, 10, 2), false),
            activity(3, ActivityType::Demo, noon(2026, 10, 3), false),
        ];
        let breakdown = type_breakdown(&activities);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].kind, ActivityType::Call);
        assert_eq!(breakdown[0].pending, 1);
        assert!((breakdown[0].completion_rate - 50.0).abs() < f64::EPSILON);
        assert_eq!(breakdown[1].kind, ActivityType::Demo);
    }

    #[test]
    fn test_week_start_alignment() {
        // 2026-10-21 is a Wednesday.
        assert_eq!(week_start_on_or_before(day(2026, 10, 21), Weekday::Sun), day(2026, 10, 18));
        assert_eq!(week_start_on_or_before(day(2026, 10, 21), Weekday::Mon), day(2026, 10, 19));
        assert_eq!(week_start_on_or_before(day(2026, 10, 18), Weekday::Sun), day(2026, 10, 18));
    }

    #[test]
    fn test_weekly_breakdown_always_has_four_weeks() {
        let weeks = weekly_breakdown(&[], day(2026, 10, 21), Weekday::Sun);
        assert_eq!(weeks.len(), WEEKS);
        assert!(weeks.iter().all(|w| w.total == 0 && w.completion_rate == 0.0));
        assert_eq!(weeks[0].label, "Week 1");
        assert_eq!(weeks[0].start, day(2026, 9, 27));
        assert_eq!(weeks[3].label, "Week 4");
        assert_eq!(weeks[3].end, day(2026, 10, 24));
    }

    #[test]
    fn test_weekly_breakdown_buckets_by_due_date() {
        let activities = vec![
            // Last day of the current week, late in the day.
            activity(1, ActivityType::Call, Utc.with_ymd_and_hms(2026, 10, 24, 23, 30, 0).unwrap(), false),
            // First day of week 3.
            activity(2, ActivityType::Email, Utc.with_ymd_and_hms(2026, 10, 11, 0, 0, 0).unwrap(), true),
            // Before the window.
            activity(3, ActivityType::Email, noon(2026, 9, 20), true),
        ];
        let weeks = weekly_breakdown(&activities, day(2026, 10, 21), Weekday::Sun);
        assert_eq!(weeks[3].total, 1);
        assert_eq!(weeks[2].total, 1);
        assert_eq!(weeks[2].completed, 1);
        let counted: usize = weeks.iter().map(|w| w.total).sum();
        assert_eq!(counted, 2);
    }

    #[test]
    fn test_completing_overdue_activity_moves_counts() {
        let now = noon(2026, 10, 19);
        let mut activities = vec![
            activity(1, ActivityType::Call, noon(2026, 10, 10), false),
            activity(2, ActivityType::Call, noon(2026, 10, 30), false),
        ];
        let before = completion_stats(&activities, now);
        assert_eq!(before.overdue, 1);
        assert_eq!(before.completed, 0);

        activities[0].apply(ActivityPatch::new().completed(true));
        let after = completion_stats(&activities, now);
        assert_eq!(after.overdue, before.overdue - 1);
        assert_eq!(after.completed, before.completed + 1);
        assert_eq!(after.pending, 1);
    }
}
