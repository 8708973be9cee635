//! Presentation-ready arrangements of store snapshots.
//!
//! These are the non-rendering parts of the screens: which contacts a
//! search shows, how the activity list and calendar are ordered, what each
//! pipeline column holds and the dashboard headline numbers.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::activity::Activity;
use crate::contact::Contact;
use crate::deal::{Deal, DealStage};

/// How many activities the dashboard lists.
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Contacts matching `query` on first name, last name, email or company,
/// case-insensitively. An empty query returns every contact.
#[must_use]
pub fn filter_contacts(contacts: &[Contact], query: &str) -> Vec<Contact> {
    contacts.iter().filter(|c| c.matches(query)).cloned().collect()
}

/// Activity list order: open items first, then earliest due.
pub fn sort_for_list(activities: &mut [Activity]) {
    activities.sort_by(|a, b| {
        a.completed
            .cmp(&b.completed)
            .then_with(|| a.due_at.cmp(&b.due_at))
    });
}

/// Splits a snapshot into (pending, completed), each in list order.
#[must_use]
pub fn partition_by_completion(activities: &[Activity]) -> (Vec<Activity>, Vec<Activity>) {
    let mut sorted = activities.to_vec();
    sort_for_list(&mut sorted);
    sorted.into_iter().partition(|a| !a.completed)
}

/// One pipeline board column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub stage: DealStage,
    pub deals: Vec<Deal>,
    /// Sum of the column's deal values.
    pub total_value: f64,
}

/// Columns for every stage in pipeline order. Empty stages get an empty
/// column.
#[must_use]
pub fn board_columns(deals: &[Deal]) -> Vec<BoardColumn> {
    DealStage::ALL
        .into_iter()
        .map(|stage| {
            let deals: Vec<Deal> = deals.iter().filter(|d| d.stage == stage).cloned().collect();
            BoardColumn {
                stage,
                total_value: deals.iter().map(|d| d.value).sum(),
                deals,
            }
        })
        .collect()
}

/// Activities due on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Ascending by due time.
    pub activities: Vec<Activity>,
}

/// Activities grouped by due date, earliest day first.
#[must_use]
pub fn calendar(activities: &[Activity]) -> Vec<CalendarDay> {
    let mut days: BTreeMap<NaiveDate, Vec<Activity>> = BTreeMap::new();
    for activity in activities {
        days.entry(activity.due_date()).or_default().push(activity.clone());
    }
    days.into_iter()
        .map(|(date, mut activities)| {
            activities.sort_by_key(|a| a.due_at);
            CalendarDay { date, activities }
        })
        .collect()
}

/// Dashboard headline numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_contacts: usize,
    pub total_deals: usize,
    /// Sum of every deal's value, open or closed.
    pub pipeline_value: f64,
    /// Activities not yet completed.
    pub open_activities: usize,
}

impl DashboardStats {
    /// Computes the headline numbers from full snapshots.
    #[must_use]
    pub fn compute(contacts: &[Contact], deals: &[Deal], activities: &[Activity]) -> Self {
        Self {
            total_contacts: contacts.len(),
            total_deals: deals.len(),
            pipeline_value: deals.iter().map(|d| d.value).sum(),
            open_activities: activities.iter().filter(|a| !a.completed).count(),
        }
    }
}

/// The `limit` most recently created activities, newest first.
#[must_use]
pub fn recent_activities(activities: &[Activity], limit: usize) -> Vec<Activity> {
    let mut recent = activities.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    recent.truncate(limit);
    recent
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::activity::{ActivityId, ActivityPatch};
    use crate::contact::{ContactId, ContactPatch};
    use crate::deal::{DealId, DealPatch};

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, d, h, 0, 0).unwrap()
    }

    fn activity(id: u64, due: DateTime<Utc>, completed: bool) -> Activity {
        Activity::from_patch(
            ActivityId::new(id),
            at(1, 0) + Duration::minutes(i64::try_from(id).unwrap()),
            ActivityPatch::new().due_at(due).completed(completed),
        )
    }

    #[test]
    fn test_search_scenario() {
        let now = Utc::now();
        let contacts = vec![
            Contact::from_patch(
                ContactId::new(1),
                now,
                ContactPatch::new().first_name("Anna").last_name("Smith"),
            ),
            Contact::from_patch(ContactId::new(2), now, ContactPatch::new().email("dianne@x.com")),
            Contact::from_patch(
                ContactId::new(3),
                now,
                ContactPatch::new().first_name("Bob").last_name("Jones").company("Orange"),
            ),
        ];
        let ids: Vec<u64> = filter_contacts(&contacts, "ann").iter().map(|c| c.id.get()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(filter_contacts(&contacts, "").len(), 3);
        // "dana" holds "ana" but not "ann".
        let dana = Contact::from_patch(ContactId::new(4), now, ContactPatch::new().email("dana@x.com"));
        assert!(!dana.matches("ann"));
        assert_eq!(filter_contacts(&contacts, "ORANGE").len(), 1);
    }

    #[test]
    fn test_list_order() {
        let mut activities = vec![
            activity(1, at(3, 9), true),
            activity(2, at(5, 9), false),
            activity(3, at(2, 9), false),
            activity(4, at(1, 9), true),
        ];
        sort_for_list(&mut activities);
        let ids: Vec<u64> = activities.iter().map(|a| a.id.get()).collect();
        assert_eq!(ids, vec![3, 2, 4, 1]);

        let (pending, done) = partition_by_completion(&activities);
        assert_eq!(pending.len(), 2);
        assert_eq!(done.len(), 2);
    }

    #[test]
    fn test_board_keeps_empty_columns() {
        let deals = vec![Deal::from_patch(
            DealId::new(1),
            Utc::now(),
            DealPatch::new().stage(DealStage::Proposal).value(250.0),
        )];
        let columns = board_columns(&deals);
        assert_eq!(columns.len(), 6);
        assert_eq!(columns[2].stage, DealStage::Proposal);
        assert_eq!(columns[2].deals.len(), 1);
        assert!((columns[2].total_value - 250.0).abs() < f64::EPSILON);
        assert!(columns[0].deals.is_empty());
    }

    #[test]
    fn test_calendar_groups_by_day() {
        let activities = vec![
            activity(1, at(4, 15), false),
            activity(2, at(2, 9), false),
            activity(3, at(4, 8), true),
        ];
        let days = calendar(&activities);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 10, 2).unwrap());
        let later: Vec<u64> = days[1].activities.iter().map(|a| a.id.get()).collect();
        assert_eq!(later, vec![3, 1]);
    }

    #[test]
    fn test_dashboard_and_recent() {
        let activities: Vec<Activity> = (1..=7).map(|id| activity(id, at(9, 9), id % 2 == 0)).collect();
        let stats = DashboardStats::compute(&[], &[], &activities);
        assert_eq!(stats.open_activities, 4);
        assert_eq!(stats.total_deals, 0);

        let recent = recent_activities(&activities, RECENT_ACTIVITY_LIMIT);
        let ids: Vec<u64> = recent.iter().map(|a| a.id.get()).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    }
}
