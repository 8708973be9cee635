use std::collections::HashSet;
use std::io::Write;

use chrono::{Duration, Utc};

use dealflow::storage::{InMemoryActivityStore, InMemoryContactStore, InMemoryDealStore};
use dealflow::{
    ActivityId, ActivityPatch, ActivityStore, ActivityType, ContactId, ContactPatch, ContactStatus,
    ContactStore, DealId, DealPatch, DealStage, DealStore, Fixtures, InMemoryStores, StoreError,
};

fn contact_draft(first: &str) -> ContactPatch {
    ContactPatch::new()
        .first_name(first)
        .last_name("Smith")
        .email(format!("{}@acme.io", first.to_lowercase()))
        .phone("5551234567")
        .company("Acme")
        .position("CTO")
        .tags(["enterprise"])
}

#[test]
fn contact_update_changes_only_present_fields() {
    let store = InMemoryContactStore::new();
    let created = store.create(contact_draft("Anna")).unwrap();

    let updated = store
        .update(created.id, ContactPatch::new().company("Globex").status(ContactStatus::Customer))
        .unwrap();

    assert_eq!(updated.company, "Globex");
    assert_eq!(updated.status, ContactStatus::Customer);
    assert_eq!(updated.first_name, created.first_name);
    assert_eq!(updated.email, created.email);
    assert_eq!(updated.tags, created.tags);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(store.get(created.id).unwrap(), updated);
}

#[test]
fn created_ids_never_collide() {
    let store = InMemoryContactStore::new();
    let ids: HashSet<ContactId> = (0..50)
        .map(|i| store.create(contact_draft(&format!("C{i}"))).unwrap().id)
        .collect();
    assert_eq!(ids.len(), 50);
    assert_eq!(store.len().unwrap(), 50);
}

#[test]
fn created_fields_round_trip_and_stage_defaults() {
    let store = InMemoryDealStore::new();
    let deal = store
        .create(DealPatch::new().title("Renewal").value(1200.0).assignee("sam"))
        .unwrap();
    assert_eq!(deal.stage, DealStage::Discovery);

    let fetched = store.get(deal.id).unwrap();
    assert_eq!(fetched.title, "Renewal");
    assert!((fetched.value - 1200.0).abs() < f64::EPSILON);
    assert_eq!(fetched.assignee, "sam");
}

#[test]
fn delete_then_get_is_not_found() {
    let store = InMemoryDealStore::new();
    let keep = store.create(DealPatch::new().title("Keep")).unwrap();
    let gone = store.create(DealPatch::new().title("Gone")).unwrap();

    store.delete(gone.id).unwrap();
    assert_eq!(store.get(gone.id).unwrap_err(), StoreError::DealNotFound(gone.id));
    assert!(store.get(keep.id).is_ok());

    let err = store.delete(DealId::new(999)).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn updating_missing_record_is_not_found() {
    let store = InMemoryActivityStore::new();
    let err = store
        .update(ActivityId::new(7), ActivityPatch::new().subject("x"))
        .unwrap_err();
    assert_eq!(err, StoreError::ActivityNotFound(ActivityId::new(7)));
    assert!(store.is_empty().unwrap());
}

#[test]
fn stage_move_and_filters() {
    let deals = InMemoryDealStore::new();
    let a = deals.create(DealPatch::new().title("A")).unwrap();
    deals.create(DealPatch::new().title("B")).unwrap();

    let moved = deals.update_stage(a.id, DealStage::Negotiation).unwrap();
    assert_eq!(moved.stage, DealStage::Negotiation);
    assert_eq!(deals.list_by_stage(DealStage::Negotiation).unwrap().len(), 1);
    assert_eq!(deals.list_by_stage(DealStage::Discovery).unwrap().len(), 1);

    let activities = InMemoryActivityStore::new();
    let contact = ContactId::new(3);
    let call = activities
        .create(ActivityPatch::new().kind(ActivityType::Call).contact(contact))
        .unwrap();
    activities.create(ActivityPatch::new().kind(ActivityType::Demo)).unwrap();
    assert_eq!(activities.list_by_contact(contact).unwrap().len(), 1);

    let done = activities.mark_completed(call.id).unwrap();
    assert!(done.completed);
}

#[test]
fn completing_overdue_activity_moves_counts() {
    let now = Utc::now();
    let store = InMemoryActivityStore::new();
    let overdue = store
        .create(ActivityPatch::new().due_at(now - Duration::days(2)))
        .unwrap();

    let before = dealflow::analytics::completion_stats(&store.list().unwrap(), now);
    store.mark_completed(overdue.id).unwrap();
    let after = dealflow::analytics::completion_stats(&store.list().unwrap(), now);

    assert_eq!(after.overdue, before.overdue - 1);
    assert_eq!(after.completed, before.completed + 1);
}

#[test]
fn search_through_store() {
    let store = InMemoryContactStore::new();
    store.create(contact_draft("Anna")).unwrap();
    store
        .create(ContactPatch::new().first_name("Bob").last_name("Jones").company("Orange"))
        .unwrap();
    let hits = store.search("ANN").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].first_name, "Anna");
}

#[test]
fn fixture_file_seeds_stores() {
    let bundled = Fixtures::bundled().unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(&bundled).unwrap().as_bytes())
        .unwrap();

    let stores = InMemoryStores::from_fixture_file(file.path()).unwrap();
    assert_eq!(stores.contacts.len().unwrap(), bundled.contacts.len());
    assert_eq!(stores.deals.len().unwrap(), bundled.deals.len());
    assert_eq!(stores.activities.len().unwrap(), bundled.activities.len());

    // New ids stay clear of seeded ones.
    let created = stores.contacts.create(contact_draft("Zed")).unwrap();
    assert!(bundled.contacts.iter().all(|c| c.id != created.id));
}

#[test]
fn malformed_fixture_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{\"contacts\": [{\"id\": \"x\"}]}").unwrap();
    let err = InMemoryStores::from_fixture_file(file.path()).unwrap_err();
    assert!(matches!(err, StoreError::Fixture(_)));

    let missing = InMemoryStores::from_fixture_file("/definitely/not/here.json").unwrap_err();
    assert!(matches!(missing, StoreError::Fixture(_)));
}
