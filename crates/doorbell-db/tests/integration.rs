//! Integration tests for the `doorbell-db` data layer.
//!
//! Every test runs against a private in-memory `SQLite` database, so no
//! external services are required.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use std::collections::BTreeSet;

use doorbell_db::{Database, DbError};
use doorbell_types::{ActorId, EventId, EventType, MessageId, NewEvent};

// =============================================================================
// Helper: open an in-memory database and run migrations
// =============================================================================

async fn setup() -> Database {
    let db = Database::connect_in_memory()
        .await
        .expect("Failed to open in-memory SQLite");
    db.run_migrations().await.expect("Failed to run migrations");
    db
}

fn system(timestamp_ms: i64, event_type: EventType) -> NewEvent {
    NewEvent::new(timestamp_ms, event_type, ActorId::SYSTEM)
}

// =============================================================================
// Event store
// =============================================================================

#[tokio::test]
async fn append_assigns_increasing_ids() {
    let db = setup().await;
    let events = db.events();

    let first = events.append(&system(1_000, EventType::Open)).await.unwrap();
    let second = events.append(&system(2_000, EventType::Lock)).await.unwrap();

    assert!(second > first);
    assert_eq!(events.count().await.unwrap(), 2);
}

#[tokio::test]
async fn get_by_id_returns_persisted_fields() {
    let db = setup().await;
    let events = db.events();

    let id = events
        .append(&NewEvent::new(5_000, EventType::OverrideLock, ActorId(77)))
        .await
        .unwrap();

    let event = events.get_by_id(id).await.unwrap().expect("event exists");
    assert_eq!(event.id, id);
    assert_eq!(event.timestamp_ms, 5_000);
    assert_eq!(event.event_type, EventType::OverrideLock);
    assert_eq!(event.actor, ActorId(77));

    assert!(events.get_by_id(EventId(9_999)).await.unwrap().is_none());
}

#[tokio::test]
async fn query_range_orders_by_timestamp_then_id() {
    let db = setup().await;
    let events = db.events();

    // Appended out of timestamp order, with a tie at 2_000.
    let late = events.append(&system(3_000, EventType::Lock)).await.unwrap();
    let tie_a = events.append(&system(2_000, EventType::Open)).await.unwrap();
    let tie_b = events.append(&system(2_000, EventType::Lock)).await.unwrap();
    let early = events.append(&system(1_000, EventType::Open)).await.unwrap();

    let ids: Vec<EventId> = events.all().await.unwrap().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![early, tie_a, tie_b, late]);
}

#[tokio::test]
async fn query_range_bounds_are_half_open() {
    let db = setup().await;
    let events = db.events();
    for ts in [1_000, 2_000, 3_000, 4_000] {
        events.append(&system(ts, EventType::Open)).await.unwrap();
    }

    let window = events
        .query_range(None, Some(2_000), Some(4_000))
        .await
        .unwrap();
    let stamps: Vec<i64> = window.iter().map(|e| e.timestamp_ms).collect();
    assert_eq!(stamps, vec![2_000, 3_000]);

    let open_ended = events.query_range(None, Some(3_000), None).await.unwrap();
    assert_eq!(open_ended.len(), 2);
}

#[tokio::test]
async fn query_range_filters_by_type() {
    let db = setup().await;
    let events = db.events();
    events.append(&system(1_000, EventType::Open)).await.unwrap();
    events.append(&system(2_000, EventType::Lock)).await.unwrap();
    events
        .append(&NewEvent::new(3_000, EventType::OverrideOpen, ActorId(5)))
        .await
        .unwrap();
    events.append(&system(4_000, EventType::Open)).await.unwrap();

    let opens = events
        .query_range(Some(EventType::Open), None, None)
        .await
        .unwrap();
    assert_eq!(opens.len(), 2);
    assert!(opens.iter().all(|e| e.event_type == EventType::Open));
}

#[tokio::test]
async fn query_range_limited_returns_the_earliest_events() {
    let db = setup().await;
    let events = db.events();
    for ts in [4_000, 1_000, 3_000, 2_000] {
        events.append(&system(ts, EventType::Open)).await.unwrap();
    }

    let first_two = events
        .query_range_limited(None, None, None, 2)
        .await
        .unwrap();
    let stamps: Vec<i64> = first_two.iter().map(|e| e.timestamp_ms).collect();
    assert_eq!(stamps, vec![1_000, 2_000]);

    let windowed = events
        .query_range_limited(None, Some(2_000), None, 10)
        .await
        .unwrap();
    assert_eq!(windowed.len(), 3);

    assert!(
        events
            .query_range_limited(None, None, None, 0)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn latest_walks_back_from_newest() {
    let db = setup().await;
    let events = db.events();

    assert!(events.latest(0).await.unwrap().is_none());

    events.append(&system(1_000, EventType::Open)).await.unwrap();
    events.append(&system(2_000, EventType::Lock)).await.unwrap();
    events
        .append(&NewEvent::new(3_000, EventType::OverrideLock, ActorId(3)))
        .await
        .unwrap();

    let newest = events.latest(0).await.unwrap().unwrap();
    assert_eq!(newest.event_type, EventType::OverrideLock);
    let previous = events.latest(1).await.unwrap().unwrap();
    assert_eq!(previous.event_type, EventType::Lock);
    assert!(events.latest(3).await.unwrap().is_none());
}

#[tokio::test]
async fn latest_boundary_skips_override_events() {
    let db = setup().await;
    let events = db.events();

    assert!(events.latest_boundary().await.unwrap().is_none());

    events.append(&system(1_000, EventType::Open)).await.unwrap();
    events
        .append(&NewEvent::new(2_000, EventType::OverrideOpen, ActorId(1)))
        .await
        .unwrap();
    events
        .append(&NewEvent::new(3_000, EventType::ClearOverride, ActorId(1)))
        .await
        .unwrap();

    let boundary = events.latest_boundary().await.unwrap().unwrap();
    assert_eq!(boundary.event_type, EventType::Open);
    assert_eq!(boundary.timestamp_ms, 1_000);
}

#[tokio::test]
async fn conditional_update_swaps_only_on_match() {
    let db = setup().await;
    let events = db.events();
    let id = events.append(&system(1_000, EventType::Open)).await.unwrap();

    let swapped = events
        .update_actor_if_equals(id, ActorId(42), ActorId::SYSTEM)
        .await
        .unwrap();
    assert!(swapped);

    // The actor is no longer the sentinel, so a second swap fails.
    let again = events
        .update_actor_if_equals(id, ActorId(43), ActorId::SYSTEM)
        .await
        .unwrap();
    assert!(!again);

    let event = events.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(event.actor, ActorId(42));
}

#[tokio::test]
async fn conditional_update_on_missing_id_is_false() {
    let db = setup().await;
    let swapped = db
        .events()
        .update_actor_if_equals(EventId(123), ActorId(1), ActorId::SYSTEM)
        .await
        .unwrap();
    assert!(!swapped);
}

#[tokio::test]
async fn concurrent_claims_have_exactly_one_winner() {
    let db = setup().await;
    let events = db.events();
    let id = events.append(&system(1_000, EventType::Lock)).await.unwrap();

    let mut handles = Vec::new();
    for actor in 1..=8 {
        let store = db.events();
        handles.push(tokio::spawn(async move {
            store
                .update_actor_if_equals(id, ActorId(actor), ActorId::SYSTEM)
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let event = events.get_by_id(id).await.unwrap().unwrap();
    assert_ne!(event.actor, ActorId::SYSTEM);
}

#[tokio::test]
async fn closed_pool_surfaces_storage_error() {
    let db = setup().await;
    let events = db.events();
    db.close().await;

    let result = events.append(&system(1_000, EventType::Open)).await;
    assert!(matches!(result, Err(DbError::Sqlite(_))));
}

// =============================================================================
// Reaction store
// =============================================================================

#[tokio::test]
async fn tracked_message_starts_with_no_reactors() {
    let db = setup().await;
    let reactions = db.reactions();

    reactions.track_message(MessageId(10)).await.unwrap();
    reactions.track_message(MessageId(10)).await.unwrap();

    let records = reactions.records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message_id, MessageId(10));
    assert!(records[0].reactors.is_empty());
}

#[tokio::test]
async fn replace_reactors_overwrites_the_set() {
    let db = setup().await;
    let reactions = db.reactions();

    let first: BTreeSet<ActorId> = [ActorId(1), ActorId(2), ActorId(3)].into_iter().collect();
    reactions.replace_reactors(MessageId(7), &first).await.unwrap();

    let second: BTreeSet<ActorId> = [ActorId(2), ActorId(9)].into_iter().collect();
    reactions.replace_reactors(MessageId(7), &second).await.unwrap();

    let records = reactions.records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].reactors, second);
}

#[tokio::test]
async fn tracking_does_not_clear_existing_reactors() {
    let db = setup().await;
    let reactions = db.reactions();

    let set: BTreeSet<ActorId> = [ActorId(4)].into_iter().collect();
    reactions.replace_reactors(MessageId(1), &set).await.unwrap();
    reactions.track_message(MessageId(1)).await.unwrap();

    let records = reactions.records().await.unwrap();
    assert_eq!(records[0].reactor_count(), 1);
}

#[tokio::test]
async fn message_ids_lists_every_tracked_message() {
    let db = setup().await;
    let reactions = db.reactions();

    reactions.track_message(MessageId(30)).await.unwrap();
    reactions.track_message(MessageId(10)).await.unwrap();
    reactions
        .replace_reactors(MessageId(20), &BTreeSet::new())
        .await
        .unwrap();

    let ids = reactions.message_ids().await.unwrap();
    assert_eq!(ids, vec![MessageId(10), MessageId(20), MessageId(30)]);
}

// =============================================================================
// Backup
// =============================================================================

#[tokio::test]
async fn backup_copies_events_and_reactions() {
    let db = setup().await;
    db.events()
        .append(&system(1_000, EventType::Open))
        .await
        .unwrap();
    db.events()
        .append(&NewEvent::new(2_000, EventType::Lock, ActorId(3)))
        .await
        .unwrap();
    let set: BTreeSet<ActorId> = [ActorId(8)].into_iter().collect();
    db.reactions().replace_reactors(MessageId(5), &set).await.unwrap();

    let path = std::env::temp_dir().join(format!(
        "doorbell-backup-copy-{}.sqlite",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    db.backup_to(&path).await.unwrap();

    let copy = Database::connect_url(&format!("sqlite://{}", path.display()))
        .await
        .unwrap();
    let events = copy.events().all().await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].actor, ActorId(3));
    assert_eq!(copy.reactions().records().await.unwrap()[0].reactors, set);

    copy.close().await;
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn backup_refuses_to_overwrite() {
    let db = setup().await;
    let path = std::env::temp_dir().join(format!(
        "doorbell-backup-existing-{}.sqlite",
        std::process::id()
    ));
    std::fs::write(&path, b"not a database").unwrap();

    let result = db.backup_to(&path).await;
    assert!(matches!(result, Err(DbError::Sqlite(_))));
    assert_eq!(std::fs::read(&path).unwrap(), b"not a database");

    let _ = std::fs::remove_file(&path);
}
