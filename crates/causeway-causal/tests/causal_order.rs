//! Integration tests: version allocation and order verification against an
//! in-memory replica set.

use std::collections::HashSet;
use std::sync::Arc;

use causeway_causal::{CausalError, CausalOrderTracker};
use causeway_core::{ConsistencyProfile, MemoryStore};
use serde_json::json;

fn tracker_on(store: Arc<MemoryStore>, profile: ConsistencyProfile) -> CausalOrderTracker {
    CausalOrderTracker::new(store, profile)
}

#[test]
fn versions_start_at_one_and_increase_strictly() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::default());
    let tracker = tracker_on(store, ConsistencyProfile::strong());

    let create = tracker.record("post1", None, json!({"operation": "create"}))?;
    assert_eq!(create.version, 1);

    let edit = tracker.record("post1", Some(1), json!({"operation": "edit"}))?;
    assert_eq!(edit.version, 2);
    assert_eq!(edit.depends_on, Some(1));
    Ok(())
}

#[test]
fn unknown_dependency_is_rejected() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::default());
    let tracker = tracker_on(store, ConsistencyProfile::strong());

    tracker.record("post1", None, json!({"operation": "create"}))?;
    tracker.record("post1", Some(1), json!({"operation": "edit"}))?;

    let result = tracker.record("post1", Some(5), json!({"operation": "comment"}));
    match result {
        Err(CausalError::InvalidDependency {
            depends_on, version, ..
        }) => {
            assert_eq!(depends_on, 5);
            assert_eq!(version, 3);
        }
        other => panic!("expected InvalidDependency, got {other:?}"),
    }
    Ok(())
}

#[test]
fn zero_dependency_is_rejected() {
    let store = Arc::new(MemoryStore::default());
    let tracker = tracker_on(store, ConsistencyProfile::strong());

    let result = tracker.record("post1", Some(0), json!({}));
    assert!(matches!(
        result,
        Err(CausalError::InvalidDependency { .. })
    ));
}

#[test]
fn rejected_record_does_not_consume_a_version() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::default());
    let tracker = tracker_on(Arc::clone(&store), ConsistencyProfile::strong());

    tracker.record("post1", None, json!({}))?;
    store.inject_write_faults(1);
    assert!(matches!(
        tracker.record("post1", None, json!({})),
        Err(CausalError::Store(_))
    ));

    // The failed attempt must not leave a gap.
    let next = tracker.record("post1", None, json!({}))?;
    assert_eq!(next.version, 2);
    Ok(())
}

#[test]
fn entities_allocate_independently() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::default());
    let tracker = tracker_on(store, ConsistencyProfile::strong());

    assert_eq!(tracker.record("post1", None, json!({}))?.version, 1);
    assert_eq!(tracker.record("post2", None, json!({}))?.version, 1);
    assert_eq!(tracker.record("post1", Some(1), json!({}))?.version, 2);
    Ok(())
}

#[test]
fn concurrent_producers_never_reuse_a_version() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::default());
    let tracker = Arc::new(tracker_on(store, ConsistencyProfile::strong()));

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let tracker = Arc::clone(&tracker);
            scope.spawn(move || {
                for _ in 0..25 {
                    tracker
                        .record("post1", None, json!({}))
                        .expect("record succeeds");
                }
            });
        }
    });

    let report = tracker.verify_order("post1")?;
    let unique: HashSet<_> = report.observed_versions.iter().copied().collect();
    assert_eq!(report.observed_versions.len(), 100);
    assert_eq!(unique.len(), 100);
    assert_eq!(report.observed_versions.iter().max(), Some(&100));
    Ok(())
}

#[test]
fn strong_profile_never_observes_a_violation() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::default());
    let tracker = tracker_on(store, ConsistencyProfile::strong());

    // The social-post history from the causal experiment: create, edit,
    // like (concurrent with edit), comment on the edit.
    tracker.record("post1", None, json!({"operation": "create"}))?;
    tracker.record("post1", Some(1), json!({"operation": "edit"}))?;
    tracker.record("post1", Some(1), json!({"operation": "like"}))?;
    tracker.record("post1", Some(2), json!({"operation": "comment"}))?;

    let report = tracker.verify_order("post1")?;
    assert!(report.is_consistent());
    assert_eq!(report.observed_versions, vec![1, 2, 3, 4]);
    Ok(())
}

#[test]
fn lagging_replica_applying_out_of_order_is_reported() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::default());
    let tracker = tracker_on(Arc::clone(&store), ConsistencyProfile::eventual());

    store.pause_replication();
    tracker.record("post1", None, json!({"operation": "create"}))?;
    tracker.record("post1", Some(1), json!({"operation": "edit"}))?;

    // The read replica applies the edit before the create.
    store.apply_oplog_entry(0, 1);
    store.apply_oplog_entry(0, 0);

    let report = tracker.verify_order("post1")?;
    assert!(!report.is_consistent());
    assert_eq!(report.observed_versions, vec![2, 1]);
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].version, 2);
    assert_eq!(report.violations[0].depends_on, 1);
    Ok(())
}

#[test]
fn violation_clears_once_replica_catches_up() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::default());
    let tracker = tracker_on(Arc::clone(&store), ConsistencyProfile::eventual());

    store.pause_replication();
    tracker.record("post1", None, json!({}))?;
    tracker.record("post1", Some(1), json!({}))?;

    store.resume_replication();
    let report = tracker.verify_order("post1")?;
    assert!(report.is_consistent());
    Ok(())
}
