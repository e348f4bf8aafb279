use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use causeway_core::{ConsistencyProfile, DataStore, Filter, StoreError};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::event::{CAUSAL_COLLECTION, CausalEvent};

#[derive(Debug, Error)]
pub enum CausalError {
    /// The referenced dependency does not exist or is not strictly smaller
    /// than the version being allocated. Caller error; never retried.
    #[error(
        "invalid dependency for entity '{entity_id}': \
         version {depends_on} does not precede new version {version}"
    )]
    InvalidDependency {
        entity_id: String,
        depends_on: u64,
        version: u64,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("malformed causal event row: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A dependent event observed before the event it depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CausalViolation {
    /// Version of the out-of-place event.
    pub version: u64,
    /// The dependency that had not been observed yet.
    pub depends_on: u64,
    /// Zero-based position in the observed sequence.
    pub position: usize,
}

/// Result of a read-order verification. Violations are findings, not
/// control-flow errors: whether one is acceptable depends on the profile
/// the events were read under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub entity_id: String,
    pub observed_versions: Vec<u64>,
    pub violations: Vec<CausalViolation>,
}

impl VerificationReport {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check an observed event sequence for dependency-order violations.
///
/// An event with `depends_on = D` must appear at or after the event with
/// version `D`. Events without a dependency relation are concurrent; any
/// relative order between them is acceptable.
#[must_use]
pub fn verify_observed(entity_id: &str, events: &[CausalEvent]) -> VerificationReport {
    let mut seen: HashSet<u64> = HashSet::new();
    let mut violations = Vec::new();

    for (position, event) in events.iter().enumerate() {
        if let Some(depends_on) = event.depends_on {
            if !seen.contains(&depends_on) {
                violations.push(CausalViolation {
                    version: event.version,
                    depends_on,
                    position,
                });
            }
        }
        seen.insert(event.version);
    }

    VerificationReport {
        entity_id: entity_id.to_string(),
        observed_versions: events.iter().map(|e| e.version).collect(),
        violations,
    }
}

/// Allocates logical versions and verifies causal read order.
///
/// Version allocation plus the store append form one critical section per
/// entity: producers of the same entity serialize on that entity's clock,
/// while distinct entities allocate independently.
pub struct CausalOrderTracker {
    store: Arc<dyn DataStore>,
    profile: ConsistencyProfile,
    clocks: Mutex<HashMap<String, Arc<Mutex<u64>>>>,
}

impl CausalOrderTracker {
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>, profile: ConsistencyProfile) -> Self {
        Self {
            store,
            profile,
            clocks: Mutex::new(HashMap::new()),
        }
    }

    fn clock_for(&self, entity_id: &str) -> Arc<Mutex<u64>> {
        let mut clocks = self.clocks.lock().expect("clock registry lock poisoned");
        Arc::clone(
            clocks
                .entry(entity_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(0))),
        )
    }

    /// Record a new event for `entity_id`, allocating the next version.
    ///
    /// Versions start at 1 and increase strictly. A failed store write does
    /// not consume a version number.
    ///
    /// # Errors
    ///
    /// Returns [`CausalError::InvalidDependency`] if `depends_on` does not
    /// name an existing, strictly smaller version of the same entity, or a
    /// store error if the event cannot be persisted under the tracker's
    /// write acknowledgment threshold.
    pub fn record(
        &self,
        entity_id: &str,
        depends_on: Option<u64>,
        payload: Value,
    ) -> Result<CausalEvent, CausalError> {
        let clock = self.clock_for(entity_id);
        let mut current = clock.lock().expect("entity clock lock poisoned");
        let version = *current + 1;

        if let Some(dep) = depends_on {
            if dep == 0 || dep >= version {
                return Err(CausalError::InvalidDependency {
                    entity_id: entity_id.to_string(),
                    depends_on: dep,
                    version,
                });
            }
        }

        let event = CausalEvent {
            entity_id: entity_id.to_string(),
            version,
            depends_on,
            payload,
            timestamp: Utc::now(),
        };
        self.store.write(
            CAUSAL_COLLECTION,
            event.to_document()?,
            self.profile.write_ack(),
        )?;
        *current = version;

        debug!(
            entity = entity_id,
            version,
            depends_on = ?depends_on,
            "recorded causal event"
        );
        Ok(event)
    }

    /// Read back every event of `entity_id` in the physical order the
    /// tracker's read path observes them, and report any event seen before
    /// its dependency.
    ///
    /// # Errors
    ///
    /// Returns a store error if the read path cannot satisfy the tracker's
    /// visibility settings, or [`CausalError::Malformed`] on an undecodable
    /// row. A causal violation is reported in the result, never as an error.
    pub fn verify_order(&self, entity_id: &str) -> Result<VerificationReport, CausalError> {
        let documents = self.store.read(
            CAUSAL_COLLECTION,
            &Filter::new().field_eq("entity_id", entity_id),
            self.profile.read_visibility(),
            self.profile.read_target(),
        )?;
        let events = documents
            .into_iter()
            .map(CausalEvent::from_document)
            .collect::<Result<Vec<_>, _>>()?;

        let report = verify_observed(entity_id, &events);
        if !report.is_consistent() {
            warn!(
                entity = entity_id,
                violations = report.violations.len(),
                "causal order violated in observed sequence"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event(version: u64, depends_on: Option<u64>) -> CausalEvent {
        CausalEvent {
            entity_id: "post1".to_string(),
            version,
            depends_on,
            payload: json!({}),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn version_order_reads_clean() {
        let events = [event(1, None), event(2, Some(1)), event(3, Some(2))];
        assert!(verify_observed("post1", &events).is_consistent());
    }

    #[test]
    fn concurrent_events_may_appear_in_either_order() {
        // v2 and v3 both depend only on v1; [v1, v3, v2] is acceptable.
        let events = [event(1, None), event(3, Some(1)), event(2, Some(1))];
        assert!(verify_observed("post1", &events).is_consistent());
    }

    #[test]
    fn dependent_before_dependency_is_a_violation() {
        let events = [event(2, Some(1)), event(1, None)];
        let report = verify_observed("post1", &events);
        assert_eq!(
            report.violations,
            vec![CausalViolation {
                version: 2,
                depends_on: 1,
                position: 0,
            }]
        );
    }

    #[test]
    fn report_captures_observed_sequence() {
        let events = [event(1, None), event(2, Some(1))];
        let report = verify_observed("post1", &events);
        assert_eq!(report.observed_versions, vec![1, 2]);
        assert_eq!(report.entity_id, "post1");
    }

    #[test]
    fn empty_history_is_consistent() {
        assert!(verify_observed("post1", &[]).is_consistent());
    }
}
