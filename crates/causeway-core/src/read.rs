use std::thread;

use crate::document::{Document, Filter};
use crate::error::StoreResult;
use crate::profile::{ConsistencyProfile, ReadVisibility};
use crate::retry::RetryPolicy;
use crate::store::DataStore;

/// Outcome of a bounded-retry read.
///
/// Under weak visibility an absent document is ambiguous: it may not exist,
/// or it may simply not have replicated yet. The two cases are distinct
/// outcomes so callers never mistake replication lag for absence.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadVisibilityOutcome {
    Found(Document),
    /// The polling budget ran out under local visibility. The document may
    /// still appear.
    NotYetVisible,
    /// An authoritative (majority) read confirmed the document is absent.
    NotFound,
}

/// Poll for a single document under `profile`, backing off per `policy`.
///
/// Replaces ad hoc read-until-it-appears loops: under
/// [`ReadVisibility::Local`] a miss is retried until the policy's attempts
/// are exhausted, then reported as [`ReadVisibilityOutcome::NotYetVisible`];
/// under [`ReadVisibility::Majority`] the first miss is authoritative.
///
/// # Errors
///
/// Returns an error if the store cannot satisfy the profile's read path.
pub fn poll_read(
    store: &dyn DataStore,
    collection: &str,
    filter: &Filter,
    profile: ConsistencyProfile,
    policy: &RetryPolicy,
) -> StoreResult<ReadVisibilityOutcome> {
    for attempt in 0..policy.max_attempts() {
        let found = store.read_one(
            collection,
            filter,
            profile.read_visibility(),
            profile.read_target(),
        )?;
        match found {
            Some(document) => return Ok(ReadVisibilityOutcome::Found(document)),
            None if profile.read_visibility() == ReadVisibility::Majority => {
                return Ok(ReadVisibilityOutcome::NotFound);
            }
            None => {
                if attempt + 1 < policy.max_attempts() {
                    thread::sleep(policy.delay_for(attempt));
                }
            }
        }
    }
    Ok(ReadVisibilityOutcome::NotYetVisible)
}
