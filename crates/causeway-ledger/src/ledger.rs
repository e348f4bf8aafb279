use std::collections::HashSet;
use std::sync::Arc;

use causeway_core::{DataStore, Filter, ReadTarget, ReadVisibility, StoreError, WriteAck};
use thiserror::Error;

use crate::entry::{LedgerEntry, Outcome, Phase};

/// Store collection holding ledger rows.
pub const LEDGER_COLLECTION: &str = "saga_ledger";

#[derive(Debug, Error)]
pub enum LedgerError {
    /// An entry could not be persisted. Fatal for the phase that produced
    /// it: an unobservable compensation is worse than a failed one.
    #[error("ledger append failed: {0}")]
    Append(#[source] StoreError),

    #[error("ledger scan failed: {0}")]
    Scan(#[source] StoreError),

    #[error("malformed ledger row: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Persistent, append-only log of step and compensation outcomes.
///
/// Entries are written under the ledger's own acknowledgment threshold,
/// independent of the workflow's profile: audit rows should not lose
/// durability just because the workflow chose fast writes.
pub struct CompensationLedger {
    store: Arc<dyn DataStore>,
    ack: WriteAck,
}

impl CompensationLedger {
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>, ack: WriteAck) -> Self {
        Self { store, ack }
    }

    /// Append one entry. Write-once; nothing here ever updates a row.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Append`] if the store cannot persist the
    /// entry under the ledger's acknowledgment threshold.
    pub fn append(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        let document = entry.to_document()?;
        self.store
            .write(LEDGER_COLLECTION, document, self.ack)
            .map_err(LedgerError::Append)
    }

    /// All entries for `run_id`, ordered by timestamp (stable with respect
    /// to append order on ties). Finite and restartable: call again for a
    /// fresh scan.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Scan`] if the store read fails, or
    /// [`LedgerError::Malformed`] if a row does not deserialize.
    pub fn entries_for(&self, run_id: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        // Recovery and audit read their own writes from the primary.
        let documents = self
            .store
            .read(
                LEDGER_COLLECTION,
                &Filter::new().field_eq("run_id", run_id),
                ReadVisibility::Local,
                ReadTarget::Primary,
            )
            .map_err(LedgerError::Scan)?;

        let mut entries = documents
            .into_iter()
            .map(LedgerEntry::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|entry| entry.timestamp);
        Ok(entries)
    }

    /// Step names with a successful compensation entry for `run_id`. Feeds
    /// crash recovery: these steps must not be compensated again.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`CompensationLedger::entries_for`].
    pub fn compensated_steps(&self, run_id: &str) -> Result<HashSet<String>, LedgerError> {
        Ok(self
            .entries_for(run_id)?
            .into_iter()
            .filter(|entry| entry.phase == Phase::Compensate && entry.outcome == Outcome::Success)
            .map(|entry| entry.step_name)
            .collect())
    }
}
