//! Append-only ledger of step outcomes for saga workflow runs.
//!
//! Every forward and compensating action attempted by an orchestrator lands
//! here as exactly one [`LedgerEntry`], including retries. Entries are never
//! rewritten; the ledger is both the audit trail and the input to crash
//! recovery.

mod entry;
mod ledger;

pub use entry::{LedgerEntry, Outcome, Phase};
pub use ledger::{CompensationLedger, LEDGER_COLLECTION, LedgerError};
