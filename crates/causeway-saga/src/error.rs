use causeway_ledger::LedgerError;
use thiserror::Error;

use crate::step::StepError;

/// A compensation that did not complete within its retry budget.
#[derive(Debug, Error)]
#[error("compensation failed for step '{step}': {description}")]
pub struct CompensationError {
    /// Name of the step whose compensation failed.
    pub step: String,
    /// What the compensation was trying to do.
    pub description: String,
    /// The final error after retries were exhausted.
    #[source]
    pub error: StepError,
}

/// Structured failure of a workflow run.
///
/// Callers can always distinguish "rolled back cleanly" from "rollback
/// incomplete": `StepFailed` accompanies a `Compensated` run, while
/// `CompensationFailed` and `RecoveryFailed` accompany a `Failed` run and
/// carry the full list of steps whose compensation did not complete,
/// which is the payload a human operator needs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SagaError {
    /// A forward action failed and every completed step was compensated.
    #[error("step '{step}' failed")]
    StepFailed {
        step: String,
        #[source]
        source: StepError,
    },

    /// A forward action failed and at least one compensation also failed
    /// after exhausting its retries.
    #[error(
        "step '{failed_step}' failed, and {} compensation(s) did not complete",
        compensation_errors.len()
    )]
    CompensationFailed {
        failed_step: String,
        step_error: StepError,
        compensation_errors: Vec<CompensationError>,
    },

    /// Resumed compensation after a crash left steps uncompensated.
    #[error("recovery left {} compensation(s) incomplete", compensation_errors.len())]
    RecoveryFailed {
        compensation_errors: Vec<CompensationError>,
    },

    /// The compensation ledger itself could not be read during recovery.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
