use causeway_core::StoreError;
use thiserror::Error;

/// Failure of a single forward or compensating action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// A precondition failed (insufficient stock, constraint violation).
    /// Terminal for the step; never retried.
    #[error("step rejected: {0}")]
    Rejected(String),

    /// The store could not satisfy the requested acknowledgment threshold.
    /// Retried with bounded backoff before being escalated to a rejection.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StepError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<StoreError> for StepError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Rejected(msg) => Self::Rejected(msg),
            StoreError::Unavailable(msg) => Self::Unavailable(msg),
        }
    }
}

/// A step in a saga that can be executed and compensated.
///
/// Steps share a caller-chosen context (typically a
/// [`crate::WorkflowContext`] carrying the injected store handle and the
/// active consistency profile) and carry their own parameters. A step that
/// mutates shared state must supply a compensating action that is a true
/// logical inverse of the forward action, not merely a deletion, and both
/// actions must be idempotent: a compensation retried after a crash must
/// leave the store as if it had run once.
pub trait SagaStep: Send + Sync {
    /// Shared dependencies, injected rather than threaded between steps.
    type Context;

    /// Name used in ledger entries and error reports. Unique within a saga.
    fn name(&self) -> &'static str;

    /// Execute the step's effect against the store.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Rejected`] when a precondition fails and
    /// [`StepError::Unavailable`] when the store cannot acknowledge.
    fn forward(&self, ctx: &Self::Context) -> Result<(), StepError>;

    /// Undo the step's effect. Called during rollback when a later step
    /// fails; never called for the step that failed, since it never
    /// committed.
    ///
    /// The default implementation is a no-op, suitable for read-only steps.
    ///
    /// # Errors
    ///
    /// Returns an error if compensation fails.
    fn compensate(&self, ctx: &Self::Context) -> Result<(), StepError> {
        let _ = ctx;
        Ok(())
    }

    /// Human-readable description of what compensation will do.
    fn compensation_description(&self) -> String {
        format!("undo {}", self.name())
    }
}
