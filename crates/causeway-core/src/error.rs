use thiserror::Error;

/// Failure shapes a data store may report.
///
/// `Rejected` is a logical failure (constraint violation, precondition not
/// met) and is never worth retrying; `Unavailable` means the requested
/// acknowledgment or visibility threshold could not be satisfied and may
/// clear up on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("operation rejected: {0}")]
    Rejected(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the failure is transient and a bounded retry is reasonable.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
