use std::fmt;

use crate::error::SagaError;

/// Lifecycle of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Running,
    Committed,
    Compensating,
    Compensated,
    /// A compensation exhausted its retry budget. Not terminal: the run is
    /// a retry candidate for [`crate::SagaOrchestrator::resume`], and
    /// ultimately a human-escalation condition.
    Failed,
}

impl RunStatus {
    /// `Committed` and `Compensated` are the only terminal states.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Compensated)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Committed => "committed",
            Self::Compensating => "compensating",
            Self::Compensated => "compensated",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// State of one orchestrated execution. Owned and mutated exclusively by
/// the orchestrator that drives it.
#[derive(Debug)]
pub struct WorkflowRun {
    run_id: String,
    status: RunStatus,
    completed_steps: Vec<String>,
    failure: Option<SagaError>,
}

impl WorkflowRun {
    pub(crate) fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::Pending,
            completed_steps: Vec::new(),
            failure: None,
        }
    }

    /// Reconstruct a run found mid-compensation after a crash, for handing
    /// to [`crate::SagaOrchestrator::resume`]. `completed_steps` must be
    /// the forward completion order recorded before the crash.
    #[must_use]
    pub fn resumed(run_id: impl Into<String>, completed_steps: Vec<String>) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::Compensating,
            completed_steps,
            failure: None,
        }
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    #[must_use]
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Step names in forward completion order.
    #[must_use]
    pub fn completed_steps(&self) -> &[String] {
        &self.completed_steps
    }

    #[must_use]
    pub fn failure(&self) -> Option<&SagaError> {
        self.failure.as_ref()
    }

    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.status == RunStatus::Committed
    }

    pub(crate) fn set_status(&mut self, status: RunStatus) {
        self.status = status;
    }

    pub(crate) fn push_completed(&mut self, step_name: &str) {
        self.completed_steps.push(step_name.to_string());
    }

    pub(crate) fn set_failure(&mut self, failure: SagaError) {
        self.failure = Some(failure);
    }
}
