use std::collections::HashSet;
use std::thread;

use causeway_core::RetryPolicy;
use causeway_ledger::{CompensationLedger, LedgerEntry, Outcome, Phase};
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::{CompensationError, SagaError};
use crate::run::{RunStatus, WorkflowRun};
use crate::saga::Saga;
use crate::step::{SagaStep, StepError};

/// Executes sagas step by step and unwinds them on failure.
///
/// Steps run strictly sequentially: step N+1 never starts before step N's
/// forward action has durably committed under the active profile's write
/// acknowledgment. The linearity buys a simple LIFO compensation order.
/// Every attempted phase, including retries, lands in the ledger as
/// exactly one entry before the orchestrator moves on.
pub struct SagaOrchestrator {
    ledger: CompensationLedger,
    retry: RetryPolicy,
}

struct ForwardFailure {
    error: StepError,
    /// The action itself committed but its ledger entry could not be
    /// written. The step must still be unwound.
    committed: bool,
}

impl SagaOrchestrator {
    #[must_use]
    pub fn new(ledger: CompensationLedger) -> Self {
        Self {
            ledger,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The ledger this orchestrator records into, for audit reads.
    #[must_use]
    pub fn ledger(&self) -> &CompensationLedger {
        &self.ledger
    }

    /// Run every step of `saga` in order under the caller's context.
    pub fn execute<C>(&self, saga: &Saga<C>, ctx: &C, run_id: impl Into<String>) -> WorkflowRun {
        self.execute_cancellable(saga, ctx, run_id, &CancelToken::new())
    }

    /// Like [`SagaOrchestrator::execute`], honoring `cancel` between steps.
    /// A cancelled run compensates exactly as a failed one.
    pub fn execute_cancellable<C>(
        &self,
        saga: &Saga<C>,
        ctx: &C,
        run_id: impl Into<String>,
        cancel: &CancelToken,
    ) -> WorkflowRun {
        let mut run = WorkflowRun::new(run_id);
        run.set_status(RunStatus::Running);
        let run_id = run.run_id().to_string();

        for step in saga.steps() {
            if cancel.is_cancelled() {
                debug!(run = %run_id, step = step.name(), "run cancelled before step");
                let cause =
                    StepError::Rejected(format!("run cancelled before step '{}'", step.name()));
                return self.unwind(saga, ctx, run, step.name(), cause);
            }
            match self.run_forward(step.as_ref(), ctx, &run_id) {
                Ok(()) => run.push_completed(step.name()),
                Err(failure) => {
                    if failure.committed {
                        run.push_completed(step.name());
                    }
                    return self.unwind(saga, ctx, run, step.name(), failure.error);
                }
            }
        }

        run.set_status(RunStatus::Committed);
        debug!(
            run = %run_id,
            steps = run.completed_steps().len(),
            "workflow committed"
        );
        run
    }

    /// Finish compensating a run found in `Compensating` after a crash.
    ///
    /// Steps with a successful compensation entry already in the ledger are
    /// skipped; the rest are unwound in reverse completion order. Runs in
    /// any other status are returned untouched.
    pub fn resume<C>(&self, saga: &Saga<C>, ctx: &C, mut run: WorkflowRun) -> WorkflowRun {
        if run.status() != RunStatus::Compensating {
            return run;
        }
        let already_compensated = match self.ledger.compensated_steps(run.run_id()) {
            Ok(done) => done,
            Err(error) => {
                warn!(run = run.run_id(), error = %error, "cannot read ledger for recovery");
                run.set_status(RunStatus::Failed);
                run.set_failure(SagaError::Ledger(error));
                return run;
            }
        };

        let errors = self.compensate_completed(saga, ctx, &run, &already_compensated);
        if errors.is_empty() {
            run.set_status(RunStatus::Compensated);
        } else {
            run.set_status(RunStatus::Failed);
            run.set_failure(SagaError::RecoveryFailed {
                compensation_errors: errors,
            });
        }
        run
    }

    fn run_forward<C>(
        &self,
        step: &dyn SagaStep<Context = C>,
        ctx: &C,
        run_id: &str,
    ) -> Result<(), ForwardFailure> {
        let mut attempt = 0u32;
        loop {
            let result = step.forward(ctx);
            let outcome = if result.is_ok() {
                Outcome::Success
            } else {
                Outcome::Failure
            };
            if let Err(error) = self.ledger.append(&LedgerEntry::new(
                run_id,
                step.name(),
                Phase::Forward,
                outcome,
            )) {
                // Fatal for the phase: an unrecorded step cannot be trusted.
                warn!(run = run_id, step = step.name(), error = %error, "ledger append failed in forward phase");
                return Err(ForwardFailure {
                    error: StepError::Unavailable(format!("ledger append failed: {error}")),
                    committed: result.is_ok(),
                });
            }

            match result {
                Ok(()) => {
                    debug!(run = run_id, step = step.name(), attempt, "forward action committed");
                    return Ok(());
                }
                Err(error) if error.is_transient() && attempt + 1 < self.retry.max_attempts() => {
                    warn!(
                        run = run_id,
                        step = step.name(),
                        attempt,
                        error = %error,
                        "transient store failure, backing off"
                    );
                    thread::sleep(self.retry.delay_for(attempt));
                    attempt += 1;
                }
                Err(error) if error.is_transient() => {
                    return Err(ForwardFailure {
                        error: StepError::Rejected(format!(
                            "store unavailable after {} attempts: {error}",
                            self.retry.max_attempts()
                        )),
                        committed: false,
                    });
                }
                Err(error) => {
                    return Err(ForwardFailure {
                        error,
                        committed: false,
                    });
                }
            }
        }
    }

    fn unwind<C>(
        &self,
        saga: &Saga<C>,
        ctx: &C,
        mut run: WorkflowRun,
        failed_step: &str,
        cause: StepError,
    ) -> WorkflowRun {
        warn!(run = run.run_id(), step = failed_step, error = %cause, "unwinding workflow");
        run.set_status(RunStatus::Compensating);

        let errors = self.compensate_completed(saga, ctx, &run, &HashSet::new());
        if errors.is_empty() {
            run.set_status(RunStatus::Compensated);
            run.set_failure(SagaError::StepFailed {
                step: failed_step.to_string(),
                source: cause,
            });
        } else {
            run.set_status(RunStatus::Failed);
            run.set_failure(SagaError::CompensationFailed {
                failed_step: failed_step.to_string(),
                step_error: cause,
                compensation_errors: errors,
            });
        }
        run
    }

    /// Compensate completed steps in reverse completion order, skipping
    /// `skip`. A failed compensation is recorded and unwinding continues so
    /// the escalation report names every uncompensated step.
    fn compensate_completed<C>(
        &self,
        saga: &Saga<C>,
        ctx: &C,
        run: &WorkflowRun,
        skip: &HashSet<String>,
    ) -> Vec<CompensationError> {
        let mut errors = Vec::new();
        for name in run.completed_steps().iter().rev() {
            if skip.contains(name) {
                debug!(run = run.run_id(), step = %name, "already compensated, skipping");
                continue;
            }
            let Some(step) = saga.step_named(name) else {
                errors.push(CompensationError {
                    step: name.clone(),
                    description: format!("undo {name}"),
                    error: StepError::Rejected("step not present in saga definition".to_string()),
                });
                continue;
            };
            if let Err(error) = self.run_compensation(step, ctx, run.run_id()) {
                errors.push(CompensationError {
                    step: name.clone(),
                    description: step.compensation_description(),
                    error,
                });
            }
        }
        errors
    }

    fn run_compensation<C>(
        &self,
        step: &dyn SagaStep<Context = C>,
        ctx: &C,
        run_id: &str,
    ) -> Result<(), StepError> {
        let mut attempt = 0u32;
        loop {
            let result = step.compensate(ctx);
            let outcome = if result.is_ok() {
                Outcome::Success
            } else {
                Outcome::Failure
            };
            if let Err(error) = self.ledger.append(&LedgerEntry::new(
                run_id,
                step.name(),
                Phase::Compensate,
                outcome,
            )) {
                // Even a compensation that applied counts as failed if it
                // could not be recorded.
                warn!(run = run_id, step = step.name(), error = %error, "ledger append failed in compensate phase");
                return Err(StepError::Unavailable(format!(
                    "ledger append failed: {error}"
                )));
            }

            match result {
                Ok(()) => {
                    debug!(run = run_id, step = step.name(), attempt, "compensation completed");
                    return Ok(());
                }
                Err(error) if attempt + 1 < self.retry.max_attempts() => {
                    warn!(
                        run = run_id,
                        step = step.name(),
                        attempt,
                        error = %error,
                        "compensation failed, backing off"
                    );
                    thread::sleep(self.retry.delay_for(attempt));
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
