//! Crash recovery: a run found mid-compensation is finished from the
//! ledger, replaying only the compensations that never made it.

use std::cell::RefCell;
use std::sync::Arc;

use causeway_core::{DataStore, MemoryStore, RetryPolicy, WriteAck};
use causeway_ledger::{CompensationLedger, LedgerEntry, Outcome, Phase};
use causeway_saga::{RunStatus, Saga, SagaBuilder, SagaError, SagaOrchestrator, SagaStep, StepError, WorkflowRun};

struct UndoLog {
    undone: RefCell<Vec<String>>,
}

impl UndoLog {
    fn new() -> Self {
        Self {
            undone: RefCell::new(Vec::new()),
        }
    }
}

struct RevertibleStep {
    name: &'static str,
}

impl SagaStep for RevertibleStep {
    type Context = UndoLog;

    fn name(&self) -> &'static str {
        self.name
    }

    fn forward(&self, _ctx: &UndoLog) -> Result<(), StepError> {
        Ok(())
    }

    fn compensate(&self, ctx: &UndoLog) -> Result<(), StepError> {
        ctx.undone.borrow_mut().push(self.name.to_string());
        Ok(())
    }
}

struct StuckCompensation {
    name: &'static str,
}

impl SagaStep for StuckCompensation {
    type Context = UndoLog;

    fn name(&self) -> &'static str {
        self.name
    }

    fn forward(&self, _ctx: &UndoLog) -> Result<(), StepError> {
        Ok(())
    }

    fn compensate(&self, _ctx: &UndoLog) -> Result<(), StepError> {
        Err(StepError::Rejected("inverse unavailable".to_string()))
    }
}

fn saga() -> Saga<UndoLog> {
    SagaBuilder::new()
        .step(RevertibleStep { name: "debit" })
        .step(RevertibleStep { name: "transfer" })
        .step(RevertibleStep { name: "notify" })
        .build()
}

fn orchestrator(store: &Arc<MemoryStore>) -> SagaOrchestrator {
    let ledger = CompensationLedger::new(Arc::clone(store) as Arc<dyn DataStore>, WriteAck::Majority);
    SagaOrchestrator::new(ledger).with_retry_policy(RetryPolicy::immediate(2))
}

#[test]
fn resume_replays_only_unrecorded_compensations() {
    let store = Arc::new(MemoryStore::default());
    let orchestrator = orchestrator(&store);
    let ctx = UndoLog::new();

    // The crashed process got as far as compensating "notify".
    orchestrator
        .ledger()
        .append(&LedgerEntry::new(
            "run-crashed",
            "notify",
            Phase::Compensate,
            Outcome::Success,
        ))
        .expect("seed ledger");

    let run = WorkflowRun::resumed(
        "run-crashed",
        vec![
            "debit".to_string(),
            "transfer".to_string(),
            "notify".to_string(),
        ],
    );
    let run = orchestrator.resume(&saga(), &ctx, run);

    assert_eq!(run.status(), RunStatus::Compensated);
    assert_eq!(*ctx.undone.borrow(), vec!["transfer", "debit"]);
}

#[test]
fn resume_with_empty_ledger_compensates_everything() {
    let store = Arc::new(MemoryStore::default());
    let orchestrator = orchestrator(&store);
    let ctx = UndoLog::new();

    let run = WorkflowRun::resumed(
        "run-crashed",
        vec!["debit".to_string(), "transfer".to_string()],
    );
    let run = orchestrator.resume(&saga(), &ctx, run);

    assert_eq!(run.status(), RunStatus::Compensated);
    assert_eq!(*ctx.undone.borrow(), vec!["transfer", "debit"]);
}

#[test]
fn resume_records_its_own_compensations() {
    let store = Arc::new(MemoryStore::default());
    let orchestrator = orchestrator(&store);
    let ctx = UndoLog::new();

    let run = WorkflowRun::resumed("run-crashed", vec!["debit".to_string()]);
    orchestrator.resume(&saga(), &ctx, run);

    let entries = orchestrator
        .ledger()
        .entries_for("run-crashed")
        .expect("ledger scan");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].step_name, "debit");
    assert_eq!(entries[0].phase, Phase::Compensate);
    assert_eq!(entries[0].outcome, Outcome::Success);
}

#[test]
fn committed_runs_are_not_touched_by_resume() {
    let store = Arc::new(MemoryStore::default());
    let orchestrator = orchestrator(&store);
    let ctx = UndoLog::new();

    let run = orchestrator.execute(&saga(), &ctx, "run-ok");
    assert_eq!(run.status(), RunStatus::Committed);

    let run = orchestrator.resume(&saga(), &ctx, run);
    assert_eq!(run.status(), RunStatus::Committed);
    assert!(ctx.undone.borrow().is_empty());
}

#[test]
fn failed_recovery_reports_the_stuck_steps() {
    let store = Arc::new(MemoryStore::default());
    let orchestrator = orchestrator(&store);
    let ctx = UndoLog::new();

    let saga: Saga<UndoLog> = SagaBuilder::new()
        .step(RevertibleStep { name: "debit" })
        .step(StuckCompensation { name: "transfer" })
        .build();

    let run = WorkflowRun::resumed(
        "run-crashed",
        vec!["debit".to_string(), "transfer".to_string()],
    );
    let run = orchestrator.resume(&saga, &ctx, run);

    assert_eq!(run.status(), RunStatus::Failed);
    match run.failure() {
        Some(SagaError::RecoveryFailed {
            compensation_errors,
        }) => {
            assert_eq!(compensation_errors.len(), 1);
            assert_eq!(compensation_errors[0].step, "transfer");
        }
        other => panic!("expected RecoveryFailed, got {other:?}"),
    }
    // Recovery pressed on past the stuck step.
    assert_eq!(*ctx.undone.borrow(), vec!["debit"]);
}
