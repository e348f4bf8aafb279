//! Saga orchestration with compensating rollback.
//!
//! A saga is an ordered sequence of steps, each paired with a compensating
//! action. The orchestrator runs forward actions strictly sequentially
//! against a shared data store; on any step failure it unwinds previously
//! completed steps in reverse order, recording every attempt in a
//! persistent [`causeway_ledger::CompensationLedger`]. No multi-document
//! transaction support is required of the store.

mod cancel;
mod context;
mod error;
mod orchestrator;
mod run;
mod saga;
mod step;

pub use cancel::CancelToken;
pub use context::WorkflowContext;
pub use error::{CompensationError, SagaError};
pub use orchestrator::SagaOrchestrator;
pub use run::{RunStatus, WorkflowRun};
pub use saga::{Saga, SagaBuilder};
pub use step::{SagaStep, StepError};
