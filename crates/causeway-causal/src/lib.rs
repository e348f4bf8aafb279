//! Causal-order tracking over a replicated document store.
//!
//! [`CausalOrderTracker`] hands out strictly increasing logical version
//! numbers per entity, records an optional single-predecessor dependency
//! for each event, and verifies on read-back that dependent events are
//! observed at or after their dependency, whatever the physical write
//! timing was.

mod event;
mod tracker;

pub use event::{CAUSAL_COLLECTION, CausalEvent};
pub use tracker::{
    CausalError, CausalOrderTracker, CausalViolation, VerificationReport, verify_observed,
};
