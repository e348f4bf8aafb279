//! Core abstractions shared by the causeway workspace.
//!
//! This crate defines the consistency vocabulary (`ConsistencyProfile` and
//! its parameter enums), the document model used to talk to a replicated
//! data store, the object-safe `DataStore` trait, bounded retry/backoff
//! policies, and an in-memory replicated store implementation used
//! throughout the workspace's tests.

pub mod document;
pub mod error;
pub mod memory;
mod profile;
mod read;
mod retry;
pub mod store;

pub use document::{Document, Filter, Mutation};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use profile::{ConsistencyProfile, ReadTarget, ReadVisibility, WriteAck};
pub use read::{ReadVisibilityOutcome, poll_read};
pub use retry::RetryPolicy;
pub use store::{DataStore, NodeRole, NodeStatus};
