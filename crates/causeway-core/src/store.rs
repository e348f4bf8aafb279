//! The external data-store collaborator.
//!
//! Everything the workspace does against a replicated store goes through
//! [`DataStore`]. The trait is object-safe so orchestrators and trackers can
//! hold an `Arc<dyn DataStore>` injected at construction; there is no
//! process-wide connection singleton.

use serde::{Deserialize, Serialize};

use crate::document::{Document, Filter, Mutation};
use crate::error::StoreResult;
use crate::profile::{ReadTarget, ReadVisibility, WriteAck};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Primary,
    Secondary,
}

/// One member of the store's replica topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub node_id: String,
    pub role: NodeRole,
    pub healthy: bool,
}

/// Minimal operation set of a replicated document store.
///
/// Reads produce documents in the physical order the chosen read path
/// observes them, which under weak visibility settings may differ from the
/// order writes were issued in. That difference is exactly what the causal
/// verifier inspects.
pub trait DataStore: Send + Sync {
    /// Insert `document` into `collection`, durably under `ack`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Unavailable`] if `ack` cannot be
    /// satisfied, [`crate::StoreError::Rejected`] on a constraint violation.
    fn write(&self, collection: &str, document: Document, ack: WriteAck) -> StoreResult<()>;

    /// All documents in `collection` matching `filter`, in observed order.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen read path cannot satisfy `visibility`.
    fn read(
        &self,
        collection: &str,
        filter: &Filter,
        visibility: ReadVisibility,
        target: ReadTarget,
    ) -> StoreResult<Vec<Document>>;

    /// Apply `mutation` to the first document matching `filter`, returning
    /// the number of documents modified (zero or one).
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::Unavailable`] if `ack` cannot be
    /// satisfied.
    fn update(
        &self,
        collection: &str,
        filter: &Filter,
        mutation: &Mutation,
        ack: WriteAck,
    ) -> StoreResult<u64>;

    /// Current replica-set topology. Consumed by display layers only; the
    /// core never branches on it.
    fn topology(&self) -> Vec<NodeStatus>;

    /// Zero-or-one convenience over [`DataStore::read`].
    ///
    /// # Errors
    ///
    /// Same failure modes as [`DataStore::read`].
    fn read_one(
        &self,
        collection: &str,
        filter: &Filter,
        visibility: ReadVisibility,
        target: ReadTarget,
    ) -> StoreResult<Option<Document>> {
        Ok(self
            .read(collection, filter, visibility, target)?
            .into_iter()
            .next())
    }
}
