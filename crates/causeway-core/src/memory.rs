//! In-process replicated store.
//!
//! Models one primary plus N secondaries the way the workspace's tests need
//! a replica set to behave: a canonical insertion-ordered oplog on the
//! primary, a per-secondary applied list (whose order may deliberately
//! diverge from oplog order), acknowledgment thresholds enforced against
//! healthy-node counts, and hooks to pause replication, apply entries out of
//! order, and inject transient write faults.

use std::sync::Mutex;

use indexmap::IndexMap;

use crate::document::{Document, Filter, Mutation};
use crate::error::{StoreError, StoreResult};
use crate::profile::{ReadTarget, ReadVisibility, WriteAck};
use crate::store::{DataStore, NodeRole, NodeStatus};

struct StoredEntry {
    collection: String,
    document: Document,
}

struct Replica {
    healthy: bool,
    /// Oplog sequence numbers in the order this replica applied them.
    applied: Vec<u64>,
}

struct Inner {
    next_seq: u64,
    oplog: IndexMap<u64, StoredEntry>,
    primary_healthy: bool,
    replicas: Vec<Replica>,
    replication_paused: bool,
    transient_write_faults: u32,
}

impl Inner {
    fn cluster_size(&self) -> usize {
        1 + self.replicas.len()
    }

    fn majority(&self) -> usize {
        WriteAck::Majority.required_nodes(self.cluster_size())
    }

    fn acknowledging_nodes(&self) -> usize {
        let secondaries = if self.replication_paused {
            0
        } else {
            self.replicas.iter().filter(|r| r.healthy).count()
        };
        usize::from(self.primary_healthy) + secondaries
    }

    fn copies_of(&self, seq: u64) -> usize {
        1 + self
            .replicas
            .iter()
            .filter(|r| r.applied.contains(&seq))
            .count()
    }

    fn check_write_path(&mut self, ack: WriteAck) -> StoreResult<()> {
        if self.transient_write_faults > 0 {
            self.transient_write_faults -= 1;
            return Err(StoreError::Unavailable(
                "injected transient fault".to_string(),
            ));
        }
        if !self.primary_healthy {
            return Err(StoreError::Unavailable("primary unreachable".to_string()));
        }
        let required = ack.required_nodes(self.cluster_size());
        let reachable = self.acknowledging_nodes();
        if required > reachable {
            return Err(StoreError::Unavailable(format!(
                "write concern '{ack}' requires {required} nodes, {reachable} reachable"
            )));
        }
        Ok(())
    }

    /// Sequence numbers visible to a read, in observed order.
    fn observed_seqs(
        &self,
        visibility: ReadVisibility,
        target: ReadTarget,
    ) -> StoreResult<Vec<u64>> {
        let seqs: Vec<u64> = match target {
            ReadTarget::Primary => {
                if !self.primary_healthy {
                    return Err(StoreError::Unavailable("primary unreachable".to_string()));
                }
                self.oplog.keys().copied().collect()
            }
            ReadTarget::AnyReplica => {
                if self.replicas.is_empty() {
                    self.oplog.keys().copied().collect()
                } else {
                    let replica = self
                        .replicas
                        .iter()
                        .find(|r| r.healthy)
                        .ok_or_else(|| {
                            StoreError::Unavailable("no replica reachable".to_string())
                        })?;
                    replica.applied.clone()
                }
            }
        };

        if visibility == ReadVisibility::Majority {
            let reachable = usize::from(self.primary_healthy)
                + self.replicas.iter().filter(|r| r.healthy).count();
            if reachable < self.majority() {
                return Err(StoreError::Unavailable(
                    "majority read concern requires a majority of nodes".to_string(),
                ));
            }
            let majority = self.majority();
            return Ok(seqs
                .into_iter()
                .filter(|seq| self.copies_of(*seq) >= majority)
                .collect());
        }
        Ok(seqs)
    }
}

/// An in-memory [`DataStore`] with a configurable replica topology.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl Default for MemoryStore {
    /// Three-node replica set: one primary, two secondaries.
    fn default() -> Self {
        Self::replica_set(2)
    }
}

impl MemoryStore {
    #[must_use]
    pub fn replica_set(secondaries: usize) -> Self {
        let replicas = (0..secondaries)
            .map(|_| Replica {
                healthy: true,
                applied: Vec::new(),
            })
            .collect();
        Self {
            inner: Mutex::new(Inner {
                next_seq: 0,
                oplog: IndexMap::new(),
                primary_healthy: true,
                replicas,
                replication_paused: false,
                transient_write_faults: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store lock poisoned")
    }

    /// Stop propagating new writes to secondaries. Writes requiring more
    /// than a single acknowledgment fail with `Unavailable` while paused.
    pub fn pause_replication(&self) {
        self.lock().replication_paused = true;
    }

    /// Resume replication and bring every healthy secondary up to date, in
    /// oplog order.
    pub fn resume_replication(&self) {
        let mut inner = self.lock();
        inner.replication_paused = false;
        let seqs: Vec<u64> = inner.oplog.keys().copied().collect();
        for replica in &mut inner.replicas {
            if !replica.healthy {
                continue;
            }
            for seq in &seqs {
                if !replica.applied.contains(seq) {
                    replica.applied.push(*seq);
                }
            }
        }
    }

    /// Apply the `position`-th oplog entry (insertion order, zero-based) to
    /// one secondary. Applying entries in a different order than they were
    /// written is how tests manufacture dependency-order violations.
    pub fn apply_oplog_entry(&self, replica: usize, position: usize) {
        let mut inner = self.lock();
        let (seq, _) = inner
            .oplog
            .get_index(position)
            .expect("oplog position out of range");
        let seq = *seq;
        let replica = inner
            .replicas
            .get_mut(replica)
            .expect("replica index out of range");
        if !replica.applied.contains(&seq) {
            replica.applied.push(seq);
        }
    }

    pub fn set_primary_healthy(&self, healthy: bool) {
        self.lock().primary_healthy = healthy;
    }

    pub fn set_replica_healthy(&self, replica: usize, healthy: bool) {
        self.lock()
            .replicas
            .get_mut(replica)
            .expect("replica index out of range")
            .healthy = healthy;
    }

    /// Make the next `count` writes or updates fail with a transient
    /// `Unavailable` error, then recover.
    pub fn inject_write_faults(&self, count: u32) {
        self.lock().transient_write_faults = count;
    }
}

impl DataStore for MemoryStore {
    fn write(&self, collection: &str, document: Document, ack: WriteAck) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.check_write_path(ack)?;

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.oplog.insert(
            seq,
            StoredEntry {
                collection: collection.to_string(),
                document,
            },
        );

        if !inner.replication_paused {
            for replica in &mut inner.replicas {
                if replica.healthy {
                    replica.applied.push(seq);
                }
            }
        }
        Ok(())
    }

    fn read(
        &self,
        collection: &str,
        filter: &Filter,
        visibility: ReadVisibility,
        target: ReadTarget,
    ) -> StoreResult<Vec<Document>> {
        let inner = self.lock();
        let seqs = inner.observed_seqs(visibility, target)?;
        Ok(seqs
            .into_iter()
            .filter_map(|seq| inner.oplog.get(&seq))
            .filter(|entry| entry.collection == collection && filter.matches(&entry.document))
            .map(|entry| entry.document.clone())
            .collect())
    }

    fn update(
        &self,
        collection: &str,
        filter: &Filter,
        mutation: &Mutation,
        ack: WriteAck,
    ) -> StoreResult<u64> {
        let mut inner = self.lock();
        inner.check_write_path(ack)?;

        // Updates mutate the canonical copy in place; staleness is modeled
        // at insert granularity only.
        let target = inner
            .oplog
            .values_mut()
            .find(|entry| entry.collection == collection && filter.matches(&entry.document));
        match target {
            Some(entry) => {
                mutation.apply(&mut entry.document);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn topology(&self) -> Vec<NodeStatus> {
        let inner = self.lock();
        let mut nodes = vec![NodeStatus {
            node_id: "node-0".to_string(),
            role: NodeRole::Primary,
            healthy: inner.primary_healthy,
        }];
        for (index, replica) in inner.replicas.iter().enumerate() {
            nodes.push(NodeStatus {
                node_id: format!("node-{}", index + 1),
                role: NodeRole::Secondary,
                healthy: replica.healthy,
            });
        }
        nodes
    }
}
