use std::fmt;

use serde::{Deserialize, Serialize};

/// How many replicas must confirm a write before it counts as durable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteAck {
    /// Primary acknowledgment only. Fast, survives no node loss.
    Single,
    /// A majority of replicas. Tolerates minority-node failure.
    Majority,
    /// Every replica. Strongest durability, least available.
    All,
}

impl WriteAck {
    /// Number of nodes that must acknowledge a write in a cluster of
    /// `cluster_size` nodes.
    #[must_use]
    pub fn required_nodes(self, cluster_size: usize) -> usize {
        match self {
            Self::Single => 1,
            Self::Majority => cluster_size / 2 + 1,
            Self::All => cluster_size,
        }
    }
}

impl fmt::Display for WriteAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Single => "single",
            Self::Majority => "majority",
            Self::All => "all",
        };
        write!(f, "{s}")
    }
}

/// The replication threshold a read must reflect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadVisibility {
    /// Whatever the chosen node has applied locally. May be stale.
    Local,
    /// Only data acknowledged by a majority of replicas.
    Majority,
}

impl fmt::Display for ReadVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Local => "local",
            Self::Majority => "majority",
        };
        write!(f, "{s}")
    }
}

/// Which node a read is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadTarget {
    /// The current primary.
    Primary,
    /// Any replica, including lagging secondaries.
    AnyReplica,
}

impl fmt::Display for ReadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Primary => "primary",
            Self::AnyReplica => "any-replica",
        };
        write!(f, "{s}")
    }
}

/// A named bundle of durability and visibility parameters.
///
/// Immutable once constructed; every operation issued under a profile
/// inherits its thresholds. The two named constructors cover the regimes
/// the workspace's verification machinery distinguishes: under
/// [`ConsistencyProfile::strong`] a causal-order verification must never
/// observe a violation, while under [`ConsistencyProfile::eventual`]
/// transient staleness is expected and readers poll rather than treating a
/// single miss as failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyProfile {
    write_ack: WriteAck,
    read_visibility: ReadVisibility,
    read_target: ReadTarget,
}

impl ConsistencyProfile {
    #[must_use]
    pub fn new(
        write_ack: WriteAck,
        read_visibility: ReadVisibility,
        read_target: ReadTarget,
    ) -> Self {
        Self {
            write_ack,
            read_visibility,
            read_target,
        }
    }

    /// Majority writes, majority reads from the primary (CP regime).
    #[must_use]
    pub fn strong() -> Self {
        Self::new(WriteAck::Majority, ReadVisibility::Majority, ReadTarget::Primary)
    }

    /// Single-node writes, local reads from any replica (AP regime).
    #[must_use]
    pub fn eventual() -> Self {
        Self::new(WriteAck::Single, ReadVisibility::Local, ReadTarget::AnyReplica)
    }

    #[must_use]
    pub fn write_ack(&self) -> WriteAck {
        self.write_ack
    }

    #[must_use]
    pub fn read_visibility(&self) -> ReadVisibility {
        self.read_visibility
    }

    #[must_use]
    pub fn read_target(&self) -> ReadTarget {
        self.read_target
    }
}

impl fmt::Display for ConsistencyProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "w={}/rc={}/rp={}",
            self.write_ack, self.read_visibility, self.read_target
        )
    }
}
