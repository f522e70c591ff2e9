//!
//! # Raft contracts
//!
//! The controller never implements replication itself; it observes the raft
//! partition backing its workflow log partition and reacts to role changes.
//! This module holds the contracts the embedding broker implements on top of
//! its raft library.
//!

use std::fmt;
use std::sync::Arc;

use weft_types::{PartitionId, Term};

use crate::health::{FailureListener, HealthStatus};

/// Role of this member within the replication group, as reported by raft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaftRole {
    Leader,
    Follower,
    Candidate,
    Promotable,
    Passive,
    Inactive,
}

impl fmt::Display for RaftRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaftRole::Leader => write!(f, "leader"),
            RaftRole::Follower => write!(f, "follower"),
            RaftRole::Candidate => write!(f, "candidate"),
            RaftRole::Promotable => write!(f, "promotable"),
            RaftRole::Passive => write!(f, "passive"),
            RaftRole::Inactive => write!(f, "inactive"),
        }
    }
}

/// Receives role change events from raft. Implementations must not block;
/// the controller enqueues the event onto its own mailbox.
pub trait RoleChangeListener: Send + Sync {
    fn on_new_role(&self, role: RaftRole, term: Term);
}

/// Store of snapshots persisted by raft for this partition.
pub trait SnapshotStore: Send + Sync + fmt::Debug {
    /// raft log index covered by the most recent persisted snapshot
    fn latest_snapshot_index(&self) -> Option<u64>;
}

/// Maps raft log indexes to positions in the partition log. Provided by the
/// embedding broker, consumed by the log storage binding.
pub trait LogIndexMapping: Send + Sync + fmt::Debug {
    fn position(&self, raft_index: u64) -> Option<u64>;
}

/// Handle to the raft partition backing this controller.
///
/// Read-only from the controller's perspective, except for [`step_down`]
/// which is safe to invoke at any time.
///
/// [`step_down`]: RaftPartition::step_down
pub trait RaftPartition: Send + Sync + fmt::Debug {
    fn partition_id(&self) -> PartitionId;

    fn role(&self) -> RaftRole;

    fn term(&self) -> Term;

    fn add_role_change_listener(&self, listener: Arc<dyn RoleChangeListener>);

    fn remove_role_change_listener(&self, listener: &Arc<dyn RoleChangeListener>);

    /// invite raft to elect another leader
    fn step_down(&self);

    fn snapshot_store(&self) -> Arc<dyn SnapshotStore>;

    fn health_status(&self) -> HealthStatus;

    fn add_failure_listener(&self, listener: Arc<dyn FailureListener>);

    fn remove_failure_listener(&self, listener: &Arc<dyn FailureListener>);
}

pub type SharedRaftPartition = Arc<dyn RaftPartition>;

/// Log storage view over the raft partition's replicated log.
///
/// Built once when the partition actor starts and handed to the log stream
/// service; the raft partition stays the single owner of the bytes.
#[derive(Debug, Clone)]
pub struct RaftLogStorage {
    index: Arc<dyn LogIndexMapping>,
    raft: SharedRaftPartition,
}

impl RaftLogStorage {
    pub fn of_partition(index: Arc<dyn LogIndexMapping>, raft: SharedRaftPartition) -> Self {
        Self { index, raft }
    }

    pub fn index(&self) -> &Arc<dyn LogIndexMapping> {
        &self.index
    }

    pub fn raft(&self) -> &SharedRaftPartition {
        &self.raft
    }
}
