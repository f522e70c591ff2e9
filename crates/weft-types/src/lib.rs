pub mod defaults;
pub mod event;

//
// Types
//

/// Broker node identifier within the cluster.
pub type NodeId = u32;

/// Identifier of a replicated partition of the workflow log.
pub type PartitionId = u32;

/// Raft epoch counter. Monotonically increasing, supplied by raft on every
/// role change.
pub type Term = u64;

/// Human readable name of the controller owning a partition on a node.
/// Used as a label for logs and metrics.
pub fn partition_name(node: NodeId, partition: PartitionId) -> String {
    format!("partition-{node}-{partition}")
}
