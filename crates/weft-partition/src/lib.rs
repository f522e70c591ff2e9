//!
//! # Weft Partition Controller
//!
//! Each partition of the workflow log is backed by a raft replication group.
//! On every member of that group this crate runs a single threaded partition
//! actor which owns the lifecycle of the node local partition services (log
//! stream, stream processor, snapshot director, exporter director, ...).
//!
//! The actor reacts to three independent inputs: role changes from raft,
//! completions of in flight service installations, and external pressure
//! signals (disk space, pause/resume, shutdown). All of them are serialized
//! through the actor mailbox so that the partition context is only ever
//! mutated from one task.
//!

pub mod config;
mod error;
pub mod health;
mod metrics;
pub mod monitor;
pub mod partition;
pub mod raft;
pub mod services;
pub mod transition;

pub use error::PartitionError;
pub use error::TransitionError;
pub use metrics::PartitionMetrics;
pub use partition::{PartitionActor, PartitionHandle};
