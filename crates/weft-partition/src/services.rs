//!
//! # Sidecar service contracts
//!
//! The services that implement a partition (log stream, stream processor,
//! snapshot director, ...) live outside this crate. The controller only
//! needs to construct them from the partition context, keep their handles,
//! and close them on teardown. Construction goes through a single
//! [`ServiceFactory`] supplied by the embedding broker.
//!

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::partition::PartitionContext;

/// Mode the stream processor is installed in. A leader processes records;
/// a follower only replays them to keep its state current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    Processing,
    Replay,
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingMode::Processing => write!(f, "processing"),
            ProcessingMode::Replay => write!(f, "replay"),
        }
    }
}

/// Readable and writable view of the partition log, handed to partition
/// listeners when this member becomes leader.
#[async_trait]
pub trait LogStream: Send + Sync + fmt::Debug {
    /// highest position written to the stream
    fn last_position(&self) -> u64;

    async fn close(&self) -> Result<()>;
}

/// Applies log records to partition state. Pause and resume are idempotent;
/// repeated calls are safe.
#[async_trait]
pub trait StreamProcessor: Send + Sync + fmt::Debug {
    async fn pause_processing(&self) -> Result<()>;

    async fn resume_processing(&self) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Periodically persists partition state and can be forced out of schedule.
#[async_trait]
pub trait SnapshotDirector: Send + Sync + fmt::Debug {
    async fn force_snapshot(&self) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Streams exported records out of the partition.
#[async_trait]
pub trait ExporterDirector: Send + Sync + fmt::Debug {
    async fn close(&self) -> Result<()>;
}

/// Deletes log segments already covered by a persisted snapshot.
#[async_trait]
pub trait LogCompactor: Send + Sync + fmt::Debug {
    async fn close(&self) -> Result<()>;
}

/// Receives replicated snapshots from the leader while following.
#[async_trait]
pub trait SnapshotReplication: Send + Sync + fmt::Debug {
    async fn close(&self) -> Result<()>;
}

/// Builds and starts partition services from the context. Every build is
/// awaited by the transition engine; a returned error aborts the install.
#[async_trait]
pub trait ServiceFactory: Send + Sync + fmt::Debug {
    async fn log_stream(&self, ctx: &PartitionContext) -> Result<Arc<dyn LogStream>>;

    async fn stream_processor(
        &self,
        ctx: &PartitionContext,
        mode: ProcessingMode,
    ) -> Result<Arc<dyn StreamProcessor>>;

    async fn snapshot_director(&self, ctx: &PartitionContext) -> Result<Arc<dyn SnapshotDirector>>;

    async fn exporter_director(&self, ctx: &PartitionContext) -> Result<Arc<dyn ExporterDirector>>;

    async fn log_compactor(&self, ctx: &PartitionContext) -> Result<Arc<dyn LogCompactor>>;

    async fn snapshot_replication(
        &self,
        ctx: &PartitionContext,
    ) -> Result<Arc<dyn SnapshotReplication>>;
}
