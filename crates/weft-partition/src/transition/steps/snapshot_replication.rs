use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransitionError;
use crate::partition::PartitionContext;
use crate::services::ServiceFactory;

use super::super::step::TransitionStep;

/// Wires the snapshot replication source so replicated snapshots reach the
/// local store before the stream processor needs them.
#[derive(Debug)]
pub struct SnapshotReplicationStep {
    factory: Arc<dyn ServiceFactory>,
}

impl SnapshotReplicationStep {
    pub fn new(factory: Arc<dyn ServiceFactory>) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl TransitionStep for SnapshotReplicationStep {
    fn name(&self) -> &'static str {
        "snapshot-replication"
    }

    async fn prepare(&self, ctx: &mut PartitionContext) -> Result<(), TransitionError> {
        if let Some(replication) = ctx.take_snapshot_replication() {
            replication
                .close()
                .await
                .map_err(|source| TransitionError::StepTeardown {
                    step: self.name(),
                    source,
                })?;
        }
        Ok(())
    }

    async fn install(&self, ctx: &mut PartitionContext) -> Result<(), TransitionError> {
        if ctx.snapshot_replication().is_some() {
            return Ok(());
        }
        let replication = self.factory.snapshot_replication(ctx).await.map_err(|source| {
            TransitionError::StepInstall {
                step: self.name(),
                source,
            }
        })?;
        ctx.set_snapshot_replication(replication);
        Ok(())
    }
}
