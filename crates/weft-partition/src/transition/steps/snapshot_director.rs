use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransitionError;
use crate::partition::PartitionContext;
use crate::services::ServiceFactory;

use super::super::step::TransitionStep;

/// Schedules periodic snapshots of partition state. Leader only.
#[derive(Debug)]
pub struct SnapshotDirectorStep {
    factory: Arc<dyn ServiceFactory>,
}

impl SnapshotDirectorStep {
    pub fn new(factory: Arc<dyn ServiceFactory>) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl TransitionStep for SnapshotDirectorStep {
    fn name(&self) -> &'static str {
        "snapshot-director"
    }

    async fn prepare(&self, ctx: &mut PartitionContext) -> Result<(), TransitionError> {
        if let Some(director) = ctx.take_snapshot_director() {
            director
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
        if ctx.snapshot_director().is_some() {
            return Ok(());
        }
        let director = self.factory.snapshot_director(ctx).await.map_err(|source| {
            TransitionError::StepInstall {
                step: self.name(),
                source,
            }
        })?;
        ctx.set_snapshot_director(director);
        Ok(())
    }
}
