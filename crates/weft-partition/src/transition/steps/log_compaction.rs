use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransitionError;
use crate::partition::PartitionContext;
use crate::services::ServiceFactory;

use super::super::step::TransitionStep;

/// Hooks log compaction to persisted snapshots so covered segments can be
/// deleted.
#[derive(Debug)]
pub struct LogCompactionStep {
    factory: Arc<dyn ServiceFactory>,
}

impl LogCompactionStep {
    pub fn new(factory: Arc<dyn ServiceFactory>) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl TransitionStep for LogCompactionStep {
    fn name(&self) -> &'static str {
        "log-compaction"
    }

    async fn prepare(&self, ctx: &mut PartitionContext) -> Result<(), TransitionError> {
        if let Some(compactor) = ctx.take_log_compactor() {
            compactor
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
        if ctx.log_compactor().is_some() {
            return Ok(());
        }
        let compactor =
            self.factory
                .log_compactor(ctx)
                .await
                .map_err(|source| TransitionError::StepInstall {
                    step: self.name(),
                    source,
                })?;
        ctx.set_log_compactor(compactor);
        Ok(())
    }
}
