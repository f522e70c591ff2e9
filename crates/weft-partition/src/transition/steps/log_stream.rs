use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransitionError;
use crate::partition::PartitionContext;
use crate::services::ServiceFactory;

use super::super::step::TransitionStep;

/// Opens the partition log stream over the raft log storage binding.
#[derive(Debug)]
pub struct LogStreamStep {
    factory: Arc<dyn ServiceFactory>,
}

impl LogStreamStep {
    pub fn new(factory: Arc<dyn ServiceFactory>) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl TransitionStep for LogStreamStep {
    fn name(&self) -> &'static str {
        "log-stream"
    }

    async fn prepare(&self, ctx: &mut PartitionContext) -> Result<(), TransitionError> {
        if let Some(stream) = ctx.take_log_stream() {
            stream
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
        if ctx.log_stream().is_some() {
            return Ok(());
        }
        let stream =
            self.factory
                .log_stream(ctx)
                .await
                .map_err(|source| TransitionError::StepInstall {
                    step: self.name(),
                    source,
                })?;
        ctx.set_log_stream(stream);
        Ok(())
    }
}
