use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::TransitionError;
use crate::partition::PartitionContext;
use crate::services::{ProcessingMode, ServiceFactory};

use super::super::step::TransitionStep;

/// Starts the stream processor in the mode of the role being installed.
///
/// If the partition must not process when the step runs (disk pressure or
/// an explicit pause arrived while installing), the processor comes up
/// paused.
#[derive(Debug)]
pub struct StreamProcessorStep {
    factory: Arc<dyn ServiceFactory>,
    mode: ProcessingMode,
}

impl StreamProcessorStep {
    pub fn new(factory: Arc<dyn ServiceFactory>, mode: ProcessingMode) -> Self {
        Self { factory, mode }
    }
}

#[async_trait]
impl TransitionStep for StreamProcessorStep {
    fn name(&self) -> &'static str {
        "stream-processor"
    }

    async fn prepare(&self, ctx: &mut PartitionContext) -> Result<(), TransitionError> {
        if let Some(processor) = ctx.take_stream_processor() {
            processor
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
        if ctx.stream_processor().is_some() {
            return Ok(());
        }
        let processor = self
            .factory
            .stream_processor(ctx, self.mode)
            .await
            .map_err(|source| TransitionError::StepInstall {
                step: self.name(),
                source,
            })?;

        if !ctx.should_process() {
            debug!(mode = %self.mode, "installing stream processor paused");
            processor
                .pause_processing()
                .await
                .map_err(|source| TransitionError::StepInstall {
                    step: self.name(),
                    source,
                })?;
        }

        ctx.set_stream_processor(processor);
        Ok(())
    }
}
