use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransitionError;
use crate::partition::PartitionContext;
use crate::services::ServiceFactory;

use super::super::step::TransitionStep;

/// Starts the exporter director which streams records to external sinks.
/// Leader only.
#[derive(Debug)]
pub struct ExporterDirectorStep {
    factory: Arc<dyn ServiceFactory>,
}

impl ExporterDirectorStep {
    pub fn new(factory: Arc<dyn ServiceFactory>) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl TransitionStep for ExporterDirectorStep {
    fn name(&self) -> &'static str {
        "exporter-director"
    }

    async fn prepare(&self, ctx: &mut PartitionContext) -> Result<(), TransitionError> {
        if let Some(director) = ctx.take_exporter_director() {
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
        if ctx.exporter_director().is_some() {
            return Ok(());
        }
        let director = self.factory.exporter_director(ctx).await.map_err(|source| {
            TransitionError::StepInstall {
                step: self.name(),
                source,
            }
        })?;
        ctx.set_exporter_director(director);
        Ok(())
    }
}
