use std::fmt;

use async_trait::async_trait;

use crate::error::TransitionError;
use crate::partition::PartitionContext;

/// One installable unit of a role recipe.
///
/// Both phases are idempotent: `install` is a no-op when the handle this
/// step owns is already present, `prepare` is a no-op when it is absent.
/// That makes tearing down a partially installed recipe safe.
#[async_trait]
pub trait TransitionStep: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// tear down whatever this step installed and clear its context handle
    async fn prepare(&self, ctx: &mut PartitionContext) -> Result<(), TransitionError>;

    /// build the service this step owns and store its handle in the context
    async fn install(&self, ctx: &mut PartitionContext) -> Result<(), TransitionError>;
}
