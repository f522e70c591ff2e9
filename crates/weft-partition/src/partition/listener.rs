use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use weft_types::{PartitionId, Term};

use crate::services::LogStream;

/// Observer of partition role changes, registered once at actor start and
/// retained for the actor's lifetime.
///
/// After a successful install the actor notifies every listener in
/// registration order and awaits all of their futures. A listener error at
/// the same term is escalated like a failed install; errors surfacing after
/// a superseding role change are logged and dropped.
#[async_trait]
pub trait PartitionListener: Send + Sync + fmt::Debug {
    async fn on_becoming_leader(
        &self,
        partition_id: PartitionId,
        term: Term,
        log_stream: Arc<dyn LogStream>,
    ) -> Result<()>;

    async fn on_becoming_follower(&self, partition_id: PartitionId, term: Term) -> Result<()>;
}
