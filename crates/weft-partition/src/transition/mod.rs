//!
//! # Transition engine
//!
//! A role is installed by running an ordered recipe of [`TransitionStep`]s.
//! Moving to a new role first runs the `prepare` phase of the previously
//! installed recipe in reverse order (best effort teardown), then the
//! `install` phase of the new recipe in forward order, stopping at the
//! first error. The partition actor drives the steps so that mailbox
//! commands can interleave at step boundaries.
//!

pub mod step;
pub mod steps;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::partition::PartitionContext;
use crate::services::{ProcessingMode, ServiceFactory};

use step::TransitionStep;
use steps::{
    ExporterDirectorStep, LogCompactionStep, LogStreamStep, SnapshotDirectorStep,
    SnapshotReplicationStep, StreamProcessorStep,
};

/// Destination of a transition. All non leader active raft roles collapse
/// to `Follower`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionTarget {
    Leader,
    Follower,
    Inactive,
}

impl fmt::Display for TransitionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionTarget::Leader => write!(f, "leader"),
            TransitionTarget::Follower => write!(f, "follower"),
            TransitionTarget::Inactive => write!(f, "inactive"),
        }
    }
}

/// Owns the role recipes and remembers which recipe is currently
/// (possibly partially) installed.
#[derive(Debug)]
pub struct TransitionEngine {
    leader_steps: Vec<Arc<dyn TransitionStep>>,
    follower_steps: Vec<Arc<dyn TransitionStep>>,
    installed: Option<TransitionTarget>,
}

impl TransitionEngine {
    pub fn new(factory: Arc<dyn ServiceFactory>) -> Self {
        let log_stream: Arc<dyn TransitionStep> = Arc::new(LogStreamStep::new(factory.clone()));
        let snapshot_replication: Arc<dyn TransitionStep> =
            Arc::new(SnapshotReplicationStep::new(factory.clone()));
        let log_compaction: Arc<dyn TransitionStep> =
            Arc::new(LogCompactionStep::new(factory.clone()));

        let leader_steps = vec![
            log_stream.clone(),
            snapshot_replication.clone(),
            Arc::new(StreamProcessorStep::new(
                factory.clone(),
                ProcessingMode::Processing,
            )) as Arc<dyn TransitionStep>,
            Arc::new(SnapshotDirectorStep::new(factory.clone())) as Arc<dyn TransitionStep>,
            Arc::new(ExporterDirectorStep::new(factory.clone())) as Arc<dyn TransitionStep>,
            log_compaction.clone(),
        ];

        let follower_steps = vec![
            log_stream,
            snapshot_replication,
            Arc::new(StreamProcessorStep::new(factory, ProcessingMode::Replay))
                as Arc<dyn TransitionStep>,
            log_compaction,
        ];

        Self::from_recipes(leader_steps, follower_steps)
    }

    /// build an engine from explicit recipes
    pub fn from_recipes(
        leader_steps: Vec<Arc<dyn TransitionStep>>,
        follower_steps: Vec<Arc<dyn TransitionStep>>,
    ) -> Self {
        Self {
            leader_steps,
            follower_steps,
            installed: None,
        }
    }

    pub fn installed(&self) -> Option<TransitionTarget> {
        self.installed
    }

    pub fn mark_installed(&mut self, target: TransitionTarget) {
        self.installed = Some(target);
    }

    /// recipe of the target role, in install order
    pub fn install_steps(&self, target: TransitionTarget) -> Vec<Arc<dyn TransitionStep>> {
        match target {
            TransitionTarget::Leader => self.leader_steps.clone(),
            TransitionTarget::Follower => self.follower_steps.clone(),
            TransitionTarget::Inactive => vec![],
        }
    }

    /// tear down the currently installed recipe, steps in reverse order.
    ///
    /// Teardown is best effort: a failing step is logged and the remaining
    /// steps still run, since the partition is about to assume a new role
    /// anyway.
    pub async fn teardown(&mut self, ctx: &mut PartitionContext) {
        let Some(installed) = self.installed.take() else {
            return;
        };

        let steps = self.install_steps(installed);
        for step in steps.iter().rev() {
            debug!(step = step.name(), "tearing down");
            if let Err(err) = step.prepare(ctx).await {
                warn!(step = step.name(), %err, "teardown step failed, continuing");
            }
        }
    }
}
