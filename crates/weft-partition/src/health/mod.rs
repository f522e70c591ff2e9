//!
//! # Health tree
//!
//! Every piece of the partition that can fail exposes two capabilities: a
//! current [`HealthStatus`] and a subscription for failure edges. The
//! [`HealthSupervisor`] aggregates registered components and is itself a
//! component, so supervisors nest by registration.
//!

mod probes;
mod supervisor;

pub use probes::{InactiveTransitionHook, PartitionHealthProbe, RaftHealthProbe};
pub use supervisor::HealthSupervisor;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Receives edge events when a component flips between healthy and
/// unhealthy. Callbacks must be cheap and must not block; heavy reactions
/// belong on their own task.
pub trait FailureListener: Send + Sync {
    fn on_failure(&self);
    fn on_recovered(&self);
}

/// A monitorable piece of the partition.
pub trait HealthComponent: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn status(&self) -> HealthStatus;

    /// register a listener for status edges of this component
    fn subscribe(&self, listener: Arc<dyn FailureListener>);
}
