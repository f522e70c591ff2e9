use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, error};

use fluvio_future::task::spawn;
use weft_types::PartitionId;

use crate::error::PartitionError;
use crate::raft::SharedRaftPartition;

use super::{FailureListener, HealthComponent, HealthStatus};

const FLAG_ORDERING: Ordering = Ordering::SeqCst;

/// Tracks the controller level conditions that gate partition health:
/// whether the role services are installed and whether the data volume has
/// free space. The partition actor is the only writer.
pub struct PartitionHealthProbe {
    name: String,
    services_installed: AtomicBool,
    disk_space_available: AtomicBool,
    listeners: Mutex<Vec<Arc<dyn FailureListener>>>,
}

impl std::fmt::Debug for PartitionHealthProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionHealthProbe")
            .field("name", &self.name)
            .field("services_installed", &self.services_installed)
            .field("disk_space_available", &self.disk_space_available)
            .finish()
    }
}

impl PartitionHealthProbe {
    pub fn new_shared(partition_id: PartitionId) -> Arc<Self> {
        Arc::new(Self {
            name: format!("partition-health-{partition_id}"),
            // nothing is installed until the first transition completes
            services_installed: AtomicBool::new(false),
            disk_space_available: AtomicBool::new(true),
            listeners: Mutex::new(vec![]),
        })
    }

    pub fn set_services_installed(&self, installed: bool) {
        self.update(|probe| probe.services_installed.store(installed, FLAG_ORDERING));
    }

    pub fn set_disk_space_available(&self, available: bool) {
        self.update(|probe| probe.disk_space_available.store(available, FLAG_ORDERING));
    }

    fn update(&self, mutate: impl FnOnce(&Self)) {
        let before = self.status();
        mutate(self);
        let after = self.status();
        if before == after {
            return;
        }

        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            match after {
                HealthStatus::Healthy => listener.on_recovered(),
                HealthStatus::Unhealthy => listener.on_failure(),
            }
        }
    }
}

impl HealthComponent for PartitionHealthProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> HealthStatus {
        let healthy = self.services_installed.load(FLAG_ORDERING)
            && self.disk_space_available.load(FLAG_ORDERING);
        if healthy {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }

    fn subscribe(&self, listener: Arc<dyn FailureListener>) {
        self.listeners.lock().push(listener);
    }
}

/// Invoked by the raft probe when raft reports an unrecoverable fault.
/// The partition reacts by draining to the inactive role.
#[async_trait]
pub trait InactiveTransitionHook: Send + Sync {
    async fn transition_to_inactive(&self) -> Result<(), PartitionError>;
}

/// Observes the raft partition. An unrecoverable raft fault is laundered
/// into a clean transition to the inactive role instead of a step down.
pub struct RaftHealthProbe {
    name: String,
    raft: SharedRaftPartition,
    edge: Arc<RaftEdge>,
}

impl std::fmt::Debug for RaftHealthProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaftHealthProbe")
            .field("name", &self.name)
            .field("raft", &self.raft)
            .finish()
    }
}

struct RaftEdge {
    failed: AtomicBool,
    listeners: Mutex<Vec<Arc<dyn FailureListener>>>,
    hook: Arc<dyn InactiveTransitionHook>,
}

impl FailureListener for RaftEdge {
    fn on_failure(&self) {
        self.failed.store(true, FLAG_ORDERING);
        error!("raft partition failed, requesting transition to inactive");

        let hook = self.hook.clone();
        spawn(async move {
            match hook.transition_to_inactive().await {
                Ok(()) => debug!("partition drained to inactive after raft failure"),
                Err(err) => error!(%err, "failed to drain partition after raft failure"),
            }
        });

        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            listener.on_failure();
        }
    }

    fn on_recovered(&self) {
        self.failed.store(false, FLAG_ORDERING);
        let listeners = self.listeners.lock().clone();
        for listener in listeners {
            listener.on_recovered();
        }
    }
}

impl RaftHealthProbe {
    pub fn new_shared(
        raft: SharedRaftPartition,
        hook: Arc<dyn InactiveTransitionHook>,
    ) -> Arc<Self> {
        let edge = Arc::new(RaftEdge {
            failed: AtomicBool::new(false),
            listeners: Mutex::new(vec![]),
            hook,
        });
        raft.add_failure_listener(edge.clone());
        Arc::new(Self {
            name: format!("raft-{}", raft.partition_id()),
            raft,
            edge,
        })
    }

    /// detach from the raft partition; the probe stops observing
    pub fn close(&self) {
        let listener: Arc<dyn FailureListener> = self.edge.clone();
        self.raft.remove_failure_listener(&listener);
    }
}

impl HealthComponent for RaftHealthProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> HealthStatus {
        if self.edge.failed.load(FLAG_ORDERING) {
            HealthStatus::Unhealthy
        } else {
            self.raft.health_status()
        }
    }

    fn subscribe(&self, listener: Arc<dyn FailureListener>) {
        self.edge.listeners.lock().push(listener);
    }
}
