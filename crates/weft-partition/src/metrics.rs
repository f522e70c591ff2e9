use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Lock free per partition gauges and counters. Cheap to share between the
/// actor and the health supervisor; exposed to the embedding broker through
/// serialization.
#[derive(Default, Debug, Serialize)]
pub struct PartitionMetrics {
    healthy: AtomicU64,
    transitions: AtomicU64,
    failed_installs: AtomicU64,
}

impl PartitionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_healthy(&self) {
        self.healthy.store(1, Ordering::SeqCst);
    }

    pub fn set_unhealthy(&self) {
        self.healthy.store(0, Ordering::SeqCst);
    }

    pub fn add_transition(&self) {
        self.transitions.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add_failed_install(&self) {
        self.failed_installs.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
impl PartitionMetrics {
    pub fn healthy(&self) -> u64 {
        self.healthy.load(Ordering::SeqCst)
    }

    pub fn transitions(&self) -> u64 {
        self.transitions.load(Ordering::SeqCst)
    }

    pub fn failed_installs(&self) -> u64 {
        self.failed_installs.load(Ordering::SeqCst)
    }
}
