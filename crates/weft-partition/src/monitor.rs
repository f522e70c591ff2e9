//!
//! # Disk space monitor
//!
//! Node wide watcher of free space on the data volume. Partitions register
//! as listeners and translate the pressure edges into pausing or resuming
//! their stream processor. The monitor only reports edges; the per
//! partition pause decision stays with the partition actor.
//!

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_lock::RwLock;
use sysinfo::{DiskExt, System, SystemExt};
use tracing::{debug, info, instrument, warn};

use fluvio_future::task::spawn;
use fluvio_future::timer::sleep;
use weft_types::event::StickyEvent;

use crate::config::PartitionConfig;

/// Receives disk pressure edges. Implementations must not block.
pub trait DiskSpaceListener: Send + Sync {
    fn on_disk_space_not_available(&self);

    fn on_disk_space_available(&self);
}

pub struct DiskSpaceMonitor {
    data_dir: PathBuf,
    min_free_bytes: u64,
    interval: Duration,
    available: AtomicBool,
    listeners: RwLock<Vec<Arc<dyn DiskSpaceListener>>>,
    end_event: Arc<StickyEvent>,
}

impl std::fmt::Debug for DiskSpaceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskSpaceMonitor")
            .field("data_dir", &self.data_dir)
            .field("min_free_bytes", &self.min_free_bytes)
            .field("available", &self.available)
            .finish()
    }
}

impl DiskSpaceMonitor {
    pub fn start(config: &PartitionConfig) -> Arc<Self> {
        let monitor = Arc::new(Self {
            data_dir: config.data_dir.clone(),
            min_free_bytes: config.disk_free_min_bytes,
            interval: config.disk_check_interval(),
            available: AtomicBool::new(true),
            listeners: RwLock::new(vec![]),
            end_event: StickyEvent::new_shared(),
        });

        let watcher = monitor.clone();
        spawn(async move {
            watcher.watch_loop().await;
        });
        monitor
    }

    /// register a listener; a listener joining while space is already
    /// exhausted is told so immediately
    pub async fn register(&self, listener: Arc<dyn DiskSpaceListener>) {
        if !self.available.load(Ordering::SeqCst) {
            listener.on_disk_space_not_available();
        }
        self.listeners.write().await.push(listener);
    }

    pub fn shutdown(&self) {
        self.end_event.raise();
    }

    #[instrument(skip(self), fields(data_dir = %self.data_dir.display()))]
    async fn watch_loop(&self) {
        use tokio::select;

        let mut system = System::new();
        system.refresh_disks_list();

        loop {
            select! {
                _ = self.end_event.wait() => {
                    debug!("disk space monitor terminated");
                    break;
                },
                _ = sleep(self.interval) => {
                    system.refresh_disks();
                    self.apply_reading(free_bytes(&system, &self.data_dir)).await;
                }
            }
        }
    }

    /// fold a free space reading into the current state, notifying
    /// listeners on edges only
    async fn apply_reading(&self, free: Option<u64>) {
        let Some(free) = free else {
            warn!("could not determine free space of data volume");
            return;
        };

        let available = free >= self.min_free_bytes;
        let previous = self.available.swap(available, Ordering::SeqCst);
        if previous == available {
            return;
        }

        let listeners = self.listeners.read().await;
        if available {
            info!(free, "disk space usage is below threshold again");
            for listener in listeners.iter() {
                listener.on_disk_space_available();
            }
        } else {
            warn!(
                free,
                min = self.min_free_bytes,
                "out of disk space, partitions will pause processing"
            );
            for listener in listeners.iter() {
                listener.on_disk_space_not_available();
            }
        }
    }
}

/// free bytes of the disk holding `path`, picking the most specific mount
fn free_bytes(system: &System, path: &Path) -> Option<u64> {
    system
        .disks()
        .iter()
        .filter(|disk| path.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
        .map(|disk| disk.available_space())
}
