use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use fluvio_future::task::spawn;
use fluvio_future::timer::sleep;
use weft_types::event::StickyEvent;

use crate::metrics::PartitionMetrics;

use super::{FailureListener, HealthComponent, HealthStatus};

/// Aggregates the health of registered components.
///
/// The aggregate is unhealthy iff any component is unhealthy. Edges of the
/// aggregate are pushed to subscribed listeners and mirrored into the
/// partition health gauge. Components push their own edges into the
/// supervisor; a periodic re-evaluation loop additionally catches components
/// that change status without an event.
#[derive(Debug)]
pub struct HealthSupervisor {
    inner: Arc<SupervisorInner>,
    check_interval: Duration,
    end_event: Arc<StickyEvent>,
}

#[derive(Debug)]
struct SupervisorInner {
    name: String,
    metrics: Arc<PartitionMetrics>,
    state: Mutex<SupervisorState>,
}

struct SupervisorState {
    components: Vec<Arc<dyn HealthComponent>>,
    listeners: Vec<Arc<dyn FailureListener>>,
    status: HealthStatus,
}

impl Default for SupervisorState {
    fn default() -> Self {
        Self {
            components: vec![],
            listeners: vec![],
            status: HealthStatus::Healthy,
        }
    }
}

impl std::fmt::Debug for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisorState")
            .field("components", &self.components)
            .field("listeners", &self.listeners.len())
            .field("status", &self.status)
            .finish()
    }
}

impl HealthSupervisor {
    pub fn new_shared(
        name: impl Into<String>,
        check_interval: Duration,
        metrics: Arc<PartitionMetrics>,
    ) -> Arc<Self> {
        Arc::new(Self {
            inner: Arc::new(SupervisorInner {
                name: name.into(),
                metrics,
                state: Mutex::new(SupervisorState::default()),
            }),
            check_interval,
            end_event: StickyEvent::new_shared(),
        })
    }

    /// register a component; the supervisor subscribes to its edges and
    /// re-evaluates the aggregate immediately
    pub fn register_component(&self, component: Arc<dyn HealthComponent>) {
        component.subscribe(Arc::new(ComponentEdge {
            inner: self.inner.clone(),
        }));
        self.inner.state.lock().components.push(component);
        self.inner.reevaluate();
    }

    pub fn remove_component(&self, name: &str) {
        let mut state = self.inner.state.lock();
        state.components.retain(|c| c.name() != name);
        drop(state);
        self.inner.reevaluate();
    }

    /// spawn the periodic re-evaluation loop
    pub fn start_monitoring(self: &Arc<Self>) {
        let supervisor = self.clone();
        spawn(async move {
            supervisor.check_loop().await;
        });
    }

    pub fn stop(&self) {
        self.end_event.raise();
    }

    #[instrument(skip(self), fields(name = %self.inner.name))]
    async fn check_loop(&self) {
        use tokio::select;

        loop {
            select! {
                _ = self.end_event.wait() => {
                    debug!("health check loop terminated");
                    break;
                },
                _ = sleep(self.check_interval) => {
                    self.inner.reevaluate();
                }
            }
        }
    }
}

impl HealthComponent for HealthSupervisor {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn status(&self) -> HealthStatus {
        self.inner.aggregate()
    }

    fn subscribe(&self, listener: Arc<dyn FailureListener>) {
        self.inner.state.lock().listeners.push(listener);
    }
}

impl SupervisorInner {
    fn aggregate(&self) -> HealthStatus {
        let state = self.state.lock();
        aggregate_of(&state.components)
    }

    /// recompute the aggregate; on an edge, update the gauge and push the
    /// event to subscribed listeners
    fn reevaluate(&self) {
        let mut state = self.state.lock();
        let status = aggregate_of(&state.components);
        let previous = std::mem::replace(&mut state.status, status);
        if previous == status {
            return;
        }

        let listeners = state.listeners.clone();
        let unhealthy: Vec<String> = state
            .components
            .iter()
            .filter(|c| !c.status().is_healthy())
            .map(|c| c.name().to_owned())
            .collect();
        drop(state);

        match status {
            HealthStatus::Healthy => {
                debug!(name = %self.name, "all components recovered");
                self.metrics.set_healthy();
                for listener in listeners {
                    listener.on_recovered();
                }
            }
            HealthStatus::Unhealthy => {
                warn!(name = %self.name, components = ?unhealthy, "components unhealthy");
                self.metrics.set_unhealthy();
                for listener in listeners {
                    listener.on_failure();
                }
            }
        }
    }
}

fn aggregate_of(components: &[Arc<dyn HealthComponent>]) -> HealthStatus {
    if components.iter().all(|c| c.status().is_healthy()) {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    }
}

/// forwards a component edge into the owning supervisor
struct ComponentEdge {
    inner: Arc<SupervisorInner>,
}

impl FailureListener for ComponentEdge {
    fn on_failure(&self) {
        self.inner.reevaluate();
    }

    fn on_recovered(&self) {
        self.inner.reevaluate();
    }
}
