//!
//! # Partition actor
//!
//! Single threaded controller of one partition on this node. Every public
//! operation enqueues a command onto the actor mailbox; the dispatch loop is
//! the only task that touches the [`PartitionContext`]. Transitions run
//! inline in the loop, draining the mailbox at step boundaries so that role
//! changes, pressure signals, and shutdown can interleave at well defined
//! await points.
//!

mod context;
mod listener;

#[cfg(test)]
mod test;

pub use context::PartitionContext;
pub use listener::PartitionListener;

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::select;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, warn};

use fluvio_future::task::spawn;
use weft_types::event::StickyEvent;
use weft_types::{NodeId, PartitionId, Term};

use crate::config::PartitionConfig;
use crate::error::{PartitionError, TransitionError};
use crate::health::{
    FailureListener, HealthComponent, HealthStatus, HealthSupervisor, InactiveTransitionHook,
    PartitionHealthProbe, RaftHealthProbe,
};
use crate::metrics::PartitionMetrics;
use crate::monitor::DiskSpaceListener;
use crate::raft::{
    LogIndexMapping, RaftLogStorage, RaftRole, RoleChangeListener, SharedRaftPartition,
    SnapshotStore,
};
use crate::services::{ServiceFactory, StreamProcessor};
use crate::transition::{TransitionEngine, TransitionTarget};

type ListenerFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

enum PartitionCommand {
    RoleChange {
        role: RaftRole,
        term: Term,
    },
    Close,
    DiskSpaceAvailable,
    DiskSpaceNotAvailable,
    PauseProcessing {
        reply: oneshot::Sender<Result<(), PartitionError>>,
    },
    ResumeProcessing,
    TriggerSnapshot,
    StreamProcessor {
        reply: oneshot::Sender<Option<Arc<dyn StreamProcessor>>>,
    },
    AddFailureListener {
        listener: Arc<dyn FailureListener>,
    },
    SupervisorFailure,
    SupervisorRecovered,
    RaftFailed {
        reply: oneshot::Sender<Result<(), TransitionError>>,
    },
}

impl fmt::Debug for PartitionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PartitionCommand::RoleChange { .. } => "RoleChange",
            PartitionCommand::Close => "Close",
            PartitionCommand::DiskSpaceAvailable => "DiskSpaceAvailable",
            PartitionCommand::DiskSpaceNotAvailable => "DiskSpaceNotAvailable",
            PartitionCommand::PauseProcessing { .. } => "PauseProcessing",
            PartitionCommand::ResumeProcessing => "ResumeProcessing",
            PartitionCommand::TriggerSnapshot => "TriggerSnapshot",
            PartitionCommand::StreamProcessor { .. } => "StreamProcessor",
            PartitionCommand::AddFailureListener { .. } => "AddFailureListener",
            PartitionCommand::SupervisorFailure => "SupervisorFailure",
            PartitionCommand::SupervisorRecovered => "SupervisorRecovered",
            PartitionCommand::RaftFailed { .. } => "RaftFailed",
        };
        write!(f, "{name}")
    }
}

struct TransitionRequest {
    target: TransitionTarget,
    term: Term,
    ack: Option<oneshot::Sender<Result<(), TransitionError>>>,
}

impl TransitionRequest {
    fn new(target: TransitionTarget, term: Term) -> Self {
        Self {
            target,
            term,
            ack: None,
        }
    }
}

/// Cloneable entry point to a running partition actor. Every method
/// enqueues; none of them touch partition state directly.
#[derive(Clone)]
pub struct PartitionHandle {
    partition_id: PartitionId,
    sender: mpsc::UnboundedSender<PartitionCommand>,
    closed: Arc<StickyEvent>,
    supervisor: Arc<HealthSupervisor>,
    raft: SharedRaftPartition,
    metrics: Arc<PartitionMetrics>,
}

impl fmt::Debug for PartitionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionHandle")
            .field("partition_id", &self.partition_id)
            .field("closed", &self.closed.is_raised())
            .finish()
    }
}

impl PartitionHandle {
    pub fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    /// request shutdown and wait for the drain to the inactive role.
    ///
    /// Idempotent: any number of callers wait for the same single drain.
    pub async fn close(&self) {
        let _ = self.sender.send(PartitionCommand::Close);
        self.closed.wait().await;
    }

    /// pause record processing; resolves once the stream processor has
    /// acknowledged the pause (immediately if none is installed)
    pub async fn pause_processing(&self) -> Result<(), PartitionError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(PartitionCommand::PauseProcessing { reply })
            .map_err(|_| PartitionError::Shutdown)?;
        response.await.map_err(|_| PartitionError::Shutdown)?
    }

    pub fn resume_processing(&self) {
        let _ = self.sender.send(PartitionCommand::ResumeProcessing);
    }

    /// ask the snapshot director for an out of schedule snapshot; dropped
    /// silently when no director is installed
    pub fn trigger_snapshot(&self) {
        let _ = self.sender.send(PartitionCommand::TriggerSnapshot);
    }

    pub async fn stream_processor(&self) -> Option<Arc<dyn StreamProcessor>> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(PartitionCommand::StreamProcessor { reply })
            .ok()?;
        response.await.ok().flatten()
    }

    /// snapshot store of the backing raft partition; safe to read without
    /// an actor hop
    pub fn snapshot_store(&self) -> Arc<dyn SnapshotStore> {
        self.raft.snapshot_store()
    }

    pub fn add_failure_listener(&self, listener: Arc<dyn FailureListener>) {
        let _ = self
            .sender
            .send(PartitionCommand::AddFailureListener { listener });
    }

    pub fn health_status(&self) -> HealthStatus {
        self.supervisor.status()
    }

    pub fn metrics(&self) -> &Arc<PartitionMetrics> {
        &self.metrics
    }
}

impl RoleChangeListener for PartitionHandle {
    fn on_new_role(&self, role: RaftRole, term: Term) {
        let _ = self
            .sender
            .send(PartitionCommand::RoleChange { role, term });
    }
}

impl DiskSpaceListener for PartitionHandle {
    fn on_disk_space_not_available(&self) {
        let _ = self.sender.send(PartitionCommand::DiskSpaceNotAvailable);
    }

    fn on_disk_space_available(&self) {
        let _ = self.sender.send(PartitionCommand::DiskSpaceAvailable);
    }
}

// edges of the internal health supervisor are forwarded through the actor
// to the externally registered failure listener
impl FailureListener for PartitionHandle {
    fn on_failure(&self) {
        let _ = self.sender.send(PartitionCommand::SupervisorFailure);
    }

    fn on_recovered(&self) {
        let _ = self.sender.send(PartitionCommand::SupervisorRecovered);
    }
}

#[async_trait]
impl InactiveTransitionHook for PartitionHandle {
    async fn transition_to_inactive(&self) -> Result<(), PartitionError> {
        let (reply, response) = oneshot::channel();
        if self
            .sender
            .send(PartitionCommand::RaftFailed { reply })
            .is_err()
        {
            // actor already drained
            return Ok(());
        }
        match response.await {
            Ok(result) => Ok(result?),
            Err(_) => Ok(()),
        }
    }
}

/// The partition controller task.
pub struct PartitionActor {
    ctx: PartitionContext,
    engine: TransitionEngine,
    mailbox: mpsc::UnboundedReceiver<PartitionCommand>,
    pending: VecDeque<TransitionRequest>,
    closing: bool,
    closed: Arc<StickyEvent>,
    supervisor: Arc<HealthSupervisor>,
    partition_probe: Arc<PartitionHealthProbe>,
    raft_probe: Arc<RaftHealthProbe>,
    metrics: Arc<PartitionMetrics>,
    failure_listener: Option<Arc<dyn FailureListener>>,
    role_listener: Arc<dyn RoleChangeListener>,
}

impl PartitionActor {
    /// Wire up and start the controller for one partition.
    ///
    /// Startup order matters: the log storage binding is built first, the
    /// actor subscribes to raft role changes, the current raft role is
    /// replayed as an initial event (the partition may already be leader by
    /// the time the controller comes up), and only then the health tree is
    /// assembled.
    pub fn start(
        config: PartitionConfig,
        node_id: NodeId,
        raft: SharedRaftPartition,
        index_mapping: Arc<dyn LogIndexMapping>,
        factory: Arc<dyn ServiceFactory>,
        listeners: Vec<Arc<dyn PartitionListener>>,
    ) -> PartitionHandle {
        let partition_id = raft.partition_id();
        let (sender, mailbox) = mpsc::unbounded_channel();
        let closed = StickyEvent::new_shared();
        let metrics = Arc::new(PartitionMetrics::new());
        let supervisor = HealthSupervisor::new_shared(
            weft_types::partition_name(node_id, partition_id),
            config.health_check_interval(),
            metrics.clone(),
        );

        let handle = PartitionHandle {
            partition_id,
            sender: sender.clone(),
            closed: closed.clone(),
            supervisor: supervisor.clone(),
            raft: raft.clone(),
            metrics: metrics.clone(),
        };

        let mut ctx = PartitionContext::new(node_id, config, raft.clone(), listeners);
        ctx.set_log_storage(RaftLogStorage::of_partition(index_mapping, raft.clone()));

        let role_listener: Arc<dyn RoleChangeListener> = Arc::new(handle.clone());
        raft.add_role_change_listener(role_listener.clone());

        supervisor.subscribe(Arc::new(handle.clone()));

        // replay the current raft state as the first mailbox entry
        let _ = sender.send(PartitionCommand::RoleChange {
            role: raft.role(),
            term: raft.term(),
        });

        let partition_probe = PartitionHealthProbe::new_shared(partition_id);
        let raft_probe = RaftHealthProbe::new_shared(raft, Arc::new(handle.clone()));
        supervisor.start_monitoring();
        supervisor.register_component(raft_probe.clone());
        supervisor.register_component(partition_probe.clone());

        let engine = TransitionEngine::new(factory);
        let actor = PartitionActor {
            ctx,
            engine,
            mailbox,
            pending: VecDeque::new(),
            closing: false,
            closed,
            supervisor,
            partition_probe,
            raft_probe,
            metrics,
            failure_listener: None,
            role_listener,
        };
        spawn(actor.dispatch_loop());

        handle
    }

    #[instrument(
        skip(self),
        name = "PartitionActor",
        fields(partition = self.ctx.partition_id(), node = self.ctx.node_id())
    )]
    async fn dispatch_loop(mut self) {
        loop {
            if let Some(request) = self.pending.pop_front() {
                if self.closing && request.target != TransitionTarget::Inactive {
                    debug!(
                        target = %request.target,
                        term = request.term,
                        "dropping queued transition, partition is closing"
                    );
                    continue;
                }
                self.run_transition(request).await;
                continue;
            }

            if self.closing {
                break;
            }

            match self.mailbox.recv().await {
                Some(command) => self.handle_command(command).await,
                None => {
                    debug!("all partition handles dropped, closing");
                    self.closing = true;
                }
            }
        }

        self.on_closing().await;
    }

    /// final drain: transition to inactive, detach from raft, stop the
    /// health tree, resolve every close waiter
    async fn on_closing(mut self) {
        debug!("closing partition");
        let term = self.ctx.term();
        self.run_transition(TransitionRequest::new(TransitionTarget::Inactive, term))
            .await;

        self.ctx.raft().remove_role_change_listener(&self.role_listener);
        self.supervisor.remove_component(self.raft_probe.name());
        self.raft_probe.close();
        self.supervisor.stop();
        self.closed.raise();
        info!("partition closed");
    }

    async fn handle_command(&mut self, command: PartitionCommand) {
        match command {
            PartitionCommand::RoleChange { role, term } => self.on_role_change(role, term),
            PartitionCommand::Close => {
                if !self.closing {
                    debug!("close requested");
                    self.closing = true;
                }
            }
            PartitionCommand::DiskSpaceNotAvailable => {
                self.ctx.set_disk_space_available(false);
                self.partition_probe.set_disk_space_available(false);
                if let Some(processor) = self.ctx.stream_processor() {
                    warn!("disk space usage is above threshold, pausing stream processor");
                    if let Err(err) = processor.pause_processing().await {
                        error!(%err, "failed to pause stream processor");
                    }
                }
            }
            PartitionCommand::DiskSpaceAvailable => {
                self.ctx.set_disk_space_available(true);
                self.partition_probe.set_disk_space_available(true);
                if self.ctx.should_process() {
                    if let Some(processor) = self.ctx.stream_processor() {
                        info!("disk space usage is below threshold, resuming stream processor");
                        if let Err(err) = processor.resume_processing().await {
                            error!(%err, "failed to resume stream processor");
                        }
                    }
                }
            }
            PartitionCommand::PauseProcessing { reply } => {
                self.ctx.set_processing_paused(true);
                let result = match self.ctx.stream_processor() {
                    Some(processor) => processor
                        .pause_processing()
                        .await
                        .map_err(PartitionError::Processor),
                    None => Ok(()),
                };
                let _ = reply.send(result);
            }
            PartitionCommand::ResumeProcessing => {
                self.ctx.set_processing_paused(false);
                if self.ctx.should_process() {
                    if let Some(processor) = self.ctx.stream_processor() {
                        if let Err(err) = processor.resume_processing().await {
                            error!(%err, "failed to resume stream processor");
                        }
                    }
                }
            }
            PartitionCommand::TriggerSnapshot => {
                if let Some(director) = self.ctx.snapshot_director() {
                    debug!("forcing out of schedule snapshot");
                    if let Err(err) = director.force_snapshot().await {
                        error!(%err, "failed to force snapshot");
                    }
                }
            }
            PartitionCommand::StreamProcessor { reply } => {
                let _ = reply.send(self.ctx.stream_processor());
            }
            PartitionCommand::AddFailureListener { listener } => {
                self.failure_listener = Some(listener);
            }
            PartitionCommand::SupervisorFailure => {
                if let Some(listener) = &self.failure_listener {
                    listener.on_failure();
                }
            }
            PartitionCommand::SupervisorRecovered => {
                if let Some(listener) = &self.failure_listener {
                    listener.on_recovered();
                }
            }
            PartitionCommand::RaftFailed { reply } => {
                debug!("raft failure reported, queueing transition to inactive");
                let term = self.ctx.term();
                self.pending.push_back(TransitionRequest {
                    target: TransitionTarget::Inactive,
                    term,
                    ack: Some(reply),
                });
            }
        }
    }

    /// record the new term, collapse the raft role to a transition target
    /// and queue it. Non leader to non leader changes are a no-op so that
    /// raft's internal churn does not reinstall the follower stack.
    fn on_role_change(&mut self, role: RaftRole, term: Term) {
        if self.closing {
            debug!(%role, term, "ignoring role change, partition is closing");
            return;
        }

        self.ctx.set_term(term);
        let previous = self.ctx.role();
        match role {
            RaftRole::Leader => {
                if previous != Some(RaftRole::Leader) {
                    self.pending
                        .push_back(TransitionRequest::new(TransitionTarget::Leader, term));
                }
            }
            RaftRole::Inactive => {
                self.pending
                    .push_back(TransitionRequest::new(TransitionTarget::Inactive, term));
            }
            _ => {
                if previous.is_none() || previous == Some(RaftRole::Leader) {
                    self.pending
                        .push_back(TransitionRequest::new(TransitionTarget::Follower, term));
                }
            }
        }

        debug!(from = ?previous, to = %role, term, "partition role change");
        self.ctx.set_role(role);
    }

    async fn run_transition(&mut self, request: TransitionRequest) {
        let TransitionRequest { target, term, ack } = request;
        info!(%target, term, "transition started");

        if target == TransitionTarget::Inactive {
            self.mark_services_uninstalled();
        }

        self.engine.teardown(&mut self.ctx).await;
        self.drain_commands().await;

        let result = self.install(target).await;
        match &result {
            Ok(()) => {
                self.metrics.add_transition();
                if matches!(
                    target,
                    TransitionTarget::Leader | TransitionTarget::Follower
                ) {
                    // compare with the current term in case another role
                    // change arrived while installing
                    if self.ctx.term() == term {
                        self.mark_services_installed();
                        self.notify_listeners(target, term).await;
                    } else {
                        debug!(
                            term,
                            current = self.ctx.term(),
                            "skipping listener notification, transition superseded"
                        );
                    }
                }
                info!(%target, term, "transition completed");
            }
            Err(err) => {
                error!(%target, term, %err, "failed to install partition role");
                self.metrics.add_failed_install();
                self.on_install_failure();
            }
        }

        if let Some(ack) = ack {
            let _ = ack.send(result);
        }
    }

    async fn install(&mut self, target: TransitionTarget) -> Result<(), TransitionError> {
        let steps = self.engine.install_steps(target);
        if !steps.is_empty() {
            // marked before running so a partial install still tears down
            self.engine.mark_installed(target);
        }
        for step in steps {
            debug!(step = step.name(), "installing");
            step.install(&mut self.ctx).await?;
            self.drain_commands().await;
        }
        Ok(())
    }

    /// notify partition listeners in registration order and await all of
    /// their futures. Role changes keep flowing while waiting, so the term
    /// guard below stays live.
    async fn notify_listeners(&mut self, target: TransitionTarget, term: Term) {
        let listeners = self.ctx.partition_listeners().to_vec();
        if listeners.is_empty() {
            return;
        }
        let partition_id = self.ctx.partition_id();

        let results = match target {
            TransitionTarget::Leader => {
                let Some(log_stream) = self.ctx.log_stream() else {
                    warn!("leader installed without log stream, skipping listeners");
                    return;
                };
                let futures: Vec<ListenerFuture<'_>> = listeners
                    .iter()
                    .map(|listener| {
                        listener.on_becoming_leader(partition_id, term, log_stream.clone())
                    })
                    .collect();
                self.await_listeners(futures).await
            }
            TransitionTarget::Follower => {
                let futures: Vec<ListenerFuture<'_>> = listeners
                    .iter()
                    .map(|listener| listener.on_becoming_follower(partition_id, term))
                    .collect();
                self.await_listeners(futures).await
            }
            TransitionTarget::Inactive => return,
        };

        let failure = results
            .into_iter()
            .find_map(|result| result.err())
            .map(|source| TransitionError::Listener { term, source });
        if let Some(err) = failure {
            if self.ctx.term() == term {
                warn!(%err, "partition listener failed, treating as install failure");
                self.on_install_failure();
            } else {
                debug!(%err, current = self.ctx.term(), "dropping listener error from superseded term");
            }
        }
    }

    /// await the listener futures while keeping the mailbox drained
    async fn await_listeners(
        &mut self,
        futures: Vec<ListenerFuture<'_>>,
    ) -> Vec<anyhow::Result<()>> {
        let mut all = join_all(futures);
        loop {
            select! {
                results = &mut all => break results,
                Some(command) = self.mailbox.recv() => self.handle_command(command).await,
            }
        }
    }

    /// handle every command that is already queued without blocking
    async fn drain_commands(&mut self) {
        while let Ok(command) = self.mailbox.try_recv() {
            self.handle_command(command).await;
        }
    }

    fn mark_services_installed(&mut self) {
        self.ctx.set_services_installed(true);
        self.partition_probe.set_services_installed(true);
    }

    fn mark_services_uninstalled(&mut self) {
        self.ctx.set_services_installed(false);
        self.partition_probe.set_services_installed(false);
    }

    /// mark the partition unhealthy and, while raft still sees this member
    /// as leader, step down so the next role change drives a clean install
    /// attempt somewhere
    fn on_install_failure(&mut self) {
        self.mark_services_uninstalled();
        if self.ctx.raft().role() == RaftRole::Leader {
            info!("unexpected failure while installing leader services, stepping down");
            self.ctx.raft().step_down();
        }
    }
}
