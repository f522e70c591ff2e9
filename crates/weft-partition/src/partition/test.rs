use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use derive_builder::Builder;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use fluvio_future::task::spawn;
use fluvio_future::timer::sleep;
use weft_types::event::StickyEvent;
use weft_types::{NodeId, PartitionId, Term};

use crate::config::PartitionConfig;
use crate::health::{FailureListener, HealthStatus};
use crate::monitor::DiskSpaceListener;
use crate::raft::{
    LogIndexMapping, RaftPartition, RaftRole, RoleChangeListener, SharedRaftPartition,
    SnapshotStore,
};
use crate::services::{
    ExporterDirector, LogCompactor, LogStream, ProcessingMode, ServiceFactory, SnapshotDirector,
    SnapshotReplication, StreamProcessor,
};

use super::{PartitionActor, PartitionHandle, PartitionListener};

const NODE: NodeId = 0;

static SETTLE_MS: Lazy<u64> = Lazy::new(|| {
    use std::env;
    if env::var("CI").is_ok() {
        500
    } else {
        100
    }
});

/// wait for the actor to work through everything queued
async fn settle() {
    sleep(Duration::from_millis(*SETTLE_MS)).await;
}

// -----------------------------------
// Mock raft partition
// -----------------------------------

#[derive(Debug)]
struct MockSnapshotStore;

impl SnapshotStore for MockSnapshotStore {
    fn latest_snapshot_index(&self) -> Option<u64> {
        None
    }
}

#[derive(Debug)]
struct MockIndexMapping;

impl LogIndexMapping for MockIndexMapping {
    fn position(&self, raft_index: u64) -> Option<u64> {
        Some(raft_index)
    }
}

struct MockRaft {
    partition_id: PartitionId,
    role: Mutex<RaftRole>,
    term: Mutex<Term>,
    role_listeners: Mutex<Vec<Arc<dyn RoleChangeListener>>>,
    failure_listeners: Mutex<Vec<Arc<dyn FailureListener>>>,
    step_downs: AtomicU64,
    healthy: AtomicBool,
}

impl std::fmt::Debug for MockRaft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRaft")
            .field("partition_id", &self.partition_id)
            .field("role", &*self.role.lock())
            .finish()
    }
}

impl MockRaft {
    fn shared(partition_id: PartitionId, initial_role: RaftRole) -> Arc<Self> {
        Arc::new(Self {
            partition_id,
            role: Mutex::new(initial_role),
            term: Mutex::new(0),
            role_listeners: Mutex::new(vec![]),
            failure_listeners: Mutex::new(vec![]),
            step_downs: AtomicU64::new(0),
            healthy: AtomicBool::new(true),
        })
    }

    /// update raft state and deliver the role change to subscribers
    fn announce(&self, role: RaftRole, term: Term) {
        *self.role.lock() = role;
        *self.term.lock() = term;
        let listeners = self.role_listeners.lock().clone();
        for listener in listeners {
            listener.on_new_role(role, term);
        }
    }

    /// report an unrecoverable raft fault
    fn fail(&self) {
        self.healthy.store(false, Ordering::SeqCst);
        let listeners = self.failure_listeners.lock().clone();
        for listener in listeners {
            listener.on_failure();
        }
    }

    fn step_downs(&self) -> u64 {
        self.step_downs.load(Ordering::SeqCst)
    }
}

impl RaftPartition for MockRaft {
    fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    fn role(&self) -> RaftRole {
        *self.role.lock()
    }

    fn term(&self) -> Term {
        *self.term.lock()
    }

    fn add_role_change_listener(&self, listener: Arc<dyn RoleChangeListener>) {
        self.role_listeners.lock().push(listener);
    }

    fn remove_role_change_listener(&self, listener: &Arc<dyn RoleChangeListener>) {
        self.role_listeners
            .lock()
            .retain(|existing| !Arc::ptr_eq(existing, listener));
    }

    fn step_down(&self) {
        self.step_downs.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot_store(&self) -> Arc<dyn SnapshotStore> {
        Arc::new(MockSnapshotStore)
    }

    fn health_status(&self) -> HealthStatus {
        if self.healthy.load(Ordering::SeqCst) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }

    fn add_failure_listener(&self, listener: Arc<dyn FailureListener>) {
        self.failure_listeners.lock().push(listener);
    }

    fn remove_failure_listener(&self, listener: &Arc<dyn FailureListener>) {
        self.failure_listeners
            .lock()
            .retain(|existing| !Arc::ptr_eq(existing, listener));
    }
}

// -----------------------------------
// Mock services
// -----------------------------------

#[derive(Debug, Default)]
struct MockLogStream {
    closed: AtomicBool,
}

#[async_trait]
impl LogStream for MockLogStream {
    fn last_position(&self) -> u64 {
        0
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug)]
struct MockStreamProcessor {
    mode: ProcessingMode,
    paused: AtomicBool,
    pause_calls: AtomicU64,
    resume_calls: AtomicU64,
    closed: AtomicBool,
}

impl MockStreamProcessor {
    fn new(mode: ProcessingMode) -> Self {
        Self {
            mode,
            paused: AtomicBool::new(false),
            pause_calls: AtomicU64::new(0),
            resume_calls: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    fn paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn pause_calls(&self) -> u64 {
        self.pause_calls.load(Ordering::SeqCst)
    }

    fn resume_calls(&self) -> u64 {
        self.resume_calls.load(Ordering::SeqCst)
    }

    fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamProcessor for MockStreamProcessor {
    async fn pause_processing(&self) -> Result<()> {
        self.paused.store(true, Ordering::SeqCst);
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn resume_processing(&self) -> Result<()> {
        self.paused.store(false, Ordering::SeqCst);
        self.resume_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MockSnapshotDirector {
    force_calls: AtomicU64,
    closed: AtomicBool,
}

#[async_trait]
impl SnapshotDirector for MockSnapshotDirector {
    async fn force_snapshot(&self) -> Result<()> {
        self.force_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MockExporterDirector {
    closed: AtomicBool,
}

#[async_trait]
impl ExporterDirector for MockExporterDirector {
    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MockLogCompactor {
    closed: AtomicBool,
}

#[async_trait]
impl LogCompactor for MockLogCompactor {
    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MockSnapshotReplication {
    closed: AtomicBool,
}

#[async_trait]
impl SnapshotReplication for MockSnapshotReplication {
    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// install gate: a factory build can be held open until the test releases
/// it, to interleave other commands with an in flight transition
#[derive(Debug)]
struct InstallGate {
    reached: Arc<StickyEvent>,
    release: Arc<StickyEvent>,
}

impl InstallGate {
    fn shared() -> Arc<Self> {
        Arc::new(Self {
            reached: StickyEvent::new_shared(),
            release: StickyEvent::new_shared(),
        })
    }

    async fn wait_reached(&self) {
        self.reached.wait().await;
    }

    fn open(&self) {
        self.release.raise();
    }
}

struct MockFactory {
    fail_service: Mutex<Option<&'static str>>,
    director_gate: Mutex<Option<Arc<InstallGate>>>,
    log_streams: Mutex<Vec<Arc<MockLogStream>>>,
    processors: Mutex<Vec<Arc<MockStreamProcessor>>>,
    directors: Mutex<Vec<Arc<MockSnapshotDirector>>>,
    exporters: Mutex<Vec<Arc<MockExporterDirector>>>,
    compactors: Mutex<Vec<Arc<MockLogCompactor>>>,
    replications: Mutex<Vec<Arc<MockSnapshotReplication>>>,
}

impl std::fmt::Debug for MockFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockFactory").finish()
    }
}

impl MockFactory {
    fn shared() -> Arc<Self> {
        Arc::new(Self {
            fail_service: Mutex::new(None),
            director_gate: Mutex::new(None),
            log_streams: Mutex::new(vec![]),
            processors: Mutex::new(vec![]),
            directors: Mutex::new(vec![]),
            exporters: Mutex::new(vec![]),
            compactors: Mutex::new(vec![]),
            replications: Mutex::new(vec![]),
        })
    }

    fn fail_on(&self, service: &'static str) {
        *self.fail_service.lock() = Some(service);
    }

    fn gate_director(&self) -> Arc<InstallGate> {
        let gate = InstallGate::shared();
        *self.director_gate.lock() = Some(gate.clone());
        gate
    }

    fn check_failure(&self, service: &'static str) -> Result<()> {
        if self.fail_service.lock().as_deref() == Some(service) {
            return Err(anyhow!("injected {service} failure"));
        }
        Ok(())
    }

    fn last_processor(&self) -> Arc<MockStreamProcessor> {
        self.processors.lock().last().expect("processor").clone()
    }

    fn processor_count(&self) -> usize {
        self.processors.lock().len()
    }
}

#[async_trait]
impl ServiceFactory for MockFactory {
    async fn log_stream(&self, _ctx: &super::PartitionContext) -> Result<Arc<dyn LogStream>> {
        self.check_failure("log-stream")?;
        let stream = Arc::new(MockLogStream::default());
        self.log_streams.lock().push(stream.clone());
        Ok(stream)
    }

    async fn stream_processor(
        &self,
        _ctx: &super::PartitionContext,
        mode: ProcessingMode,
    ) -> Result<Arc<dyn StreamProcessor>> {
        self.check_failure("stream-processor")?;
        let processor = Arc::new(MockStreamProcessor::new(mode));
        self.processors.lock().push(processor.clone());
        Ok(processor)
    }

    async fn snapshot_director(
        &self,
        _ctx: &super::PartitionContext,
    ) -> Result<Arc<dyn SnapshotDirector>> {
        let gate = self.director_gate.lock().clone();
        if let Some(gate) = gate {
            gate.reached.raise();
            gate.release.wait().await;
        }
        self.check_failure("snapshot-director")?;
        let director = Arc::new(MockSnapshotDirector::default());
        self.directors.lock().push(director.clone());
        Ok(director)
    }

    async fn exporter_director(
        &self,
        _ctx: &super::PartitionContext,
    ) -> Result<Arc<dyn ExporterDirector>> {
        self.check_failure("exporter-director")?;
        let exporter = Arc::new(MockExporterDirector::default());
        self.exporters.lock().push(exporter.clone());
        Ok(exporter)
    }

    async fn log_compactor(&self, _ctx: &super::PartitionContext) -> Result<Arc<dyn LogCompactor>> {
        self.check_failure("log-compaction")?;
        let compactor = Arc::new(MockLogCompactor::default());
        self.compactors.lock().push(compactor.clone());
        Ok(compactor)
    }

    async fn snapshot_replication(
        &self,
        _ctx: &super::PartitionContext,
    ) -> Result<Arc<dyn SnapshotReplication>> {
        self.check_failure("snapshot-replication")?;
        let replication = Arc::new(MockSnapshotReplication::default());
        self.replications.lock().push(replication.clone());
        Ok(replication)
    }
}

// -----------------------------------
// Mock partition listener
// -----------------------------------

type ListenerJournal = Arc<Mutex<Vec<(String, Term)>>>;

#[derive(Debug)]
struct MockListener {
    name: &'static str,
    journal: ListenerJournal,
    fail_leader: AtomicBool,
}

impl MockListener {
    fn shared(name: &'static str, journal: ListenerJournal) -> Arc<Self> {
        Arc::new(Self {
            name,
            journal,
            fail_leader: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl PartitionListener for MockListener {
    async fn on_becoming_leader(
        &self,
        _partition_id: PartitionId,
        term: Term,
        _log_stream: Arc<dyn LogStream>,
    ) -> Result<()> {
        self.journal.lock().push((format!("{}:leader", self.name), term));
        if self.fail_leader.load(Ordering::SeqCst) {
            return Err(anyhow!("listener rejected leadership"));
        }
        Ok(())
    }

    async fn on_becoming_follower(&self, _partition_id: PartitionId, term: Term) -> Result<()> {
        self.journal
            .lock()
            .push((format!("{}:follower", self.name), term));
        Ok(())
    }
}

// -----------------------------------
// Fixture
// -----------------------------------

#[derive(Builder, Debug)]
pub(crate) struct TestConfig {
    #[builder(setter(into), default = "1")]
    partition_id: PartitionId,
    #[builder(default = "RaftRole::Inactive")]
    initial_role: RaftRole,
}

impl TestConfig {
    pub(crate) fn builder() -> TestConfigBuilder {
        TestConfigBuilder::default()
    }

    async fn start(self) -> TestPartition {
        self.start_with_factory(MockFactory::shared()).await
    }

    async fn start_with_factory(self, factory: Arc<MockFactory>) -> TestPartition {
        let journal: ListenerJournal = Arc::new(Mutex::new(vec![]));
        let listener = MockListener::shared("primary", journal.clone());
        let raft = MockRaft::shared(self.partition_id, self.initial_role);
        let handle = PartitionActor::start(
            PartitionConfig::default(),
            NODE,
            raft.clone() as SharedRaftPartition,
            Arc::new(MockIndexMapping),
            factory.clone(),
            vec![listener.clone() as Arc<dyn PartitionListener>],
        );
        settle().await;

        TestPartition {
            raft,
            factory,
            listener,
            journal,
            handle,
        }
    }
}

struct TestPartition {
    raft: Arc<MockRaft>,
    factory: Arc<MockFactory>,
    listener: Arc<MockListener>,
    journal: ListenerJournal,
    handle: PartitionHandle,
}

impl TestPartition {
    fn events(&self) -> Vec<(String, Term)> {
        self.journal.lock().clone()
    }

    fn last_processor_mode(&self) -> ProcessingMode {
        self.factory.last_processor().mode
    }
}

// -----------------------------------
// Scenarios
// -----------------------------------

#[fluvio_future::test]
async fn test_clean_leader_install() {
    let partition = TestConfig::builder().build().expect("config").start().await;
    assert_eq!(partition.handle.health_status(), HealthStatus::Unhealthy);

    partition.raft.announce(RaftRole::Leader, 5);
    settle().await;

    assert_eq!(partition.events(), vec![("primary:leader".to_owned(), 5)]);
    assert_eq!(partition.handle.health_status(), HealthStatus::Healthy);
    assert_eq!(partition.handle.metrics().healthy(), 1);

    let processor = partition.handle.stream_processor().await.expect("processor");
    processor.pause_processing().await.expect("pause");

    // exactly one of each leader service was built
    assert_eq!(partition.factory.processor_count(), 1);
    assert_eq!(partition.factory.directors.lock().len(), 1);
    assert_eq!(partition.factory.exporters.lock().len(), 1);
    assert_eq!(partition.last_processor_mode(), ProcessingMode::Processing);
}

#[fluvio_future::test]
async fn test_failed_leader_install_steps_down() {
    let partition = TestConfig::builder().build().expect("config").start().await;
    partition.factory.fail_on("snapshot-replication");

    partition.raft.announce(RaftRole::Leader, 7);
    settle().await;

    assert_eq!(partition.raft.step_downs(), 1);
    assert!(partition.events().is_empty());
    assert_eq!(partition.handle.health_status(), HealthStatus::Unhealthy);
    assert_eq!(partition.handle.metrics().failed_installs(), 1);
    assert!(partition.handle.stream_processor().await.is_none());
}

#[fluvio_future::test]
async fn test_superseded_transition_skips_stale_listeners() {
    let factory = MockFactory::shared();
    let gate = factory.gate_director();
    let partition = TestConfig::builder()
        .build()
        .expect("config")
        .start_with_factory(factory)
        .await;

    partition.raft.announce(RaftRole::Leader, 10);
    gate.wait_reached().await;

    // a new term arrives while the leader install is still in flight
    partition.raft.announce(RaftRole::Follower, 11);
    gate.open();
    settle().await;

    // the leader install completed but its term was stale by then
    assert_eq!(partition.events(), vec![("primary:follower".to_owned(), 11)]);
    assert_eq!(partition.last_processor_mode(), ProcessingMode::Replay);
    assert_eq!(partition.handle.health_status(), HealthStatus::Healthy);

    // the leader mode processor was torn down during the follower install
    let processors = partition.factory.processors.lock().clone();
    assert_eq!(processors.len(), 2);
    assert!(processors[0].closed());
    assert!(!processors[1].closed());
}

#[fluvio_future::test]
async fn test_disk_pressure_pauses_and_resumes() {
    let partition = TestConfig::builder().build().expect("config").start().await;
    partition.raft.announce(RaftRole::Leader, 5);
    settle().await;

    let processor = partition.factory.last_processor();
    assert!(!processor.paused());

    partition.handle.on_disk_space_not_available();
    settle().await;
    assert!(processor.paused());
    assert_eq!(processor.pause_calls(), 1);
    assert_eq!(partition.handle.health_status(), HealthStatus::Unhealthy);

    partition.handle.on_disk_space_available();
    settle().await;
    assert!(!processor.paused());
    assert_eq!(processor.resume_calls(), 1);
    assert_eq!(partition.handle.health_status(), HealthStatus::Healthy);
}

#[fluvio_future::test]
async fn test_explicit_pause_composes_with_disk_pressure() {
    let partition = TestConfig::builder().build().expect("config").start().await;
    partition.raft.announce(RaftRole::Leader, 5);
    settle().await;

    let processor = partition.factory.last_processor();
    partition.handle.pause_processing().await.expect("pause");
    assert!(processor.paused());

    partition.handle.on_disk_space_not_available();
    settle().await;

    // disk recovering must not resume while the explicit pause holds
    partition.handle.on_disk_space_available();
    settle().await;
    assert!(processor.paused());
    assert_eq!(processor.resume_calls(), 0);

    partition.handle.resume_processing();
    settle().await;
    assert!(!processor.paused());
    assert_eq!(processor.resume_calls(), 1);
}

#[fluvio_future::test]
async fn test_shutdown_drains_pending_install() {
    let factory = MockFactory::shared();
    let gate = factory.gate_director();
    let partition = TestConfig::builder()
        .build()
        .expect("config")
        .start_with_factory(factory)
        .await;

    partition.raft.announce(RaftRole::Leader, 3);
    gate.wait_reached().await;

    // close while the install is still blocked on the snapshot director
    let close_done = StickyEvent::new_shared();
    let closer = partition.handle.clone();
    let close_flag = close_done.clone();
    spawn(async move {
        closer.close().await;
        close_flag.raise();
    });

    settle().await;
    assert!(!close_done.is_raised());

    gate.open();
    close_done.wait().await;

    // install finished before the drain, so listeners saw the leadership
    assert_eq!(partition.events(), vec![("primary:leader".to_owned(), 3)]);

    // every handle was drained
    let processors = partition.factory.processors.lock().clone();
    assert!(processors.iter().all(|processor| processor.closed()));
    let directors = partition.factory.directors.lock().clone();
    assert!(directors.iter().all(|d| d.closed.load(Ordering::SeqCst)));
    assert!(partition.handle.stream_processor().await.is_none());

    // a second close resolves immediately against the same drain
    partition.handle.close().await;
}

#[fluvio_future::test]
async fn test_close_idempotent() {
    let partition = TestConfig::builder().build().expect("config").start().await;
    partition.raft.announce(RaftRole::Leader, 2);
    settle().await;

    partition.handle.close().await;
    partition.handle.close().await;
    partition.handle.close().await;

    let processors = partition.factory.processors.lock().clone();
    assert!(processors.iter().all(|processor| processor.closed()));
}

#[fluvio_future::test]
async fn test_role_wiggle_keeps_services() {
    let partition = TestConfig::builder()
        .initial_role(RaftRole::Follower)
        .build()
        .expect("config")
        .start()
        .await;

    // startup replayed the follower role
    assert_eq!(partition.events(), vec![("primary:follower".to_owned(), 0)]);
    assert_eq!(partition.factory.processor_count(), 1);

    // raft internal churn between non leader roles must not reinstall
    partition.raft.announce(RaftRole::Candidate, 2);
    partition.raft.announce(RaftRole::Follower, 2);
    settle().await;

    assert_eq!(partition.factory.processor_count(), 1);
    assert_eq!(partition.events().len(), 1);
    assert!(!partition.factory.last_processor().closed());
}

#[fluvio_future::test]
async fn test_raft_failure_drains_to_inactive() {
    let partition = TestConfig::builder().build().expect("config").start().await;
    partition.raft.announce(RaftRole::Leader, 4);
    settle().await;

    partition.raft.fail();
    settle().await;

    assert_eq!(partition.handle.health_status(), HealthStatus::Unhealthy);
    assert!(partition.handle.stream_processor().await.is_none());
    let processors = partition.factory.processors.lock().clone();
    assert!(processors.iter().all(|processor| processor.closed()));

    // the partition is drained but not closed
    assert_eq!(partition.raft.step_downs(), 0);
}

#[fluvio_future::test]
async fn test_trigger_snapshot_forwarded_and_dropped() {
    let partition = TestConfig::builder().build().expect("config").start().await;

    // without a director the request is silently dropped
    partition.handle.trigger_snapshot();
    settle().await;
    assert!(partition.factory.directors.lock().is_empty());

    partition.raft.announce(RaftRole::Leader, 5);
    settle().await;

    partition.handle.trigger_snapshot();
    settle().await;
    let director = partition.factory.directors.lock()[0].clone();
    assert_eq!(director.force_calls.load(Ordering::SeqCst), 1);
}

#[fluvio_future::test]
async fn test_listener_failure_steps_down() {
    let partition = TestConfig::builder().build().expect("config").start().await;
    partition.listener.fail_leader.store(true, Ordering::SeqCst);

    partition.raft.announce(RaftRole::Leader, 6);
    settle().await;

    assert_eq!(partition.raft.step_downs(), 1);
    assert_eq!(partition.handle.health_status(), HealthStatus::Unhealthy);
}

#[fluvio_future::test]
async fn test_listeners_notified_in_registration_order() {
    let journal: ListenerJournal = Arc::new(Mutex::new(vec![]));
    let first = MockListener::shared("first", journal.clone());
    let second = MockListener::shared("second", journal.clone());
    let raft = MockRaft::shared(1, RaftRole::Inactive);

    let handle = PartitionActor::start(
        PartitionConfig::default(),
        NODE,
        raft.clone() as SharedRaftPartition,
        Arc::new(MockIndexMapping),
        MockFactory::shared(),
        vec![
            first.clone() as Arc<dyn PartitionListener>,
            second.clone() as Arc<dyn PartitionListener>,
        ],
    );
    settle().await;

    raft.announce(RaftRole::Leader, 9);
    settle().await;

    assert_eq!(
        journal.lock().clone(),
        vec![
            ("first:leader".to_owned(), 9),
            ("second:leader".to_owned(), 9)
        ]
    );

    handle.close().await;
}

#[fluvio_future::test]
async fn test_pause_before_install_starts_processor_paused() {
    let partition = TestConfig::builder().build().expect("config").start().await;
    partition.handle.pause_processing().await.expect("pause");

    partition.raft.announce(RaftRole::Leader, 5);
    settle().await;

    let processor = partition.factory.last_processor();
    assert!(processor.paused());

    partition.handle.resume_processing();
    settle().await;
    assert!(!processor.paused());
}
