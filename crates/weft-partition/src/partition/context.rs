use std::sync::Arc;

use weft_types::{partition_name, NodeId, PartitionId, Term};

use crate::config::PartitionConfig;
use crate::raft::{RaftLogStorage, RaftRole, SharedRaftPartition};
use crate::services::{
    ExporterDirector, LogCompactor, LogStream, SnapshotDirector, SnapshotReplication,
    StreamProcessor,
};

use super::listener::PartitionListener;

/// Actor confined state of one partition on this node.
///
/// Only the partition actor task ever mutates this; everything else observes
/// snapshots through actor dispatched calls. Service handles are present
/// exactly while their installing step is installed.
#[derive(Debug)]
pub struct PartitionContext {
    node_id: NodeId,
    partition_id: PartitionId,
    name: String,
    config: PartitionConfig,
    raft: SharedRaftPartition,

    role: Option<RaftRole>,
    term: Term,

    log_storage: Option<RaftLogStorage>,
    log_stream: Option<Arc<dyn LogStream>>,
    stream_processor: Option<Arc<dyn StreamProcessor>>,
    snapshot_director: Option<Arc<dyn SnapshotDirector>>,
    exporter_director: Option<Arc<dyn ExporterDirector>>,
    log_compactor: Option<Arc<dyn LogCompactor>>,
    snapshot_replication: Option<Arc<dyn SnapshotReplication>>,

    disk_space_available: bool,
    processing_paused: bool,
    services_installed: bool,

    listeners: Vec<Arc<dyn PartitionListener>>,
}

impl PartitionContext {
    pub fn new(
        node_id: NodeId,
        config: PartitionConfig,
        raft: SharedRaftPartition,
        listeners: Vec<Arc<dyn PartitionListener>>,
    ) -> Self {
        let partition_id = raft.partition_id();
        Self {
            node_id,
            partition_id,
            name: partition_name(node_id, partition_id),
            config,
            raft,
            role: None,
            term: 0,
            log_storage: None,
            log_stream: None,
            stream_processor: None,
            snapshot_director: None,
            exporter_director: None,
            log_compactor: None,
            snapshot_replication: None,
            disk_space_available: true,
            processing_paused: false,
            services_installed: false,
            listeners,
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    /// log and metric label of this controller
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    pub fn raft(&self) -> &SharedRaftPartition {
        &self.raft
    }

    pub fn role(&self) -> Option<RaftRole> {
        self.role
    }

    pub fn set_role(&mut self, role: RaftRole) {
        self.role = Some(role);
    }

    pub fn term(&self) -> Term {
        self.term
    }

    pub fn set_term(&mut self, term: Term) {
        self.term = term;
    }

    /// the single authority consulted before resuming the stream processor
    pub fn should_process(&self) -> bool {
        self.disk_space_available && !self.processing_paused
    }

    pub fn disk_space_available(&self) -> bool {
        self.disk_space_available
    }

    pub fn set_disk_space_available(&mut self, available: bool) {
        self.disk_space_available = available;
    }

    pub fn processing_paused(&self) -> bool {
        self.processing_paused
    }

    pub fn set_processing_paused(&mut self, paused: bool) {
        self.processing_paused = paused;
    }

    pub fn services_installed(&self) -> bool {
        self.services_installed
    }

    pub fn set_services_installed(&mut self, installed: bool) {
        self.services_installed = installed;
    }

    pub fn partition_listeners(&self) -> &[Arc<dyn PartitionListener>] {
        &self.listeners
    }

    pub fn log_storage(&self) -> Option<&RaftLogStorage> {
        self.log_storage.as_ref()
    }

    pub fn set_log_storage(&mut self, storage: RaftLogStorage) {
        self.log_storage = Some(storage);
    }

    pub fn log_stream(&self) -> Option<Arc<dyn LogStream>> {
        self.log_stream.clone()
    }

    pub fn set_log_stream(&mut self, stream: Arc<dyn LogStream>) {
        self.log_stream = Some(stream);
    }

    pub fn take_log_stream(&mut self) -> Option<Arc<dyn LogStream>> {
        self.log_stream.take()
    }

    pub fn stream_processor(&self) -> Option<Arc<dyn StreamProcessor>> {
        self.stream_processor.clone()
    }

    pub fn set_stream_processor(&mut self, processor: Arc<dyn StreamProcessor>) {
        self.stream_processor = Some(processor);
    }

    pub fn take_stream_processor(&mut self) -> Option<Arc<dyn StreamProcessor>> {
        self.stream_processor.take()
    }

    pub fn snapshot_director(&self) -> Option<Arc<dyn SnapshotDirector>> {
        self.snapshot_director.clone()
    }

    pub fn set_snapshot_director(&mut self, director: Arc<dyn SnapshotDirector>) {
        self.snapshot_director = Some(director);
    }

    pub fn take_snapshot_director(&mut self) -> Option<Arc<dyn SnapshotDirector>> {
        self.snapshot_director.take()
    }

    pub fn exporter_director(&self) -> Option<Arc<dyn ExporterDirector>> {
        self.exporter_director.clone()
    }

    pub fn set_exporter_director(&mut self, director: Arc<dyn ExporterDirector>) {
        self.exporter_director = Some(director);
    }

    pub fn take_exporter_director(&mut self) -> Option<Arc<dyn ExporterDirector>> {
        self.exporter_director.take()
    }

    pub fn log_compactor(&self) -> Option<Arc<dyn LogCompactor>> {
        self.log_compactor.clone()
    }

    pub fn set_log_compactor(&mut self, compactor: Arc<dyn LogCompactor>) {
        self.log_compactor = Some(compactor);
    }

    pub fn take_log_compactor(&mut self) -> Option<Arc<dyn LogCompactor>> {
        self.log_compactor.take()
    }

    pub fn snapshot_replication(&self) -> Option<Arc<dyn SnapshotReplication>> {
        self.snapshot_replication.clone()
    }

    pub fn set_snapshot_replication(&mut self, replication: Arc<dyn SnapshotReplication>) {
        self.snapshot_replication = Some(replication);
    }

    pub fn take_snapshot_replication(&mut self) -> Option<Arc<dyn SnapshotReplication>> {
        self.snapshot_replication.take()
    }
}
