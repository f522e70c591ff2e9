mod exporter;
mod log_compaction;
mod log_stream;
mod snapshot_director;
mod snapshot_replication;
mod stream_processor;

pub use exporter::ExporterDirectorStep;
pub use log_compaction::LogCompactionStep;
pub use log_stream::LogStreamStep;
pub use snapshot_director::SnapshotDirectorStep;
pub use snapshot_replication::SnapshotReplicationStep;
pub use stream_processor::StreamProcessorStep;
