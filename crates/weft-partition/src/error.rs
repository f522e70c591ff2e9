use weft_types::Term;

/// Error raised while moving the partition from one role to another.
#[derive(thiserror::Error, Debug)]
pub enum TransitionError {
    #[error("step {step} failed to install: {source}")]
    StepInstall {
        step: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("step {step} failed to tear down: {source}")]
    StepTeardown {
        step: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("partition listener failed at term {term}: {source}")]
    Listener {
        term: Term,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum PartitionError {
    #[error("partition actor is shut down")]
    Shutdown,
    #[error("stream processor call failed: {0}")]
    Processor(#[source] anyhow::Error),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}
