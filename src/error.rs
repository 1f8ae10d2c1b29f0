use std::io;
use thiserror::Error;

/// Error type for taskbench operations.
#[derive(Error, Debug)]
pub enum BenchError {
    /// IO error from spawning or talking to worker processes.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error on the worker protocol.
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A pool was requested with no workers.
    #[error("Invalid pool size: {0} (need at least one worker)")]
    InvalidPoolSize(u32),

    /// Unknown workload or concurrency model name.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// A worker process went away or answered out of protocol.
    #[error("Worker process error: {0}")]
    WorkerProcess(String),
}

/// Result type alias for taskbench operations.
pub type Result<T> = std::result::Result<T, BenchError>;
