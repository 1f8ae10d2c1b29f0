use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskOutput};

/// Request sent from a pool to one of its worker processes.
#[derive(Debug, Serialize, Deserialize)]
pub enum WorkerRequest {
    /// Run a task.
    Run {
        /// The task to run.
        task: Task,
        /// How long the workload waits or spins.
        budget: Duration,
    },
}

/// Response sent from a worker process back to its pool.
#[derive(Debug, Serialize, Deserialize)]
pub enum WorkerResponse {
    /// The task completed with this output.
    Ok(TaskOutput),
    /// The task failed with an error message.
    Err(String),
}
