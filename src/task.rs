use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{BenchError, Result};

/// The shape of work a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Workload {
    /// Blocks in a wait without using the CPU.
    Io,
    /// Spins on the CPU until its time budget runs out.
    Cpu,
}

impl Workload {
    /// Human-readable description used in the run banner.
    pub fn describe(self) -> &'static str {
        match self {
            Workload::Io => "I/O-bound workload",
            Workload::Cpu => "CPU-bound workload",
        }
    }
}

impl FromStr for Workload {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "io" => Ok(Workload::Io),
            "cpu" => Ok(Workload::Cpu),
            other => Err(BenchError::InvalidSelection(format!(
                "unknown workload '{other}', expected 'io' or 'cpu'"
            ))),
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workload::Io => f.write_str("io"),
            Workload::Cpu => f.write_str("cpu"),
        }
    }
}

/// A unit of work submitted to a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier assigned by the dispatcher, unique within a run.
    pub id: u64,
    /// Which workload function runs this task.
    pub workload: Workload,
}

impl Task {
    /// Creates a task descriptor.
    pub fn new(id: u64, workload: Workload) -> Self {
        Task { id, workload }
    }
}

/// The value a successful task produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOutput {
    /// An I/O-bound task echoes its identifier.
    Echo(u64),
    /// A CPU-bound task reports how many loop iterations fit in its budget.
    Iterations(u64),
}

/// The terminal outcome of one task, as collected by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// The task ran to completion.
    Completed {
        /// Task identifier.
        id: u64,
        /// What the workload returned.
        output: TaskOutput,
    },
    /// The task panicked, or its worker went away before answering.
    Failed {
        /// Task identifier.
        id: u64,
        /// Why it failed.
        message: String,
    },
}

impl TaskResult {
    /// Identifier of the task this result belongs to.
    pub fn id(&self) -> u64 {
        match self {
            TaskResult::Completed { id, .. } | TaskResult::Failed { id, .. } => *id,
        }
    }

    /// Returns `true` if the task completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskResult::Completed { .. })
    }
}

/// Lifecycle of a submitted task.
///
/// `Pending -> Running -> Completed` or `Pending -> Running -> Failed`.
/// A task whose worker vanished before picking it up may also go straight
/// from `Pending` to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Queued, not yet picked up by a worker.
    Pending,
    /// A worker is executing it.
    Running,
    /// Finished with an output.
    Completed,
    /// Finished without an output.
    Failed,
}

impl TaskState {
    /// Returns `true` for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}
