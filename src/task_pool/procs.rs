use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{error, info};

use super::shared_queue::{JobRunner, SharedQueue};
use super::{Handle, TaskPool};
use crate::client::WorkerClient;
use crate::protocol::WorkerResponse;
use crate::task::{Task, TaskResult};
use crate::{BenchError, Result};

/// A pool of worker processes, each with its own address space.
///
/// Every worker slot owns one child process launched as
/// `program --worker`. Tasks are copied to the child as JSON and only the
/// returned output comes back: a task cannot see or change anything in
/// the caller's memory, and anything it changes in its own is lost.
///
/// Each child has a private execution lock, so CPU-bound tasks run in
/// parallel up to the number of cores.
///
/// If a child dies, its in-flight task is reported as failed and a fresh
/// child is started for the slot's next task. Tasks are never re-run.
pub struct ProcessTaskPool {
    workers: u32,
    queue: SharedQueue,
}

impl ProcessTaskPool {
    /// Starts `workers` worker processes from `program`.
    ///
    /// # Errors
    ///
    /// Returns an error if `workers` is zero or a worker process cannot
    /// be launched.
    pub fn new(workers: u32, budget: Duration, program: impl Into<PathBuf>) -> Result<Self> {
        if workers == 0 {
            return Err(BenchError::InvalidPoolSize(workers));
        }
        let program = program.into();
        let queue = SharedQueue::start(workers, "pool-proc", |slot| {
            let client = WorkerClient::spawn(&program)?;
            Ok(ProcessRunner {
                slot,
                program: program.clone(),
                budget,
                client: Some(client),
            })
        })?;
        Ok(ProcessTaskPool { workers, queue })
    }
}

impl TaskPool for ProcessTaskPool {
    fn workers(&self) -> u32 {
        self.workers
    }

    fn submit(&self, task: Task) -> Handle {
        self.queue.push(task)
    }
}

struct ProcessRunner {
    slot: u32,
    program: PathBuf,
    budget: Duration,
    client: Option<WorkerClient>,
}

impl ProcessRunner {
    fn client(&mut self) -> Result<&mut WorkerClient> {
        let client = match self.client.take() {
            Some(client) => client,
            None => respawn(self.slot, &self.program)?,
        };
        Ok(self.client.insert(client))
    }
}

fn respawn(slot: u32, program: &Path) -> Result<WorkerClient> {
    let client = WorkerClient::spawn(program)?;
    info!("Slot {} restarted as worker process {}", slot, client.pid());
    Ok(client)
}

impl JobRunner for ProcessRunner {
    fn run(&mut self, task: &Task) -> TaskResult {
        let budget = self.budget;
        let response = match self.client() {
            Ok(client) => client.run(*task, budget),
            Err(e) => Err(e),
        };

        match response {
            Ok(WorkerResponse::Ok(output)) => TaskResult::Completed {
                id: task.id,
                output,
            },
            Ok(WorkerResponse::Err(message)) => TaskResult::Failed {
                id: task.id,
                message,
            },
            Err(e) => {
                error!("Slot {} lost its worker process: {}", self.slot, e);
                if let Some(client) = self.client.take() {
                    client.kill();
                }
                TaskResult::Failed {
                    id: task.id,
                    message: e.to_string(),
                }
            }
        }
    }
}
