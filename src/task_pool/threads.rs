use std::time::Duration;

use super::shared_queue::{JobRunner, SharedQueue};
use super::{Handle, TaskPool};
use crate::exec_lock::ExecutionLock;
use crate::task::{Task, TaskResult};
use crate::workload;
use crate::{BenchError, Result};

/// A pool of worker threads sharing the caller's address space.
///
/// All workers share one [`ExecutionLock`]: at most one task computes at
/// any moment, and only tasks parked in a blocking wait overlap. CPU-bound
/// work therefore gains nothing from extra workers, while I/O-bound work
/// scales with the pool size.
pub struct ThreadTaskPool {
    workers: u32,
    queue: SharedQueue,
}

impl ThreadTaskPool {
    /// Starts `workers` threads that give each task `budget` to run.
    ///
    /// # Errors
    ///
    /// Returns an error if `workers` is zero or a thread cannot be spawned.
    pub fn new(workers: u32, budget: Duration) -> Result<Self> {
        if workers == 0 {
            return Err(BenchError::InvalidPoolSize(workers));
        }
        let lock = ExecutionLock::new();
        let queue = SharedQueue::start(workers, "pool-thread", |_| {
            Ok(ThreadRunner {
                lock: lock.clone(),
                budget,
            })
        })?;
        Ok(ThreadTaskPool { workers, queue })
    }
}

impl TaskPool for ThreadTaskPool {
    fn workers(&self) -> u32 {
        self.workers
    }

    fn submit(&self, task: Task) -> Handle {
        self.queue.push(task)
    }
}

struct ThreadRunner {
    lock: ExecutionLock,
    budget: Duration,
}

impl JobRunner for ThreadRunner {
    fn run(&mut self, task: &Task) -> TaskResult {
        TaskResult::Completed {
            id: task.id,
            output: workload::execute(task, self.budget, &self.lock),
        }
    }
}
