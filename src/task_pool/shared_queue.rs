use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, error};

use super::{panic_message, Handle, Job};
use crate::task::{Task, TaskResult};
use crate::Result;

/// Per-worker execution strategy plugged into the shared queue.
pub(crate) trait JobRunner: Send + 'static {
    /// Runs one task to a terminal result.
    fn run(&mut self, task: &Task) -> TaskResult;
}

/// A fixed set of worker threads pulling jobs from one MPMC channel.
///
/// Dropping the queue closes the channel and joins every worker, so
/// whatever the runners own (child processes included) is released
/// before the drop returns.
pub(crate) struct SharedQueue {
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl SharedQueue {
    /// Starts `workers` threads, each owning the runner `make_runner`
    /// builds for it.
    pub(crate) fn start<R, F>(workers: u32, name: &str, mut make_runner: F) -> Result<Self>
    where
        R: JobRunner,
        F: FnMut(u32) -> Result<R>,
    {
        let (tx, rx) = channel::unbounded::<Job>();
        let mut queue = SharedQueue {
            tx: Some(tx),
            workers: Vec::with_capacity(workers as usize),
        };

        for id in 0..workers {
            let runner = make_runner(id)?;
            let handle = spawn_worker(id, name, rx.clone(), runner)?;
            queue.workers.push(handle);
        }

        Ok(queue)
    }

    /// Queues a task. If no worker is left to take it, the returned
    /// handle resolves to a failure.
    pub(crate) fn push(&self, task: Task) -> Handle {
        let (job, handle) = Job::new(task);
        match &self.tx {
            Some(tx) => {
                if tx.send(job).is_err() {
                    error!("No active workers, task {} dropped", task.id);
                }
            }
            None => error!("Queue is shut down, task {} dropped", task.id),
        }
        handle
    }
}

impl Drop for SharedQueue {
    fn drop(&mut self) {
        // Closing the channel makes every worker loop return.
        self.tx.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("Worker thread exited abnormally");
            }
        }
    }
}

/// Spawns a single worker thread that pulls jobs from the receiver.
/// A panicking task is reported as failed and the worker keeps going.
fn spawn_worker<R: JobRunner>(
    id: u32,
    name: &str,
    rx: Receiver<Job>,
    mut runner: R,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name(format!("{name}-{id}"))
        .spawn(move || loop {
            match rx.recv() {
                Ok(Job { task, completion }) => {
                    debug!("Worker {id} executing task {}", task.id);
                    completion.start();
                    let result =
                        match panic::catch_unwind(AssertUnwindSafe(|| runner.run(&task))) {
                            Ok(result) => result,
                            Err(payload) => {
                                let message = panic_message(&*payload);
                                error!("Worker {id} task {} panicked: {message}", task.id);
                                TaskResult::Failed {
                                    id: task.id,
                                    message: format!("task panicked: {message}"),
                                }
                            }
                        };
                    completion.finish(result);
                }
                Err(_) => {
                    debug!("Worker {id}: channel closed, shutting down");
                    return;
                }
            }
        })?;
    Ok(handle)
}
