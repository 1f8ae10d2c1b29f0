use std::any::Any;
use std::sync::Arc;

use crossbeam::atomic::AtomicCell;
use crossbeam::channel::{self, Receiver, Sender};

use crate::task::{Task, TaskResult, TaskState};

/// A bounded pool that runs submitted tasks on a fixed set of workers.
///
/// Implementors differ only in how workers are isolated from each other
/// and from the caller.
pub trait TaskPool {
    /// Number of workers, fixed at construction.
    fn workers(&self) -> u32;

    /// Queues a task for the next free worker and returns its handle.
    ///
    /// Never blocks beyond queuing. If the pool cannot accept the task,
    /// the handle resolves to a failed result.
    fn submit(&self, task: Task) -> Handle;
}

mod procs;
mod shared_queue;
mod threads;

pub use self::procs::ProcessTaskPool;
pub use self::threads::ThreadTaskPool;

/// Waits until every handle is terminal and returns all of their results.
///
/// This is the barrier between the map and reduce phases. A failed task
/// does not cut the wait short; its failure is part of the output.
pub fn await_all<I>(handles: I) -> Vec<TaskResult>
where
    I: IntoIterator<Item = Handle>,
{
    handles.into_iter().map(Handle::wait).collect()
}

/// The caller's side of one submitted task.
pub struct Handle {
    id: u64,
    state: Arc<AtomicCell<TaskState>>,
    rx: Receiver<TaskResult>,
}

impl Handle {
    /// Identifier of the task behind this handle.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current lifecycle state of the task.
    pub fn state(&self) -> TaskState {
        self.state.load()
    }

    /// Blocks until the task is terminal and returns its result.
    ///
    /// If the worker side went away without answering, the task is
    /// reported as failed instead of hanging.
    pub fn wait(self) -> TaskResult {
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => {
                self.state.store(TaskState::Failed);
                TaskResult::Failed {
                    id: self.id,
                    message: "worker dropped the task before finishing it".to_owned(),
                }
            }
        }
    }
}

/// A task paired with the worker's side of its handle.
pub(crate) struct Job {
    pub(crate) task: Task,
    pub(crate) completion: Completion,
}

impl Job {
    /// Creates a job and the handle that observes it.
    pub(crate) fn new(task: Task) -> (Job, Handle) {
        let (tx, rx) = channel::bounded(1);
        let state = Arc::new(AtomicCell::new(TaskState::Pending));
        let handle = Handle {
            id: task.id,
            state: state.clone(),
            rx,
        };
        let job = Job {
            task,
            completion: Completion { state, tx },
        };
        (job, handle)
    }
}

/// The worker's side of a handle.
pub(crate) struct Completion {
    state: Arc<AtomicCell<TaskState>>,
    tx: Sender<TaskResult>,
}

impl Completion {
    pub(crate) fn start(&self) {
        self.state.store(TaskState::Running);
    }

    pub(crate) fn finish(self, result: TaskResult) {
        let state = if result.is_completed() {
            TaskState::Completed
        } else {
            TaskState::Failed
        };
        self.state.store(state);
        // The dispatcher may have given up on the handle.
        let _ = self.tx.send(result);
    }
}

/// Extracts the message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
