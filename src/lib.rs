#![deny(missing_docs)]

//! A bounded worker-pool dispatcher that compares thread workers with
//! process workers on I/O-bound and CPU-bound tasks.
//!
//! A [`Dispatcher`] builds a pool, submits a fixed number of independent
//! tasks, waits for all of them, and reports the elapsed time. Thread
//! workers share one execution lock, so only tasks blocked in a wait
//! overlap; process workers each run in their own address space and
//! compute in parallel.

mod client;
mod config;
mod dispatcher;
mod error;
mod exec_lock;
mod protocol;
mod task;
/// Task pool implementations backed by worker threads or worker processes.
pub mod task_pool;
/// Entry point of a worker process.
pub mod worker;
pub mod workload;

pub use client::WorkerClient;
pub use config::{
    ConcurrencyModel, PoolConfig, RunConfig, DEFAULT_TASKS, DEFAULT_TASK_DURATION,
    DEFAULT_WORKERS, WORKER_FLAG,
};
pub use dispatcher::{Dispatcher, RunReport};
pub use error::{BenchError, Result};
pub use exec_lock::{Execution, ExecutionLock};
pub use protocol::{WorkerRequest, WorkerResponse};
pub use task::{Task, TaskOutput, TaskResult, TaskState, Workload};
pub use task_pool::{await_all, Handle, ProcessTaskPool, TaskPool, ThreadTaskPool};
