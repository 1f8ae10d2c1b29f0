use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::task::Workload;
use crate::{BenchError, Result};

/// Number of tasks a run submits unless told otherwise.
pub const DEFAULT_TASKS: u64 = 200;
/// Pool size unless told otherwise.
pub const DEFAULT_WORKERS: u32 = 32;
/// How long each task waits or spins unless told otherwise.
pub const DEFAULT_TASK_DURATION: Duration = Duration::from_secs(1);

/// Flag that switches the binary into worker-process mode.
pub const WORKER_FLAG: &str = "--worker";

/// How pool workers are isolated from each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConcurrencyModel {
    /// Worker threads sharing one address space and one execution lock.
    Threads,
    /// Worker processes, each with its own address space.
    Processes,
}

impl ConcurrencyModel {
    /// Human-readable description used in the run banner.
    pub fn describe(self) -> &'static str {
        match self {
            ConcurrencyModel::Threads => "thread-based concurrency",
            ConcurrencyModel::Processes => "process-based concurrency",
        }
    }
}

impl FromStr for ConcurrencyModel {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "threads" => Ok(ConcurrencyModel::Threads),
            "procs" => Ok(ConcurrencyModel::Processes),
            other => Err(BenchError::InvalidSelection(format!(
                "unknown concurrency model '{other}', expected 'threads' or 'procs'"
            ))),
        }
    }
}

impl fmt::Display for ConcurrencyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcurrencyModel::Threads => f.write_str("threads"),
            ConcurrencyModel::Processes => f.write_str("procs"),
        }
    }
}

/// Shape of a task pool. Fixed for the pool's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of tasks running at once.
    pub workers: u32,
    /// Thread or process workers.
    pub model: ConcurrencyModel,
}

impl PoolConfig {
    /// Creates a pool configuration, rejecting an empty pool.
    pub fn new(workers: u32, model: ConcurrencyModel) -> Result<Self> {
        if workers == 0 {
            return Err(BenchError::InvalidPoolSize(workers));
        }
        Ok(PoolConfig { workers, model })
    }
}

/// Everything one dispatcher run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Workload every task in the run performs.
    pub workload: Workload,
    /// Pool the run creates.
    pub pool: PoolConfig,
    /// Number of tasks submitted in the map phase.
    pub tasks: u64,
    /// Wait time (I/O) or spin budget (CPU) of each task.
    pub task_duration: Duration,
    /// Executable launched with `--worker` by the process pool.
    /// `None` means the current executable.
    pub worker_program: Option<PathBuf>,
}

impl RunConfig {
    /// A run with the default task count, pool size and duration.
    pub fn new(workload: Workload, model: ConcurrencyModel) -> Self {
        RunConfig {
            workload,
            pool: PoolConfig {
                workers: DEFAULT_WORKERS,
                model,
            },
            tasks: DEFAULT_TASKS,
            task_duration: DEFAULT_TASK_DURATION,
            worker_program: None,
        }
    }

    /// Sets the number of tasks.
    pub fn tasks(mut self, tasks: u64) -> Self {
        self.tasks = tasks;
        self
    }

    /// Sets the pool size.
    pub fn workers(mut self, workers: u32) -> Self {
        self.pool.workers = workers;
        self
    }

    /// Sets the per-task duration.
    pub fn task_duration(mut self, duration: Duration) -> Self {
        self.task_duration = duration;
        self
    }

    /// Sets the executable used for worker processes.
    pub fn worker_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.worker_program = Some(program.into());
        self
    }

    /// Resolves the worker executable, falling back to the running binary.
    pub fn resolve_worker_program(&self) -> Result<PathBuf> {
        match &self.worker_program {
            Some(program) => Ok(program.clone()),
            None => Ok(env::current_exe()?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_run() {
        let config = RunConfig::new(Workload::Io, ConcurrencyModel::Threads);
        assert_eq!(config.tasks, 200);
        assert_eq!(config.pool.workers, 32);
        assert_eq!(config.task_duration, Duration::from_secs(1));
        assert!(config.worker_program.is_none());
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert!(matches!(
            PoolConfig::new(0, ConcurrencyModel::Processes),
            Err(BenchError::InvalidPoolSize(0))
        ));
        assert!(PoolConfig::new(1, ConcurrencyModel::Processes).is_ok());
    }

    #[test]
    fn parses_model_names() {
        assert_eq!(
            "threads".parse::<ConcurrencyModel>().unwrap(),
            ConcurrencyModel::Threads
        );
        assert_eq!(
            "procs".parse::<ConcurrencyModel>().unwrap(),
            ConcurrencyModel::Processes
        );
        assert!("processes".parse::<ConcurrencyModel>().is_err());
    }
}
