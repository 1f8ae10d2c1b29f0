use std::collections::BTreeSet;
use std::io::Write;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::config::{ConcurrencyModel, PoolConfig, RunConfig};
use crate::task::{Task, TaskOutput, TaskResult, Workload};
use crate::task_pool::{await_all, ProcessTaskPool, TaskPool, ThreadTaskPool};
use crate::Result;

/// Runs one map/wait-all-reduce pass over a fresh pool.
pub struct Dispatcher {
    config: RunConfig,
}

impl Dispatcher {
    /// Creates a dispatcher for the given run.
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// The run this dispatcher performs.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Builds the pool, submits every task, waits for all of them and
    /// returns the merged results.
    ///
    /// `progress` receives a `waiting` line once the map phase is done.
    /// The elapsed time covers pool construction through the barrier;
    /// pool shutdown is not included.
    pub fn run<W: Write>(&self, progress: &mut W) -> Result<RunReport> {
        let pool_config = PoolConfig::new(self.config.pool.workers, self.config.pool.model)?;
        let cores = num_cpus::get();
        info!(
            "Running {} {} tasks on {} {} workers ({} cores available)",
            self.config.tasks, self.config.workload, pool_config.workers, pool_config.model, cores
        );

        let started = Instant::now();
        let (results, elapsed) = match pool_config.model {
            ConcurrencyModel::Threads => {
                let pool = ThreadTaskPool::new(pool_config.workers, self.config.task_duration)?;
                self.map_reduce(&pool, started, progress)?
            }
            ConcurrencyModel::Processes => {
                let program = self.config.resolve_worker_program()?;
                let pool = ProcessTaskPool::new(
                    pool_config.workers,
                    self.config.task_duration,
                    program,
                )?;
                self.map_reduce(&pool, started, progress)?
            }
        };

        let report = RunReport {
            workload: self.config.workload,
            model: pool_config.model,
            workers: pool_config.workers,
            cores,
            results,
            elapsed,
        };
        info!(
            "All {} tasks finished in {:?}: {} completed, {} failed",
            report.results.len(),
            report.elapsed,
            report.completed(),
            report.failed()
        );
        for result in &report.results {
            if let TaskResult::Failed { id, message } = result {
                warn!("Task {} failed: {}", id, message);
            }
        }
        Ok(report)
    }

    fn map_reduce<P: TaskPool, W: Write>(
        &self,
        pool: &P,
        started: Instant,
        progress: &mut W,
    ) -> Result<(Vec<TaskResult>, Duration)> {
        let handles: Vec<_> = (0..self.config.tasks)
            .map(|id| pool.submit(Task::new(id, self.config.workload)))
            .collect();

        writeln!(progress, "waiting")?;
        progress.flush()?;

        let results = await_all(handles);
        Ok((results, started.elapsed()))
    }
}

/// Outcome of one dispatcher run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Workload every task performed.
    pub workload: Workload,
    /// How workers were isolated.
    pub model: ConcurrencyModel,
    /// Pool size.
    pub workers: u32,
    /// Logical cores on this machine.
    pub cores: usize,
    /// One result per submitted task, in no particular order.
    pub results: Vec<TaskResult>,
    /// Wall-clock time from pool construction to the end of the barrier.
    pub elapsed: Duration,
}

impl RunReport {
    /// Number of tasks that completed.
    pub fn completed(&self) -> usize {
        self.results.iter().filter(|r| r.is_completed()).count()
    }

    /// Number of tasks that failed.
    pub fn failed(&self) -> usize {
        self.results.len() - self.completed()
    }

    /// Distinct task identifiers that produced a result.
    pub fn ids(&self) -> BTreeSet<u64> {
        self.results.iter().map(TaskResult::id).collect()
    }

    /// Sum of the iteration counts reported by CPU-bound tasks.
    pub fn total_iterations(&self) -> u64 {
        self.results
            .iter()
            .map(|r| match r {
                TaskResult::Completed {
                    output: TaskOutput::Iterations(n),
                    ..
                } => *n,
                _ => 0,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BenchError;

    fn small(workload: Workload) -> RunConfig {
        RunConfig::new(workload, ConcurrencyModel::Threads)
            .tasks(12)
            .workers(4)
            .task_duration(Duration::from_millis(10))
    }

    #[test]
    fn collects_one_result_per_task() {
        let mut progress = Vec::new();
        let report = Dispatcher::new(small(Workload::Io))
            .run(&mut progress)
            .unwrap();
        assert_eq!(report.results.len(), 12);
        assert_eq!(report.completed(), 12);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.ids(), (0..12).collect::<BTreeSet<u64>>());
        assert_eq!(String::from_utf8(progress).unwrap(), "waiting\n");
    }

    #[test]
    fn cpu_runs_report_iterations() {
        let report = Dispatcher::new(small(Workload::Cpu).tasks(3))
            .run(&mut std::io::sink())
            .unwrap();
        assert_eq!(report.results.len(), 3);
        assert!(report.total_iterations() > 0);
    }

    #[test]
    fn repeated_runs_do_not_share_results() {
        let dispatcher = Dispatcher::new(small(Workload::Io));
        let first = dispatcher.run(&mut std::io::sink()).unwrap();
        let second = dispatcher.run(&mut std::io::sink()).unwrap();
        assert_eq!(first.results.len(), 12);
        assert_eq!(second.results.len(), 12);
    }

    #[test]
    fn zero_tasks_is_an_empty_run() {
        let report = Dispatcher::new(small(Workload::Io).tasks(0))
            .run(&mut std::io::sink())
            .unwrap();
        assert!(report.results.is_empty());
    }

    #[test]
    fn empty_pool_is_rejected_before_running() {
        let mut progress = Vec::new();
        let result = Dispatcher::new(small(Workload::Io).workers(0)).run(&mut progress);
        assert!(matches!(result, Err(BenchError::InvalidPoolSize(0))));
        assert!(progress.is_empty());
    }
}
