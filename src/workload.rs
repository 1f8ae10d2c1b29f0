//! The two workload functions a task can run.

use std::thread;
use std::time::{Duration, Instant};

use crate::exec_lock::{Execution, ExecutionLock};
use crate::task::{Task, TaskOutput, Workload};

/// Runs `task` under `lock` with the given time budget.
///
/// The lock is held for the whole task except while an I/O-bound task
/// waits.
pub fn execute(task: &Task, budget: Duration, lock: &ExecutionLock) -> TaskOutput {
    let mut exec = lock.acquire();
    match task.workload {
        Workload::Io => io_bound_task(task.id, budget, &mut exec),
        Workload::Cpu => cpu_bound_task(budget, &mut exec),
    }
}

/// Waits for `budget` without using the CPU, then echoes `id`.
pub fn io_bound_task(id: u64, budget: Duration, exec: &mut Execution<'_>) -> TaskOutput {
    exec.blocking(|| thread::sleep(budget));
    TaskOutput::Echo(id)
}

/// Spins until `budget` has elapsed and reports the iteration count.
///
/// Never yields and never releases the execution lock.
pub fn cpu_bound_task(budget: Duration, _exec: &mut Execution<'_>) -> TaskOutput {
    let start = Instant::now();
    let mut iters: u64 = 0;
    while start.elapsed() < budget {
        iters += 1;
    }
    TaskOutput::Iterations(iters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_task_echoes_its_id_after_waiting() {
        let lock = ExecutionLock::new();
        let start = Instant::now();
        let out = execute(
            &Task::new(42, Workload::Io),
            Duration::from_millis(30),
            &lock,
        );
        assert_eq!(out, TaskOutput::Echo(42));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn cpu_task_counts_iterations_within_budget() {
        let lock = ExecutionLock::new();
        let start = Instant::now();
        let out = execute(
            &Task::new(0, Workload::Cpu),
            Duration::from_millis(20),
            &lock,
        );
        assert!(start.elapsed() >= Duration::from_millis(20));
        match out {
            TaskOutput::Iterations(n) => assert!(n > 0),
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn zero_budget_cpu_task_returns_immediately() {
        let lock = ExecutionLock::new();
        let out = execute(&Task::new(1, Workload::Cpu), Duration::ZERO, &lock);
        assert_eq!(out, TaskOutput::Iterations(0));
    }
}
