use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn taskbench() -> Command {
    Command::cargo_bin("taskbench").unwrap()
}

// `taskbench` with no args should print usage and exit non-zero
#[test]
fn cli_no_args() {
    taskbench()
        .assert()
        .failure()
        .stdout(contains("usage:").and(contains("<io|cpu> <threads|procs>")))
        .stdout(contains("waiting").not());
}

// `taskbench io` with a single arg should print usage and exit non-zero
#[test]
fn cli_single_arg() {
    taskbench()
        .arg("io")
        .assert()
        .failure()
        .stdout(contains("usage:"));
}

// `taskbench bad threads` should print usage and exit non-zero
#[test]
fn cli_invalid_workload() {
    taskbench()
        .args(["bad", "threads"])
        .assert()
        .failure()
        .stdout(contains("usage:"))
        .stdout(contains("waiting").not());
}

// `taskbench cpu fibers` should print usage and exit non-zero
#[test]
fn cli_invalid_model() {
    taskbench()
        .args(["cpu", "fibers"])
        .assert()
        .failure()
        .stdout(contains("usage:"));
}

#[cfg(unix)]
#[test]
fn cli_usage_exit_code_is_minus_one() {
    taskbench().arg("cpu").assert().code(255);
}

#[test]
fn cli_zero_workers_is_rejected() {
    taskbench()
        .args(["io", "threads", "--workers", "0"])
        .assert()
        .failure()
        .stdout(contains("waiting").not());
}

#[test]
fn cli_version() {
    taskbench()
        .arg("-V")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_io_threads() {
    taskbench()
        .args(["io", "threads", "--tasks", "8", "--workers", "4", "--duration-ms", "50"])
        .assert()
        .success()
        .stdout(contains("I/O-bound workload with thread-based concurrency"))
        .stdout(contains("waiting"))
        .stdout(contains("took").and(contains("seconds")))
        .stdout(contains("failed").not());
}

#[test]
fn cli_cpu_threads() {
    taskbench()
        .args(["cpu", "threads", "--tasks", "4", "--workers", "2", "--duration-ms", "20"])
        .assert()
        .success()
        .stdout(contains("CPU-bound workload with thread-based concurrency"))
        .stdout(contains("took"));
}

#[test]
fn cli_io_procs() {
    taskbench()
        .args(["io", "procs", "--tasks", "8", "--workers", "4", "--duration-ms", "50"])
        .assert()
        .success()
        .stdout(contains("I/O-bound workload with process-based concurrency"))
        .stdout(contains("waiting"))
        .stdout(contains("took"))
        .stdout(contains("failed").not());
}

#[test]
fn cli_cpu_procs() {
    taskbench()
        .args(["cpu", "procs", "--tasks", "4", "--workers", "2", "--duration-ms", "20"])
        .assert()
        .success()
        .stdout(contains("CPU-bound workload with process-based concurrency"))
        .stdout(contains("failed").not());
}
