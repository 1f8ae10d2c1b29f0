use std::env;
use std::io;
use std::process::exit;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use log::{error, info};

use taskbench::{
    worker, ConcurrencyModel, Dispatcher, Result, RunConfig, Workload, DEFAULT_TASKS,
    DEFAULT_TASK_DURATION, DEFAULT_WORKERS,
};

#[derive(Parser)]
#[command(
    name = "taskbench",
    version,
    about = "Compare thread and process worker pools on I/O-bound and CPU-bound tasks"
)]
struct Cli {
    /// Workload: "io" or "cpu"
    #[arg(value_name = "io|cpu")]
    workload: Option<Workload>,

    /// Concurrency model: "threads" or "procs"
    #[arg(value_name = "threads|procs")]
    model: Option<ConcurrencyModel>,

    /// Number of tasks to submit
    #[arg(long, default_value_t = DEFAULT_TASKS)]
    tasks: u64,

    /// Number of pool workers
    #[arg(long, default_value_t = DEFAULT_WORKERS, value_parser = clap::value_parser!(u32).range(1..))]
    workers: u32,

    /// How long each task waits or spins, in milliseconds
    #[arg(long, default_value_t = DEFAULT_TASK_DURATION.as_millis() as u64)]
    duration_ms: u64,

    /// Serve tasks from stdin as a pool worker process
    #[arg(long, hide = true)]
    worker: bool,
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => usage(),
    };

    if cli.worker {
        if let Err(e) = worker::serve(io::stdin().lock(), io::stdout().lock()) {
            error!("{}", e);
            exit(1);
        }
        return;
    }

    let (workload, model) = match (cli.workload, cli.model) {
        (Some(workload), Some(model)) => (workload, model),
        _ => usage(),
    };

    let config = RunConfig::new(workload, model)
        .tasks(cli.tasks)
        .workers(cli.workers)
        .task_duration(Duration::from_millis(cli.duration_ms));

    if let Err(e) = run(config) {
        error!("{}", e);
        exit(1);
    }
}

fn run(config: RunConfig) -> Result<()> {
    info!("taskbench {}", env!("CARGO_PKG_VERSION"));
    println!(
        "{} with {}",
        config.workload.describe(),
        config.pool.model.describe()
    );

    let report = Dispatcher::new(config).run(&mut io::stdout())?;

    println!("\ntook {} seconds", report.elapsed.as_secs_f64());
    if report.failed() > 0 {
        println!("{} of {} tasks failed", report.failed(), report.results.len());
    }
    Ok(())
}

/// Prints the one-line usage message and exits without building a pool.
fn usage() -> ! {
    let program = env::args().next().unwrap_or_else(|| "taskbench".to_owned());
    println!("usage: {} <io|cpu> <threads|procs>", program);
    exit(-1);
}
