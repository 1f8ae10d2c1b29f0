use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use log::{debug, error};
use serde::Deserialize;
use serde_json::de::IoRead;
use serde_json::Deserializer;

use crate::config::WORKER_FLAG;
use crate::protocol::{WorkerRequest, WorkerResponse};
use crate::task::Task;
use crate::{BenchError, Result};

/// The pool's connection to one worker process.
///
/// Requests go out on the child's stdin and responses come back on its
/// stdout. Dropping the client closes stdin, which tells the worker to
/// exit, then reaps it.
pub struct WorkerClient {
    child: Child,
    reader: Deserializer<IoRead<BufReader<ChildStdout>>>,
    writer: Option<BufWriter<ChildStdin>>,
}

impl WorkerClient {
    /// Launches `program --worker` and connects to its pipes.
    pub fn spawn(program: &Path) -> Result<Self> {
        let mut child = Command::new(program)
            .arg(WORKER_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let (stdin, stdout) = match (stdin, stdout) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(BenchError::WorkerProcess(
                    "worker process pipes unavailable".to_owned(),
                ));
            }
        };
        debug!("Spawned worker process {}", child.id());

        Ok(Self {
            child,
            reader: Deserializer::from_reader(BufReader::new(stdout)),
            writer: Some(BufWriter::new(stdin)),
        })
    }

    /// OS process id of the worker.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Sends a task to the worker and waits for its answer.
    ///
    /// An `Err` means the worker itself is unusable; a failing task comes
    /// back as `Ok(WorkerResponse::Err(_))`.
    pub fn run(&mut self, task: Task, budget: Duration) -> Result<WorkerResponse> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| BenchError::WorkerProcess("worker input is closed".to_owned()))?;
        let request = WorkerRequest::Run { task, budget };
        serde_json::to_writer(&mut *writer, &request)?;
        writer.flush()?;

        match WorkerResponse::deserialize(&mut self.reader) {
            Ok(response) => Ok(response),
            Err(e) if e.is_eof() => Err(BenchError::WorkerProcess(format!(
                "worker process {} exited before answering",
                self.child.id()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Kills the worker without waiting for it to finish its current task.
    pub fn kill(mut self) {
        if let Err(e) = self.child.kill() {
            debug!("Worker process {} already gone: {}", self.child.id(), e);
        }
    }
}

impl Drop for WorkerClient {
    fn drop(&mut self) {
        // EOF on stdin ends the worker's serve loop.
        self.writer.take();
        match self.child.wait() {
            Ok(status) if !status.success() => {
                error!("Worker process {} exited with {}", self.child.id(), status)
            }
            Ok(_) => debug!("Worker process {} exited", self.child.id()),
            Err(e) => error!("Failed to reap worker process {}: {}", self.child.id(), e),
        }
    }
}
