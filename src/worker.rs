use std::io::{BufWriter, Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::process;

use log::{debug, error};
use serde_json::Deserializer;

use crate::exec_lock::ExecutionLock;
use crate::protocol::{WorkerRequest, WorkerResponse};
use crate::task_pool::panic_message;
use crate::workload;
use crate::Result;

/// Serves task requests until `reader` reaches end of input.
///
/// This is the body of a worker process: the pool writes requests to the
/// process's stdin and reads responses from its stdout. The process owns
/// its own execution lock, so nothing it computes is shared with the
/// pool or with sibling workers except the response itself.
pub fn serve<R: Read, W: Write>(reader: R, writer: W) -> Result<()> {
    let lock = ExecutionLock::new();
    let mut writer = BufWriter::new(writer);
    let requests = Deserializer::from_reader(reader).into_iter::<WorkerRequest>();

    for request in requests {
        let request = request?;
        debug!("Worker process {} received {:?}", process::id(), request);

        let response = match request {
            WorkerRequest::Run { task, budget } => {
                match panic::catch_unwind(AssertUnwindSafe(|| {
                    workload::execute(&task, budget, &lock)
                })) {
                    Ok(output) => WorkerResponse::Ok(output),
                    Err(payload) => {
                        let message = panic_message(&*payload);
                        error!("Task {} panicked in worker process: {}", task.id, message);
                        WorkerResponse::Err(format!("task panicked: {message}"))
                    }
                }
            }
        };

        serde_json::to_writer(&mut writer, &response)?;
        writer.flush()?;
    }

    debug!("Worker process {}: input closed, shutting down", process::id());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use super::*;
    use crate::task::{Task, TaskOutput, Workload};

    fn encode(requests: &[WorkerRequest]) -> Vec<u8> {
        let mut buf = Vec::new();
        for request in requests {
            serde_json::to_writer(&mut buf, request).unwrap();
        }
        buf
    }

    #[test]
    fn answers_each_request_in_order() {
        let input = encode(&[
            WorkerRequest::Run {
                task: Task::new(7, Workload::Io),
                budget: Duration::from_millis(5),
            },
            WorkerRequest::Run {
                task: Task::new(8, Workload::Cpu),
                budget: Duration::from_millis(5),
            },
        ]);
        let mut output = Vec::new();
        serve(Cursor::new(input), &mut output).unwrap();

        let responses: Vec<WorkerResponse> = Deserializer::from_slice(&output)
            .into_iter::<WorkerResponse>()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(responses.len(), 2);
        assert!(matches!(responses[0], WorkerResponse::Ok(TaskOutput::Echo(7))));
        assert!(matches!(
            responses[1],
            WorkerResponse::Ok(TaskOutput::Iterations(n)) if n > 0
        ));
    }

    #[test]
    fn empty_input_exits_cleanly() {
        let mut output = Vec::new();
        serve(Cursor::new(Vec::new()), &mut output).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn garbage_input_is_an_error() {
        let mut output = Vec::new();
        assert!(serve(Cursor::new(b"not json".to_vec()), &mut output).is_err());
    }
}
