//! Spawning a child and waiting for it under a deadline.

use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::debug;

use crate::error::{Result, SkillzError};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub struct Finished {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub enum Outcome {
    Finished(Finished),
    /// Deadline passed; the child was killed and reaped. Output is discarded.
    TimedOut,
}

/// Run `command` to completion or until `timeout` elapses.
///
/// stdout and stderr are always piped; stdin is piped only when `input` is
/// given and is the null device otherwise. A timeout too large to represent
/// as an instant imposes no deadline.
pub fn run(mut command: Command, input: Option<Vec<u8>>, timeout: Duration) -> Result<Outcome> {
    let program = command.get_program().to_string_lossy().to_string();
    command
        .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let start = Instant::now();
    let deadline = start.checked_add(timeout);
    let mut child = command
        .spawn()
        .map_err(|err| SkillzError::Execution(format!("Failed to launch '{program}': {err}")))?;

    if let (Some(input), Some(mut pipe)) = (input, child.stdin.take()) {
        // A script that never reads stdin closes the pipe early; that is not an error.
        thread::spawn(move || {
            if let Err(err) = pipe.write_all(&input) {
                debug!(error = %err, "stdin pipe closed before all input was written");
            }
        });
    }

    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(err) => {
                terminate(&mut child);
                return Err(SkillzError::Execution(format!(
                    "Failed to wait for '{program}': {err}"
                )));
            }
        }
        let pause = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    terminate(&mut child);
                    return Ok(Outcome::TimedOut);
                }
                POLL_INTERVAL.min(deadline - now)
            }
            None => POLL_INTERVAL,
        };
        thread::sleep(pause);
    };

    // A background grandchild can hold the pipes open past the exit.
    let (Some(stdout), Some(stderr)) = (collect(&stdout, deadline)?, collect(&stderr, deadline)?) else {
        return Ok(Outcome::TimedOut);
    };

    Ok(Outcome::Finished(Finished {
        status,
        stdout,
        stderr,
        elapsed: start.elapsed(),
    }))
}

fn spawn_reader<R>(pipe: Option<R>) -> Receiver<std::io::Result<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = match pipe {
            Some(mut reader) => reader.read_to_end(&mut buf).map(|_| buf),
            None => Ok(buf),
        };
        let _ = tx.send(result);
    });
    rx
}

/// `Ok(None)` when the stream is still open at the deadline.
fn collect(
    rx: &Receiver<std::io::Result<Vec<u8>>>,
    deadline: Option<Instant>,
) -> Result<Option<Vec<u8>>> {
    let received = match deadline {
        Some(deadline) => rx.recv_deadline(deadline),
        None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
    };
    match received {
        Ok(Ok(bytes)) => Ok(Some(bytes)),
        Ok(Err(err)) => Err(SkillzError::Execution(format!("Failed to read script output: {err}"))),
        Err(RecvTimeoutError::Timeout) => Ok(None),
        Err(RecvTimeoutError::Disconnected) => Err(SkillzError::Execution(
            "Output reader stopped unexpectedly".to_string(),
        )),
    }
}

fn terminate(child: &mut Child) {
    if let Err(err) = child.kill() {
        debug!(error = %err, "kill failed; child may have already exited");
    }
    if let Err(err) = child.wait() {
        debug!(error = %err, "Failed to reap killed child");
    }
}
