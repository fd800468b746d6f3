//! Helpers for running one child process with optional capture and timeout.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Which of the child's output streams to capture. Uncaptured streams are inherited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capture {
    pub stdout: bool,
    pub stderr: bool,
}

/// Exit status and whatever output was captured.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Option<Vec<u8>>,
    pub stderr: Option<Vec<u8>>,
    pub timed_out: bool,
}

type Reader = thread::JoinHandle<Result<Vec<u8>>>;

/// Run a command to completion, killing it if `timeout` elapses first.
///
/// Captured pipes are drained on background threads while the child runs so a chatty
/// child cannot deadlock on a full pipe. stdin is always closed.
#[instrument(skip_all, fields(timeout_secs = timeout.map(|t| t.as_secs()), capture = ?capture))]
pub fn run_command(
    mut cmd: Command,
    capture: Capture,
    timeout: Option<Duration>,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null());
    cmd.stdout(if capture.stdout {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });
    cmd.stderr(if capture.stderr {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdout_handle: Option<Reader> = match child.stdout.take() {
        Some(stdout) => Some(thread::spawn(move || read_stream(stdout))),
        None => None,
    };
    let stderr_handle: Option<Reader> = match child.stderr.take() {
        Some(stderr) => Some(thread::spawn(move || read_stream(stderr))),
        None => None,
    };

    let (status, timed_out) = match timeout {
        Some(timeout) => {
            let waited = child.wait_timeout(timeout);
            settle(&mut child, waited, timeout)?
        }
        None => (child.wait().context("wait for command")?, false),
    };

    let stdout = join_output(stdout_handle).context("join stdout")?;
    let stderr = join_output(stderr_handle).context("join stderr")?;

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        timed_out,
    })
}

/// Turn the outcome of a bounded wait into a final status, killing and reaping the child
/// unless it already exited. The flag reports whether the timeout fired.
fn settle(
    child: &mut Child,
    waited: io::Result<Option<ExitStatus>>,
    timeout: Duration,
) -> Result<(ExitStatus, bool)> {
    match waited {
        Ok(Some(status)) => Ok((status, false)),
        Ok(None) => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            child.kill().context("kill command")?;
            let status = child.wait().context("wait command after kill")?;
            Ok((status, true))
        }
        Err(err) => {
            error!(err = %err, "waiting for command failed, killing");
            let _ = child.kill();
            let _ = child.wait();
            Err(err).context("wait for command")
        }
    }
}

fn join_output(handle: Option<Reader>) -> Result<Option<Vec<u8>>> {
    let Some(handle) = handle else {
        return Ok(None);
    };
    match handle.join() {
        Ok(result) => result.map(Some),
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).context("read output")?;
    Ok(buf)
}
