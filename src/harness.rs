use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::SweepConfig;
use crate::errors::SweepError;
use crate::types::HarnessOutput;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Something that can run the UI test suite at a given inlining threshold.
pub trait Harness {
    /// Build once so the first timed run does not pay for compilation.
    fn warm_up(&mut self) -> Result<(), SweepError> {
        Ok(())
    }

    /// Run the suite with every threshold knob set to `threshold`.
    fn invoke(&mut self, threshold: u64) -> Result<HarnessOutput, SweepError>;
}

/// Runs the harness as a child process.
#[derive(Debug, Clone)]
pub struct ProcessHarness {
    program: String,
    entry_args: Vec<String>,
    args: Vec<String>,
    env_vars: Vec<String>,
    timeout: Duration,
}

impl ProcessHarness {
    pub fn from_config(config: &SweepConfig) -> Self {
        ProcessHarness {
            program: config.harness.first().cloned().unwrap_or_default(),
            entry_args: config.harness.get(1..).unwrap_or(&[]).to_vec(),
            args: config.harness_args(),
            env_vars: config.env_vars.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn spawn_error(&self, source: std::io::Error) -> SweepError {
        SweepError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl Harness for ProcessHarness {
    fn warm_up(&mut self) -> Result<(), SweepError> {
        debug!(program = %self.program, "warm-up build");
        // The exit status is irrelevant here; the sweep itself reports failures.
        Command::new(&self.program)
            .args(&self.entry_args)
            .arg("--release")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| self.spawn_error(e))?;
        Ok(())
    }

    fn invoke(&mut self, threshold: u64) -> Result<HarnessOutput, SweepError> {
        let value = threshold.to_string();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for var in &self.env_vars {
            cmd.env(var, &value);
        }
        debug!(program = %self.program, args = ?self.args, threshold, "spawning harness");

        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout_rx = drain("stdout", child.stdout.take());
        let stderr_rx = drain("stderr", child.stderr.take());

        let timed_out = || SweepError::Timeout {
            threshold,
            timeout_secs: self.timeout.as_secs(),
        };

        // Grandchildren (the test binaries) can keep the pipes open after the
        // harness itself exits, so the reads share the same deadline. On
        // timeout the reader threads are detached.
        let status = wait_until(&mut child, deadline)?.ok_or_else(timed_out)?;
        let stdout = collect(stdout_rx, deadline).ok_or_else(timed_out)?;
        let stderr = collect(stderr_rx, deadline).ok_or_else(timed_out)?;
        let elapsed = started.elapsed();

        Ok(HarnessOutput {
            stdout,
            stderr,
            exit_code: status.code(),
            elapsed,
        })
    }
}

/// Poll the child until it exits. Returns `None` if the deadline passed, in
/// which case the child has been killed and reaped.
fn wait_until(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>, SweepError> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    child.wait().map_err(|source| SweepError::Wait { source })?;
                    return Ok(None);
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(source) => return Err(SweepError::Wait { source }),
        }
    }
}

fn drain<R: Read + Send + 'static>(stream: &'static str, pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    let mut pipe = pipe?;
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(error) = pipe.read_to_end(&mut buf) {
            warn!(stream, %error, bytes = buf.len(), "reading harness output failed, log is truncated");
        }
        let _ = tx.send(buf);
    });
    Some(rx)
}

/// Wait for a drained pipe until `deadline`. `None` means the deadline passed.
fn collect(rx: Option<Receiver<Vec<u8>>>, deadline: Instant) -> Option<String> {
    let Some(rx) = rx else {
        return Some(String::new());
    };
    let bytes = match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(bytes) => bytes,
        Err(RecvTimeoutError::Timeout) => return None,
        Err(RecvTimeoutError::Disconnected) => Vec::new(),
    };
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
