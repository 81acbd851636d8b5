// Synchronous execution of engine executables for probing

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Minimum time granted to collect buffered output once the process has exited
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or -1 when the process was terminated by a signal
    pub exit_code: i32,
    /// Stdout lines followed by stderr lines
    pub lines: Vec<String>,
}

impl ProcessOutput {
    pub fn new(exit_code: i32, lines: Vec<String>) -> Self {
        Self { exit_code, lines }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("{0}")]
    Launch(#[from] std::io::Error),

    #[error("Process did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("Process was interrupted")]
    Interrupted,
}

/// Runs an executable and captures its output
pub trait ProcessRunner: Send + Sync {
    fn run(&self, program: &Path, args: &[&str]) -> Result<ProcessOutput, RunError>;
}

/// Shared flag that aborts running and future probes
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// `ProcessRunner` backed by `std::process::Command`
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
    interrupt: InterruptHandle,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interrupt: InterruptHandle::default(),
        }
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[&str]) -> Result<ProcessOutput, RunError> {
        if self.interrupt.is_interrupted() {
            return Err(RunError::Interrupted);
        }

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain both pipes concurrently so a chatty child can't block on a full pipe
        let stdout = child.stdout.take().map(spawn_line_reader);
        let stderr = child.stderr.take().map(spawn_line_reader);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if self.interrupt.is_interrupted() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunError::Interrupted);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunError::TimedOut(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        // Descendants may inherit the pipes and keep them open past our child's exit
        let drain_deadline = deadline.max(Instant::now() + DRAIN_GRACE);
        let mut lines = Vec::new();
        let complete = drain_lines(stdout, drain_deadline, &mut lines)
            & drain_lines(stderr, drain_deadline, &mut lines);
        if !complete {
            debug!(
                "Output of \"{}\" still open after exit, keeping {} lines",
                program.display(),
                lines.len()
            );
        }

        Ok(ProcessOutput {
            exit_code: status.code().unwrap_or(-1),
            lines,
        })
    }
}

fn spawn_line_reader<R: Read + Send + 'static>(source: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();

        while matches!(reader.read_until(b'\n', &mut buf), Ok(n) if n > 0) {
            let line = String::from_utf8_lossy(&buf);
            if tx.send(line.trim_end_matches(['\r', '\n']).to_string()).is_err() {
                break;
            }
            buf.clear();
        }
    });
    rx
}

/// Collect lines until the stream closes or `deadline` passes.
/// Returns false when the stream was still open at the deadline.
fn drain_lines(reader: Option<Receiver<String>>, deadline: Instant, lines: &mut Vec<String>) -> bool {
    let Some(rx) = reader else {
        return true;
    };

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(line) => lines.push(line),
            Err(RecvTimeoutError::Disconnected) => return true,
            Err(RecvTimeoutError::Timeout) => return false,
        }
    }
}
