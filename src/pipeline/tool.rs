//! External converter invocation. All conversion tools run as blocking
//! child processes behind the `ToolRunner` trait so the strategy chain can
//! be exercised in tests with a fake runner.

use std::fmt;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug)]
pub enum ToolError {
    /// The binary could not be launched (usually: not installed).
    Spawn(std::io::Error),
    /// Non-zero exit status.
    Exit(Option<i32>),
    /// The deadline elapsed; the child was killed.
    Timeout(Duration),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Spawn(e) => write!(f, "failed to launch: {e}"),
            ToolError::Exit(Some(code)) => write!(f, "exited with status {code}"),
            ToolError::Exit(None) => write!(f, "terminated by signal"),
            ToolError::Timeout(d) => write!(f, "timed out after {}s", d.as_secs()),
        }
    }
}

pub trait ToolRunner {
    /// Run one external tool to completion. Success means exit status zero;
    /// anything else is an error the strategy chain treats as "try the next
    /// tier".
    fn run(&self, cmd: Command) -> Result<(), ToolError>;
}

/// Real child-process runner. Every invocation carries a kill-on-expiry
/// deadline so a hung converter cannot block an upload forever.
pub struct SystemToolRunner {
    pub timeout: Duration,
}

impl Default for SystemToolRunner {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

impl ToolRunner for SystemToolRunner {
    fn run(&self, mut cmd: Command) -> Result<(), ToolError> {
        // Output is discarded rather than piped; a full pipe would stall
        // the child while we only poll its exit status.
        cmd.stdout(Stdio::null()).stderr(Stdio::null());

        let program = cmd.get_program().to_string_lossy().to_string();
        let mut child = cmd.spawn().map_err(ToolError::Spawn)?;
        let deadline = Instant::now() + self.timeout;

        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => return Err(ToolError::Exit(status.code())),
                Ok(None) => {}
                Err(e) => return Err(ToolError::Spawn(e)),
            }
            if Instant::now() >= deadline {
                log::warn!("{program}: deadline elapsed, killing child");
                let _ = child.kill();
                let _ = child.wait();
                return Err(ToolError::Timeout(self.timeout));
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }
}
