// External command execution behind a narrow seam so erase strategies can be
// exercised with a fake runner.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Exit information of a finished external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr: String,
}

impl CommandOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            code: Some(0),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stderr: stderr.into(),
        }
    }

    /// One-line description used in error messages.
    pub fn describe(&self) -> String {
        let code = match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            code
        } else {
            format!("{}: {}", code, stderr)
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("failed to launch {program}: {reason}")]
    Launch { program: String, reason: String },

    #[error("{program} did not finish within {after_secs}s")]
    TimedOut { program: String, after_secs: u64 },

    #[error("failed waiting on {program}: {reason}")]
    Wait { program: String, reason: String },
}

/// Runs an external program to completion and reports how it exited.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutcome, CommandError>;
}

/// Spawns real processes. Blocks until the child exits or the optional
/// timeout elapses, in which case the child is killed and reaped.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner {
    timeout: Option<Duration>,
}

impl SystemCommandRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutcome, CommandError> {
        tracing::debug!(program, ?args, "Running external command");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommandError::Launch {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        // Drain stderr on a helper thread so a chatty tool cannot block on a full pipe
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if let Some(limit) = self.timeout {
                        if started.elapsed() >= limit {
                            tracing::warn!(program, after_secs = limit.as_secs(), "Command timed out, killing");
                            let _ = child.kill();
                            let _ = child.wait();
                            return Err(CommandError::TimedOut {
                                program: program.to_string(),
                                after_secs: limit.as_secs(),
                            });
                        }
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(CommandError::Wait {
                        program: program.to_string(),
                        reason: e.to_string(),
                    })
                }
            }
        };

        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        Ok(CommandOutcome {
            success: status.success(),
            code: status.code(),
            stderr,
        })
    }
}

pub(crate) fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
