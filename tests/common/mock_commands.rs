/// Fake command execution for integration tests
///
/// Responses are registered per command line ("program arg1 arg2 ...").
/// Unregistered command lines succeed. Every invocation is recorded in order.
use std::collections::HashMap;
use std::sync::Mutex;
use zt_wipe::drives::{CommandError, CommandOutcome, CommandRunner};

#[derive(Default)]
pub struct FakeCommandRunner {
    responses: Mutex<HashMap<String, Result<CommandOutcome, CommandError>>>,
    calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the reply for an exact command line
    pub fn register(&self, command_line: &str, reply: Result<CommandOutcome, CommandError>) {
        self.responses
            .lock()
            .unwrap()
            .insert(command_line.to_string(), reply);
    }

    pub fn fail(&self, command_line: &str, code: i32, stderr: &str) {
        self.register(command_line, Ok(CommandOutcome::failure(code, stderr)));
    }

    pub fn time_out(&self, command_line: &str, after_secs: u64) {
        let program = command_line
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        self.register(
            command_line,
            Err(CommandError::TimedOut {
                program,
                after_secs,
            }),
        );
    }

    /// Command lines in invocation order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(needle)).count()
    }
}

impl CommandRunner for FakeCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutcome, CommandError> {
        let line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(line.clone());

        self.responses
            .lock()
            .unwrap()
            .get(&line)
            .cloned()
            .unwrap_or_else(|| Ok(CommandOutcome::success()))
    }
}
