//! Scripted command runner.
//!
//! Stands in for `launchctl`, `systemctl` and `sc.exe`: each invocation is
//! matched against registered command-line prefixes and answered with a
//! canned [`CommandOutput`]. Every invocation is recorded.

use std::collections::VecDeque;
use std::io;

use async_trait::async_trait;
use parking_lot::Mutex;
use sysservice_core::{CommandOutput, CommandRunner, Result, ServiceError};

#[derive(Debug, Clone)]
enum Reply {
    Output(CommandOutput),
    SpawnError,
}

#[derive(Debug)]
struct Rule {
    prefix: String,
    replies: VecDeque<Reply>,
}

impl Rule {
    /// Next reply; the last one repeats forever.
    fn take_reply(&mut self) -> Reply {
        if self.replies.len() > 1 {
            if let Some(reply) = self.replies.pop_front() {
                return reply;
            }
        }
        self.replies
            .front()
            .cloned()
            .unwrap_or_else(|| Reply::Output(CommandOutput::success("")))
    }
}

/// Command runner answering from a script.
///
/// Unmatched invocations succeed with empty output. When several prefixes
/// match, the longest wins.
///
/// # Example
///
/// ```rust
/// use sysservice_core::CommandOutput;
/// use sysservice_test::ScriptedRunner;
///
/// let runner = ScriptedRunner::new()
///     .on("launchctl list", CommandOutput::success("123\t0\tcom.myservice\n"));
/// assert!(runner.calls().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    /// Creates a runner with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers invocations starting with `prefix` with `output`.
    #[must_use]
    pub fn on(self, prefix: impl Into<String>, output: CommandOutput) -> Self {
        self.push_rule(prefix.into(), vec![Reply::Output(output)]);
        self
    }

    /// Answers successive matching invocations with `outputs` in order,
    /// repeating the last.
    #[must_use]
    pub fn on_sequence(self, prefix: impl Into<String>, outputs: Vec<CommandOutput>) -> Self {
        self.push_rule(prefix.into(), outputs.into_iter().map(Reply::Output).collect());
        self
    }

    /// Makes invocations starting with `prefix` fail to launch.
    #[must_use]
    pub fn fail_spawn(self, prefix: impl Into<String>) -> Self {
        self.push_rule(prefix.into(), vec![Reply::SpawnError]);
        self
    }

    fn push_rule(&self, prefix: String, replies: Vec<Reply>) {
        self.rules.lock().push(Rule {
            prefix,
            replies: replies.into(),
        });
    }

    /// Every invocation so far, as `program arg1 arg2…`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Invocations that start with `prefix`.
    #[must_use]
    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Forgets recorded invocations.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let line = std::iter::once(program)
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().push(line.clone());
        tracing::trace!(command = %line, "scripted invocation");

        let reply = {
            let mut rules = self.rules.lock();
            rules
                .iter_mut()
                .filter(|r| line.starts_with(&r.prefix))
                .max_by_key(|r| r.prefix.len())
                .map(Rule::take_reply)
        };

        match reply {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::SpawnError) => Err(ServiceError::Spawn {
                program: program.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "scripted spawn failure"),
            }),
            None => Ok(CommandOutput::success("")),
        }
    }
}
