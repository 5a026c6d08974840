// ABOUTME: Scripted CommandRunner that records every invocation.
// ABOUTME: Commands succeed unless a rule matching their arguments says otherwise.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};

use hoist::process::{CommandOutput, CommandRunner, CommandSpec, ProcessError};

/// One observed command.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub token: Option<String>,
    pub account: Option<String>,
    /// Data written to stdin, when the command was run with input.
    pub stdin: Option<String>,
}

impl RecordedCall {
    pub fn line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

enum Behavior {
    Exit { code: i32, stderr: String },
    TimeOut,
}

pub struct FakeRunner {
    rules: Mutex<Vec<(String, Behavior)>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Commands whose argument list contains `arg` exit with `code`.
    pub fn fail_on(self, arg: &str, code: i32, stderr: &str) -> Self {
        self.rules.lock().push((
            arg.to_string(),
            Behavior::Exit {
                code,
                stderr: stderr.to_string(),
            },
        ));
        self
    }

    /// Commands whose argument list contains `arg` time out.
    pub fn time_out_on(self, arg: &str) -> Self {
        self.rules.lock().push((arg.to_string(), Behavior::TimeOut));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Calls whose arguments contain `arg`.
    pub fn calls_with(&self, arg: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.has_arg(arg))
            .collect()
    }

    fn respond(
        &self,
        spec: &CommandSpec,
        stdin: Option<String>,
    ) -> Result<CommandOutput, ProcessError> {
        self.calls.lock().push(RecordedCall {
            program: spec.program().to_string(),
            args: spec.get_args().to_vec(),
            token: spec.get_env("CLOUDFLARE_API_TOKEN").map(str::to_string),
            account: spec.get_env("CLOUDFLARE_ACCOUNT_ID").map(str::to_string),
            stdin,
        });

        let rules = self.rules.lock();
        let rule = rules
            .iter()
            .find(|(arg, _)| spec.get_args().iter().any(|a| a == arg));

        match rule {
            Some((_, Behavior::TimeOut)) => Err(ProcessError::TimedOut {
                program: spec.program().to_string(),
                after: Duration::from_secs(1),
            }),
            Some((_, Behavior::Exit { code, stderr })) => Ok(CommandOutput {
                exit_code: Some(*code),
                stdout: String::new(),
                stderr: stderr.clone(),
            }),
            None => Ok(CommandOutput {
                exit_code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            }),
        }
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        self.respond(spec, None)
    }

    async fn run_with_input(
        &self,
        spec: &CommandSpec,
        input: &SecretString,
    ) -> Result<CommandOutput, ProcessError> {
        self.respond(spec, Some(input.expose_secret().to_string()))
    }
}
