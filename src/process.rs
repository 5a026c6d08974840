// ABOUTME: External command execution with bounded run time.
// ABOUTME: CommandRunner is the seam between the orchestrator and bun/drizzle-kit/wrangler.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use nonempty::NonEmpty;
use secrecy::{ExposeSecret, SecretString};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Default bound on a single external command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// A command to run: program, arguments, working directory and extra environment.
///
/// Environment values may carry credentials, so `Debug` only lists their keys.
#[derive(Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Build a spec from an argv-style list such as `["bunx", "wrangler"]`.
    pub fn from_argv(argv: &NonEmpty<String>) -> Self {
        Self::new(argv.head.clone()).args(argv.tail.iter().cloned())
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn get_env(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Human-readable command line, without environment.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("cwd", &self.cwd)
            .field(
                "env",
                &self.env.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    fn from_std(output: std::process::Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Errors that prevent a command from producing an exit status.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {after:?}")]
    TimedOut { program: String, after: Duration },
}

impl ProcessError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProcessError::TimedOut { .. })
    }
}

/// Runs external commands to completion.
///
/// A non-zero exit is not an error at this level: callers inspect
/// [`CommandOutput::success`] and decide what failure means for them.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError>;

    /// Run with `input` written to the child's stdin, then stdin closed.
    async fn run_with_input(
        &self,
        spec: &CommandSpec,
        input: &SecretString,
    ) -> Result<CommandOutput, ProcessError>;
}

/// Runs commands as local child processes, killing any that outlive the timeout.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn timed_out(&self, spec: &CommandSpec) -> ProcessError {
        ProcessError::TimedOut {
            program: spec.program.clone(),
            after: self.timeout,
        }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        tracing::debug!(command = %spec.display(), "running command");

        let child = spec
            .to_command()
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| self.timed_out(spec))?
            .map_err(|source| ProcessError::Io {
                program: spec.program.clone(),
                source,
            })?;

        let output = CommandOutput::from_std(output);
        tracing::debug!(
            command = %spec.display(),
            exit_code = ?output.exit_code,
            "command finished"
        );
        Ok(output)
    }

    async fn run_with_input(
        &self,
        spec: &CommandSpec,
        input: &SecretString,
    ) -> Result<CommandOutput, ProcessError> {
        tracing::debug!(command = %spec.display(), "running command with piped stdin");

        let mut child = spec
            .to_command()
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        let io_error = |source| ProcessError::Io {
            program: spec.program.clone(),
            source,
        };

        // Feed stdin while stdout/stderr are drained, so a child that writes
        // before it reads cannot stall on a full pipe.
        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            stdin.write_all(input.expose_secret().as_bytes()).await?;
            stdin.shutdown().await
        };

        let exchange = async {
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            let output = output.map_err(io_error)?;
            match fed {
                // The child exited without reading all of its input; its
                // exit status says what happened.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(output),
                Err(e) => Err(io_error(e)),
                Ok(()) => Ok(output),
            }
        };

        let output = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| self.timed_out(spec))??;

        Ok(CommandOutput::from_std(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> NonEmpty<String> {
        NonEmpty::from_vec(items.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn from_argv_splits_program_and_args() {
        let spec = CommandSpec::from_argv(&argv(&["bunx", "wrangler"])).arg("deploy");
        assert_eq!(spec.program(), "bunx");
        assert_eq!(spec.get_args(), ["wrangler", "deploy"]);
        assert_eq!(spec.display(), "bunx wrangler deploy");
    }

    #[test]
    fn debug_hides_env_values() {
        let spec = CommandSpec::new("wrangler").env("CLOUDFLARE_API_TOKEN", "super-secret");
        let debug = format!("{spec:?}");
        assert!(debug.contains("CLOUDFLARE_API_TOKEN"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn later_env_entries_win() {
        let spec = CommandSpec::new("x").env("A", "1").env("A", "2");
        assert_eq!(spec.get_env("A"), Some("2"));
        assert_eq!(spec.get_env("B"), None);
    }

    #[tokio::test]
    async fn captures_exit_status_and_output() {
        let runner = SystemRunner::default();
        let spec = CommandSpec::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = runner.run(&spec).await.unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let runner = SystemRunner::default();
        let spec = CommandSpec::new("definitely-not-a-real-program-hoist");
        let err = runner.run(&spec).await.unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let runner = SystemRunner::new(Duration::from_millis(100));
        let spec = CommandSpec::new("sleep").arg("5");
        let err = runner.run(&spec).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn input_is_delivered_on_stdin() {
        let runner = SystemRunner::default();
        let spec = CommandSpec::new("cat");
        let secret = SecretString::from("piped-value".to_string());
        let output = runner.run_with_input(&spec, &secret).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "piped-value");
    }

    #[tokio::test]
    async fn large_input_and_output_do_not_deadlock() {
        // Both sides exceed a pipe buffer: the child fills stdout before
        // reading any of its input.
        let runner = SystemRunner::new(Duration::from_secs(20));
        let spec = CommandSpec::new("sh")
            .args(["-c", "head -c 262144 /dev/zero; cat > /dev/null"]);
        let secret = SecretString::from("x".repeat(262_144));

        let output = runner.run_with_input(&spec, &secret).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.len(), 262_144);
    }
}
