// ABOUTME: Stage-attributed pipeline errors with SNAFU.
// ABOUTME: Every variant names the stage that failed; kind() supports programmatic handling.

use std::time::Duration;

use snafu::Snafu;

use super::Stage;
use crate::process::ProcessError;
use crate::provision::ProvisionError;
use crate::render::RenderError;
use crate::secret::SecretError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PipelineError {
    #[snafu(display(
        "stage '{stage}' failed: `{command}` exited with status {}{}",
        exit_code.map_or("unknown".to_string(), |c| c.to_string()),
        stderr_suffix(stderr)
    ))]
    CommandFailed {
        stage: Stage,
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[snafu(display("stage '{stage}' timed out after {timeout:?}"))]
    StageTimedOut { stage: Stage, timeout: Duration },

    #[snafu(display("stage '{stage}' could not run `{command}`: {source}"))]
    Spawn {
        stage: Stage,
        command: String,
        source: ProcessError,
    },

    #[snafu(display("stage '{}' failed: {source}", Stage::ProvisionDatabase))]
    Provision { source: ProvisionError },

    #[snafu(display("stage '{}' failed: {source}", Stage::RenderConfig))]
    Render { source: RenderError },

    #[snafu(display("stage '{}' failed: {source}", Stage::EnsureSecret))]
    Secret { source: SecretError },
}

fn stderr_suffix(stderr: &str) -> String {
    let last = stderr.trim().lines().last().unwrap_or_default();
    if last.is_empty() {
        String::new()
    } else {
        format!(": {last}")
    }
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    /// An external tool exited non-zero.
    StageFailed,
    /// An external tool exceeded its time bound.
    TimedOut,
    /// Configuration or credentials make the stage impossible (no account).
    Fatal,
}

impl PipelineError {
    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::CommandFailed { stage, .. }
            | PipelineError::StageTimedOut { stage, .. }
            | PipelineError::Spawn { stage, .. } => *stage,
            PipelineError::Provision { .. } => Stage::ProvisionDatabase,
            PipelineError::Render { .. } => Stage::RenderConfig,
            PipelineError::Secret { .. } => Stage::EnsureSecret,
        }
    }

    pub fn kind(&self) -> PipelineErrorKind {
        match self {
            PipelineError::StageTimedOut { .. } => PipelineErrorKind::TimedOut,
            PipelineError::Provision {
                source: ProvisionError::NoAccount | ProvisionError::StaleState { .. },
            } => PipelineErrorKind::Fatal,
            _ => PipelineErrorKind::StageFailed,
        }
    }

    /// Map a process error to a timeout or a spawn failure for `stage`.
    pub(crate) fn from_process(stage: Stage, command: String, err: ProcessError) -> Self {
        match err {
            ProcessError::TimedOut { after, .. } => PipelineError::StageTimedOut {
                stage,
                timeout: after,
            },
            source => PipelineError::Spawn {
                stage,
                command,
                source,
            },
        }
    }
}
