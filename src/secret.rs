// ABOUTME: Ensures a generated auth secret is uploaded to the Worker exactly once.
// ABOUTME: The value goes to the deploy CLI over stdin; only the fact it was set is recorded.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use secrecy::SecretString;

use crate::process::{CommandRunner, CommandSpec, ProcessError};
use crate::state::{StateError, StateStore};

pub const DEFAULT_SECRET_NAME: &str = "BETTER_AUTH_SECRET";
pub const DEFAULT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretOutcome {
    /// The ledger says a secret was already set; nothing was run.
    AlreadyConfigured,
    /// A new secret was generated and uploaded.
    Uploaded,
}

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("secret upload exited with status {}: {stderr}", exit_code.map_or("unknown".to_string(), |c| c.to_string()))]
    UploadFailed {
        exit_code: Option<i32>,
        stderr: String,
    },
}

/// Generate `length` random bytes from the OS CSPRNG, base64 encoded.
pub fn generate_secret(length: usize) -> SecretString {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);
    SecretString::from(STANDARD.encode(&bytes))
}

/// Uploads the Worker secret through the deploy CLI.
pub struct SecretManager<'a> {
    runner: &'a dyn CommandRunner,
    store: &'a StateStore,
    deploy_cli: CommandSpec,
    name: String,
    length: usize,
}

impl<'a> SecretManager<'a> {
    /// `deploy_cli` is the base command (program, working directory and
    /// environment); the `secret put` arguments are appended to it.
    pub fn new(runner: &'a dyn CommandRunner, store: &'a StateStore, deploy_cli: CommandSpec) -> Self {
        Self {
            runner,
            store,
            deploy_cli,
            name: DEFAULT_SECRET_NAME.to_string(),
            length: DEFAULT_SECRET_LENGTH,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Set the secret on the Worker addressed by `config_path`, unless the
    /// ledger records that it was already set.
    pub async fn ensure_secret(&self, config_path: &Path) -> Result<SecretOutcome, SecretError> {
        let mut state = self.store.load()?;
        if state.auth_secret_set {
            tracing::info!(secret = %self.name, "secret already configured");
            return Ok(SecretOutcome::AlreadyConfigured);
        }

        let spec = self
            .deploy_cli
            .clone()
            .args(["secret", "put", self.name.as_str(), "--config"])
            .arg(config_path.display().to_string());

        let value = generate_secret(self.length);
        tracing::info!(secret = %self.name, "uploading generated secret");
        let output = self.runner.run_with_input(&spec, &value).await?;

        if !output.success() {
            return Err(SecretError::UploadFailed {
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        state.mark_secret_set();
        self.store.save(&state)?;
        Ok(SecretOutcome::Uploaded)
    }
}
