// ABOUTME: The individual credential sources: env var, CLI refresh, cached config files.
// ABOUTME: Each returns Some(token) or None to let the chain try the next one.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use nonempty::NonEmpty;
use regex::Regex;

use super::{ApiToken, CredentialSource};
use crate::config::EnvLookup;
use crate::process::{CommandRunner, CommandSpec};

/// Environment variable checked first, and passed on to child processes.
pub const API_TOKEN_ENV: &str = "CLOUDFLARE_API_TOKEN";

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*(?:oauth_token|api_token)\s*=\s*"([^"]+)""#)
        .expect("token pattern is a valid regex")
});

/// Reads a token from an environment variable, falling back to the
/// project's `.env` when one has been loaded.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
    env: EnvLookup,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            env: EnvLookup::default(),
        }
    }

    pub fn with_lookup(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }
}

#[async_trait]
impl CredentialSource for EnvToken {
    fn name(&self) -> String {
        format!("env {}", self.var)
    }

    async fn resolve(&self) -> Option<ApiToken> {
        self.env
            .get(&self.var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(ApiToken::new)
    }
}

/// Runs `<deploy-cli> whoami` so the CLI refreshes an expired OAuth token in
/// its own config file. Never yields a token itself.
pub struct CliRefresh {
    runner: Arc<dyn CommandRunner>,
    deploy_cli: NonEmpty<String>,
    cwd: PathBuf,
}

impl CliRefresh {
    pub fn new(runner: Arc<dyn CommandRunner>, deploy_cli: NonEmpty<String>, cwd: &Path) -> Self {
        Self {
            runner,
            deploy_cli,
            cwd: cwd.to_path_buf(),
        }
    }
}

#[async_trait]
impl CredentialSource for CliRefresh {
    fn name(&self) -> String {
        format!("{} whoami", self.deploy_cli.head)
    }

    async fn resolve(&self) -> Option<ApiToken> {
        let spec = CommandSpec::from_argv(&self.deploy_cli)
            .arg("whoami")
            .current_dir(&self.cwd);

        // No session is not fatal here; the config file source decides.
        match self.runner.run(&spec).await {
            Ok(output) if output.success() => {
                tracing::debug!("deploy CLI session refreshed");
            }
            Ok(output) => {
                tracing::debug!(exit_code = ?output.exit_code, "deploy CLI whoami failed");
            }
            Err(e) => {
                tracing::debug!("deploy CLI whoami could not run: {}", e);
            }
        }
        None
    }
}

/// Scans the deploy CLI's cached config files, in order, for a token.
#[derive(Debug, Clone)]
pub struct ConfigFileToken {
    paths: Vec<PathBuf>,
}

impl ConfigFileToken {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Wrangler's config locations for this platform, most specific first.
    pub fn standard() -> Self {
        let relative = Path::new(".wrangler").join("config").join("default.toml");
        let mut paths = Vec::new();

        if cfg!(target_os = "macos")
            && let Some(home) = dirs::home_dir()
        {
            paths.push(home.join("Library").join("Preferences").join(&relative));
        }
        if let Some(config) = dirs::config_dir() {
            paths.push(config.join(&relative));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join(&relative));
            paths.push(home.join(&relative));
        }

        paths.dedup();
        Self::new(paths)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

/// Pull a token out of a wrangler TOML config body.
pub(crate) fn extract_token(content: &str) -> Option<String> {
    TOKEN_PATTERN
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[async_trait]
impl CredentialSource for ConfigFileToken {
    fn name(&self) -> String {
        "wrangler config files".to_string()
    }

    async fn resolve(&self) -> Option<ApiToken> {
        for path in &self.paths {
            let Ok(content) = tokio::fs::read_to_string(path).await else {
                continue;
            };
            if let Some(token) = extract_token(&content) {
                tracing::debug!(path = %path.display(), "found cached credential");
                return Some(ApiToken::new(token));
            }
            tracing::debug!(path = %path.display(), "config file has no token");
        }
        None
    }
}
