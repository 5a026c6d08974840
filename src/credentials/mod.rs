// ABOUTME: Non-interactive Cloudflare credential resolution.
// ABOUTME: Walks an ordered chain of sources; the first one that yields a token wins.

mod sources;
mod token;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use nonempty::NonEmpty;

use crate::config::EnvLookup;
use crate::process::CommandRunner;

pub use sources::{API_TOKEN_ENV, CliRefresh, ConfigFileToken, EnvToken};
pub use token::ApiToken;

/// One strategy for finding a token.
///
/// `None` means "try the next source"; sources never fail the chain themselves.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Short description used in the not-found error.
    fn name(&self) -> String;

    async fn resolve(&self) -> Option<ApiToken>;
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("no Cloudflare credential found (tried: {})", tried.join(", "))]
    NotFound { tried: Vec<String> },
}

/// Ordered list of credential sources.
pub struct CredentialChain {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialChain {
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources }
    }

    /// The default chain: environment variable (or `.env`), CLI session
    /// refresh, then the CLI's cached config files.
    pub fn standard(
        runner: Arc<dyn CommandRunner>,
        deploy_cli: &NonEmpty<String>,
        project_dir: &Path,
        env: &EnvLookup,
    ) -> Self {
        Self::new(vec![
            Box::new(EnvToken::new(API_TOKEN_ENV).with_lookup(env.clone())),
            Box::new(CliRefresh::new(runner, deploy_cli.clone(), project_dir)),
            Box::new(ConfigFileToken::standard()),
        ])
    }

    pub async fn resolve(&self) -> Result<ApiToken, CredentialError> {
        let mut tried = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let name = source.name();
            if let Some(token) = source.resolve().await {
                tracing::debug!(source = %name, "resolved Cloudflare credential");
                return Ok(token);
            }
            tracing::debug!(source = %name, "no credential from source");
            tried.push(name);
        }
        Err(CredentialError::NotFound { tried })
    }
}
