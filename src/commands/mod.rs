// ABOUTME: Command module aggregator for the hoist CLI.
// ABOUTME: Re-exports init, deploy, status, and zones command handlers.

mod deploy;
mod init;
mod status;
mod zones;

pub use deploy::deploy;
pub use init::init;
pub use status::status;
pub use zones::zones;

use std::path::Path;
use std::sync::Arc;

use hoist::config::{Config, EnvLookup};
use hoist::credentials::{ApiToken, CredentialChain};
use hoist::error::Result;
use hoist::process::CommandRunner;

/// Resolve a Cloudflare credential using the standard source chain.
async fn resolve_token(
    runner: Arc<dyn CommandRunner>,
    config: &Config,
    project_dir: &Path,
    env: &EnvLookup,
) -> Result<ApiToken> {
    let token = CredentialChain::standard(runner, &config.deploy_cli, project_dir, env)
        .resolve()
        .await?;
    Ok(token)
}
