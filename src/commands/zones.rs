// ABOUTME: Zones command implementation.
// ABOUTME: Lists the zones a custom domain can be attached to.

use std::path::Path;
use std::sync::Arc;

use hoist::cloudflare::{CloudApi, CloudflareClient};
use hoist::config::{Config, EnvLookup};
use hoist::error::Result;
use hoist::output::Output;
use hoist::process::{CommandRunner, SystemRunner};

use super::resolve_token;

pub async fn zones(config: &Config, project_dir: &Path, output: &Output) -> Result<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new(config.timeouts.stage));
    let env = EnvLookup::load(project_dir)?;
    let token = resolve_token(runner, config, project_dir, &env).await?;
    let api = CloudflareClient::new(token, config.timeouts.api)?;

    let zones = api.list_zones().await?;
    for zone in &zones {
        output.data(&format!(
            "{:<40} {:<10} {}",
            zone.name,
            zone.status.as_deref().unwrap_or("-"),
            zone.id
        ));
    }
    output.success(&format!("{} zone(s)", zones.len()));
    Ok(())
}
