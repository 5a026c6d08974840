// ABOUTME: Deploy command implementation.
// ABOUTME: Resolves credentials and config, takes the deploy lock, and runs the pipeline.

use std::path::Path;
use std::sync::Arc;

use hoist::cloudflare::CloudflareClient;
use hoist::config::{Config, EnvLookup};
use hoist::diagnostics::{Diagnostics, Warning};
use hoist::error::Result;
use hoist::lock::DeployLock;
use hoist::output::Output;
use hoist::pipeline::{Pipeline, PipelineConfig};
use hoist::process::{CommandRunner, SystemRunner};
use hoist::secret::SecretOutcome;

use super::resolve_token;

pub async fn deploy(
    config: Config,
    project_dir: &Path,
    force: bool,
    output: &mut Output,
) -> Result<()> {
    output.start_timer();
    let mut diag = Diagnostics::default();

    let env = EnvLookup::load(project_dir)?;
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new(config.timeouts.stage));
    let token = resolve_token(Arc::clone(&runner), &config, project_dir, &env).await?;
    let pipeline_config = PipelineConfig::resolve(&config, project_dir, token, &env)?;
    let api = CloudflareClient::new(pipeline_config.token.clone(), config.timeouts.api)?;

    output.progress(&format!(
        "Deploying {} to {}",
        pipeline_config.app, pipeline_config.domain
    ));

    let lock = DeployLock::acquire(&pipeline_config.state_dir(), &pipeline_config.app, force)?;
    let result = Pipeline::new(&pipeline_config, runner.as_ref(), &api, output)
        .run(&mut diag)
        .await;

    if let Err(e) = lock.release() {
        diag.warn(Warning::lock_release(e.to_string()));
    }
    for warning in diag.warnings() {
        output.warning(&warning.to_string());
    }

    let report = result?;
    tracing::info!(
        database = %report.database.id,
        created = report.database_created,
        secret_uploaded = report.secret == SecretOutcome::Uploaded,
        "deploy finished"
    );
    output.success(&format!(
        "Deployed {} to {}",
        pipeline_config.app,
        pipeline_config.domain.url()
    ));
    Ok(())
}
