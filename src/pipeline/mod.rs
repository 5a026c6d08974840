// ABOUTME: Deploy pipeline coordinator.
// ABOUTME: Runs the fixed stage list in order and stops at the first failure.

mod config;
mod error;
mod stage;

pub use config::{ACCOUNT_ID_ENV, PipelineConfig};
pub use error::{PipelineError, PipelineErrorKind};
pub use stage::Stage;

use crate::cloudflare::CloudApi;
use crate::diagnostics::{Diagnostics, Warning};
use crate::output::Output;
use crate::process::{CommandRunner, CommandSpec};
use crate::provision::{DatabaseBinding, Provisioned, Provisioner};
use crate::render::{RenderInputs, RenderedConfig, WranglerConfig};
use crate::secret::{SecretError, SecretManager, SecretOutcome};
use crate::state::StateStore;
use crate::types::AccountId;

/// What a completed run did.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub database: DatabaseBinding,
    /// True when this run created the database.
    pub database_created: bool,
    pub secret: SecretOutcome,
    pub completed: Vec<Stage>,
}

/// Drives one deploy.
///
/// Only the provisioning and secret stages are skipped on a rerun (through
/// the ledger); build, migration and deploy stages run every time.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    runner: &'a dyn CommandRunner,
    api: &'a dyn CloudApi,
    store: StateStore,
    output: &'a Output,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        runner: &'a dyn CommandRunner,
        api: &'a dyn CloudApi,
        output: &'a Output,
    ) -> Self {
        Self {
            config,
            runner,
            api,
            store: config.state_store(),
            output,
        }
    }

    /// Run every stage in [`Stage::ALL`] order, failing fast.
    ///
    /// Ledger updates made by stages that finished before a failure are
    /// kept, so rerunning resumes at the failed stage in effect. The
    /// rendered config is removed whether or not the later stages succeed.
    pub async fn run(&self, diag: &mut Diagnostics) -> Result<PipelineReport, PipelineError> {
        let cfg = self.config;
        let mut completed = Vec::with_capacity(Stage::ALL.len());

        let build = cfg.command(&cfg.build_command, None);
        self.step(Stage::Build, &mut completed, self.run_tool(Stage::Build, build))
            .await?;

        let generate = cfg.command(&cfg.generate_command, None);
        self.step(
            Stage::GenerateMigrations,
            &mut completed,
            self.run_tool(Stage::GenerateMigrations, generate),
        )
        .await?;

        let provisioned = self
            .step(Stage::ProvisionDatabase, &mut completed, self.provision())
            .await?;

        let rendered = self
            .step(Stage::RenderConfig, &mut completed, async {
                self.render(&provisioned.binding)
            })
            .await?;

        let result = self
            .run_with_config(&provisioned, &rendered, &mut completed)
            .await;

        let path = rendered.path_buf();
        if let Err(e) = rendered.close() {
            diag.warn(Warning::config_cleanup(format!(
                "failed to remove rendered config {}: {}",
                path.display(),
                e
            )));
        }

        let secret = result?;
        Ok(PipelineReport {
            database: provisioned.binding,
            database_created: provisioned.created,
            secret,
            completed,
        })
    }

    /// The stages that hand the rendered config to the deploy CLI.
    async fn run_with_config(
        &self,
        provisioned: &Provisioned,
        rendered: &RenderedConfig,
        completed: &mut Vec<Stage>,
    ) -> Result<SecretOutcome, PipelineError> {
        let cfg = self.config;
        let account = provisioned.account.as_ref();
        let config_path = rendered.path().display().to_string();

        let apply = cfg
            .command(&cfg.deploy_cli, account)
            .args(["d1", "migrations", "apply"])
            .arg(provisioned.binding.name.as_str())
            .args(["--remote", "--config"])
            .arg(config_path.as_str());
        self.step(
            Stage::ApplyMigrations,
            completed,
            self.run_tool(Stage::ApplyMigrations, apply),
        )
        .await?;

        let deploy = cfg
            .command(&cfg.deploy_cli, account)
            .args(["deploy", "--config"])
            .arg(config_path.as_str());
        self.step(Stage::Deploy, completed, self.run_tool(Stage::Deploy, deploy))
            .await?;

        self.step(
            Stage::EnsureSecret,
            completed,
            self.ensure_secret(account, rendered),
        )
        .await
    }

    /// Announce `stage`, await its work, and record it as completed on success.
    async fn step<T>(
        &self,
        stage: Stage,
        completed: &mut Vec<Stage>,
        work: impl Future<Output = Result<T, PipelineError>>,
    ) -> Result<T, PipelineError> {
        self.output
            .progress(&format!("  → {}...", stage.description()));
        tracing::info!(stage = %stage, "stage started");

        match work.await {
            Ok(value) => {
                completed.push(stage);
                Ok(value)
            }
            Err(e) => {
                tracing::error!(stage = %stage, "stage failed: {}", e);
                Err(e)
            }
        }
    }

    async fn ensure_secret(
        &self,
        account: Option<&AccountId>,
        rendered: &RenderedConfig,
    ) -> Result<SecretOutcome, PipelineError> {
        let cfg = self.config;
        let base = cfg.command(&cfg.deploy_cli, account);
        let command = format!("{} secret put {}", base.display(), cfg.secret_name);

        let outcome = SecretManager::new(self.runner, &self.store, base)
            .name(cfg.secret_name.as_str())
            .length(cfg.secret_length)
            .ensure_secret(rendered.path())
            .await
            .map_err(|e| match e {
                SecretError::Process(p) => {
                    PipelineError::from_process(Stage::EnsureSecret, command, p)
                }
                source => PipelineError::Secret { source },
            })?;

        match outcome {
            SecretOutcome::AlreadyConfigured => {
                self.output.progress("    secret already configured")
            }
            SecretOutcome::Uploaded => self.output.progress("    secret uploaded"),
        }
        Ok(outcome)
    }

    /// Run an external tool and turn a non-zero exit into a stage failure.
    async fn run_tool(&self, stage: Stage, spec: CommandSpec) -> Result<(), PipelineError> {
        let command = spec.display();
        let output = self
            .runner
            .run(&spec)
            .await
            .map_err(|e| PipelineError::from_process(stage, command.clone(), e))?;

        if !output.stdout.trim().is_empty() {
            tracing::debug!(stage = %stage, "{}", output.stdout.trim_end());
        }

        if output.success() {
            Ok(())
        } else {
            Err(PipelineError::CommandFailed {
                stage,
                command,
                exit_code: output.exit_code,
                stderr: output.stderr,
            })
        }
    }

    async fn provision(&self) -> Result<Provisioned, PipelineError> {
        let provisioned = Provisioner::new(self.api, &self.store)
            .account(self.config.account_id.clone())
            .verify_cached(self.config.verify_cached)
            .ensure_database(&self.config.app)
            .await
            .map_err(|source| PipelineError::Provision { source })?;

        let binding = &provisioned.binding;
        if provisioned.created {
            self.output.progress(&format!(
                "    created database {} ({})",
                binding.name, binding.id
            ));
        } else {
            self.output.progress(&format!(
                "    database {} already provisioned ({})",
                binding.name, binding.id
            ));
        }
        Ok(provisioned)
    }

    fn render(&self, database: &DatabaseBinding) -> Result<RenderedConfig, PipelineError> {
        let cfg = self.config;
        let inputs = RenderInputs {
            app: &cfg.app,
            domain: &cfg.domain,
            entrypoint: &cfg.entrypoint,
            compatibility_date: &cfg.compatibility_date,
            compatibility_flags: &cfg.compatibility_flags,
            assets_dir: &cfg.out_dir,
            database_binding: &cfg.database_binding,
            database,
            migrations_dir: &cfg.migrations_dir,
        };
        WranglerConfig::new(&inputs)
            .write_temp(&cfg.state_dir())
            .map_err(|source| PipelineError::Render { source })
    }
}
