// ABOUTME: Fully resolved, immutable inputs for one pipeline run.
// ABOUTME: Built once from hoist.yml, the environment, and the resolved credential.

use std::path::{Path, PathBuf};

use nonempty::NonEmpty;

use crate::config::{Config, EnvLookup};
use crate::credentials::{API_TOKEN_ENV, ApiToken};
use crate::error::{Error, Result};
use crate::process::CommandSpec;
use crate::state::{STATE_DIR, StateStore};
use crate::types::{AccountId, AppName, CustomDomain};

/// Environment variable the deploy CLI reads the account from.
pub const ACCOUNT_ID_ENV: &str = "CLOUDFLARE_ACCOUNT_ID";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub app: AppName,
    pub domain: CustomDomain,
    pub token: ApiToken,
    pub account_id: Option<AccountId>,

    /// Absolute project root; every relative path below is resolved against it.
    pub project_dir: PathBuf,
    pub infra_dir: PathBuf,

    pub build_command: NonEmpty<String>,
    pub out_dir: PathBuf,

    pub generate_command: NonEmpty<String>,
    pub migrations_dir: PathBuf,

    pub deploy_cli: NonEmpty<String>,
    pub entrypoint: PathBuf,
    pub compatibility_date: String,
    pub compatibility_flags: Vec<String>,

    pub database_binding: String,
    pub verify_cached: bool,

    pub secret_name: String,
    pub secret_length: usize,
}

impl PipelineConfig {
    pub fn resolve(
        config: &Config,
        project_dir: &Path,
        token: ApiToken,
        env: &EnvLookup,
    ) -> Result<Self> {
        let project_dir = if project_dir.is_absolute() {
            project_dir.to_path_buf()
        } else {
            std::env::current_dir()?.join(project_dir)
        };
        let at_root = |p: &Path| project_dir.join(p);

        let domain = CustomDomain::new(&config.domain.resolve_with(env)?)
            .map_err(|e| Error::InvalidConfig(format!("domain: {e}")))?;

        let account_id = config
            .account_id
            .as_ref()
            .map(|v| v.resolve_with(env))
            .transpose()?
            .filter(|id| !id.trim().is_empty())
            .map(AccountId::new);

        Ok(Self {
            app: config.app.clone(),
            domain,
            token,
            account_id,
            infra_dir: at_root(&config.infra_dir),
            build_command: config.build.command.clone(),
            out_dir: at_root(&config.build.out_dir),
            generate_command: config.migrations.generate_command(),
            migrations_dir: at_root(&config.migrations.dir),
            deploy_cli: config.deploy_cli.clone(),
            entrypoint: at_root(&config.worker.entrypoint),
            compatibility_date: config.worker.compatibility_date.clone(),
            compatibility_flags: config.worker.compatibility_flags.clone(),
            database_binding: config.database.binding.clone(),
            verify_cached: config.database.verify_cached,
            secret_name: config.secret.name.clone(),
            secret_length: config.secret.length,
            project_dir,
        })
    }

    /// Directory for the ledger, lock and rendered config.
    pub fn state_dir(&self) -> PathBuf {
        self.infra_dir.join(STATE_DIR)
    }

    pub fn state_store(&self) -> StateStore {
        StateStore::for_infra_dir(&self.infra_dir)
    }

    /// Base spec for an external command: runs in the project root with the
    /// credential (and account, once known) in its environment.
    pub fn command(&self, argv: &NonEmpty<String>, account: Option<&AccountId>) -> CommandSpec {
        let spec = CommandSpec::from_argv(argv)
            .current_dir(&self.project_dir)
            .env(API_TOKEN_ENV, self.token.expose());
        match account.or(self.account_id.as_ref()) {
            Some(account) => spec.env(ACCOUNT_ID_ENV, account.as_str()),
            None => spec,
        }
    }
}
