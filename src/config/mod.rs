// ABOUTME: Configuration types and parsing for hoist.yml.
// ABOUTME: Handles YAML parsing, defaults for the bun/drizzle/wrangler toolchain, and discovery.

mod deserialize;
pub mod dotenv;
mod env_value;
mod init;

pub use env_value::{EnvLookup, EnvValue};
pub use init::{InitOptions, InitReport, init_project};

use crate::error::{Error, Result};
use crate::types::AppName;
use deserialize::{deserialize_app_name, deserialize_command, deserialize_command_option};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "hoist.yml";
pub const CONFIG_FILENAME_ALT: &str = "hoist.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".hoist/config.yml";

/// Environment variable the custom domain is read from by default.
pub const DOMAIN_ENV: &str = "CUSTOM_DOMAIN";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_app_name")]
    pub app: AppName,

    #[serde(default = "default_domain")]
    pub domain: EnvValue,

    /// Account to provision in. When unset the first visible account is used.
    #[serde(default)]
    pub account_id: Option<EnvValue>,

    #[serde(default = "default_infra_dir")]
    pub infra_dir: PathBuf,

    #[serde(
        default = "default_deploy_cli",
        deserialize_with = "deserialize_command"
    )]
    pub deploy_cli: NonEmpty<String>,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub migrations: MigrationsConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub secret: SecretConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    #[serde(
        default = "default_build_command",
        deserialize_with = "deserialize_command"
    )]
    pub command: NonEmpty<String>,

    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: default_build_command(),
            out_dir: default_out_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationsConfig {
    #[serde(default = "default_schema")]
    pub schema: PathBuf,

    #[serde(default = "default_migrations_dir")]
    pub dir: PathBuf,

    /// Overrides the generated drizzle-kit invocation.
    #[serde(default, deserialize_with = "deserialize_command_option")]
    pub generate: Option<NonEmpty<String>>,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            dir: default_migrations_dir(),
            generate: None,
        }
    }
}

impl MigrationsConfig {
    /// The migration generator command, defaulting to drizzle-kit for SQLite.
    pub fn generate_command(&self) -> NonEmpty<String> {
        if let Some(ref command) = self.generate {
            return command.clone();
        }
        let mut command = argv("bunx", &["drizzle-kit", "generate", "--dialect=sqlite"]);
        command.push(format!("--schema={}", self.schema.display()));
        command.push(format!("--out={}", self.dir.display()));
        command
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_entrypoint")]
    pub entrypoint: PathBuf,

    #[serde(default = "default_compatibility_date")]
    pub compatibility_date: String,

    #[serde(default = "default_compatibility_flags")]
    pub compatibility_flags: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            entrypoint: default_entrypoint(),
            compatibility_date: default_compatibility_date(),
            compatibility_flags: default_compatibility_flags(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_binding")]
    pub binding: String,

    /// Check that a database recorded in the ledger still exists remotely.
    #[serde(default)]
    pub verify_cached: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            binding: default_database_binding(),
            verify_cached: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecretConfig {
    #[serde(default = "default_secret_name")]
    pub name: String,

    /// Random bytes before base64 encoding.
    #[serde(default = "default_secret_length")]
    pub length: usize,
}

impl Default for SecretConfig {
    fn default() -> Self {
        Self {
            name: default_secret_name(),
            length: default_secret_length(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    /// Bound on each external command.
    #[serde(default = "default_stage_timeout", with = "humantime_serde")]
    pub stage: Duration,

    /// Bound on each Cloudflare API request.
    #[serde(default = "default_api_timeout", with = "humantime_serde")]
    pub api: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            stage: default_stage_timeout(),
            api: default_api_timeout(),
        }
    }
}

fn default_domain() -> EnvValue {
    EnvValue::from_env(DOMAIN_ENV)
}

fn default_infra_dir() -> PathBuf {
    PathBuf::from("infra")
}

fn argv(program: &str, args: &[&str]) -> NonEmpty<String> {
    let mut argv = NonEmpty::new(program.to_string());
    for arg in args {
        argv.push(arg.to_string());
    }
    argv
}

fn default_deploy_cli() -> NonEmpty<String> {
    argv("bunx", &["wrangler"])
}

fn default_build_command() -> NonEmpty<String> {
    argv(
        "bun",
        &[
            "build",
            "./frontend/index.html",
            "--outdir",
            "./dist",
            "--sourcemap=external",
            "--target=browser",
            "--minify",
            "--define",
            "process.env.NODE_ENV=\"production\"",
        ],
    )
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_schema() -> PathBuf {
    PathBuf::from("auth/db-schema.ts")
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("infra/migrations")
}

fn default_entrypoint() -> PathBuf {
    PathBuf::from("infra/index.ts")
}

fn default_compatibility_date() -> String {
    "2025-01-01".to_string()
}

fn default_compatibility_flags() -> Vec<String> {
    vec!["nodejs_compat".to_string()]
}

fn default_database_binding() -> String {
    "DB".to_string()
}

fn default_secret_name() -> String {
    crate::secret::DEFAULT_SECRET_NAME.to_string()
}

fn default_secret_length() -> usize {
    crate::secret::DEFAULT_SECRET_LENGTH
}

fn default_stage_timeout() -> Duration {
    crate::process::DEFAULT_COMMAND_TIMEOUT
}

fn default_api_timeout() -> Duration {
    crate::cloudflare::DEFAULT_API_TIMEOUT
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        match Self::find(dir) {
            Some(path) => Self::load(&path),
            None => Err(Error::ConfigNotFound(dir.to_path_buf())),
        }
    }

    /// First existing config file in `dir`, in discovery order.
    pub fn find(dir: &Path) -> Option<PathBuf> {
        [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    fn validate(&self) -> Result<()> {
        if self.secret.length < 16 {
            return Err(Error::InvalidConfig(format!(
                "secret.length must be at least 16 bytes, got {}",
                self.secret.length
            )));
        }
        if self.database.binding.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "database.binding cannot be empty".to_string(),
            ));
        }
        if self.timeouts.stage.is_zero() || self.timeouts.api.is_zero() {
            return Err(Error::InvalidConfig(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
