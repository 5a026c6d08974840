// ABOUTME: First-time project setup.
// ABOUTME: Writes the .env holding the custom domain and a hoist.yml template.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{AppName, CustomDomain, MAX_APP_NAME_LEN};

use super::dotenv::{self, DOTENV_FILENAME};
use super::{CONFIG_FILENAME, Config, DOMAIN_ENV};

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Zone (apex domain) the app is served under.
    pub zone: String,
    pub subdomain: Option<String>,
    /// Defaults to a name derived from the project directory.
    pub app: Option<String>,
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct InitReport {
    pub domain: CustomDomain,
    pub env_path: PathBuf,
    /// `None` when an existing config file was left alone.
    pub config_path: Option<PathBuf>,
}

/// Configure a project for deployment.
///
/// Refuses to touch an existing `.env` unless `force` is set: a present
/// `.env` means the project was already configured.
pub fn init_project(dir: &Path, options: &InitOptions) -> Result<InitReport> {
    let env_path = dir.join(DOTENV_FILENAME);
    if env_path.exists() && !options.force {
        return Err(Error::AlreadyExists(env_path));
    }

    let domain = CustomDomain::with_subdomain(&options.zone, options.subdomain.as_deref())
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;

    let app = match options.app {
        Some(ref name) => AppName::new(name),
        None => AppName::new(&app_name_from_dir(dir)),
    }
    .map_err(|e| Error::InvalidConfig(format!("{e} (pass --app to choose a name)")))?;

    std::fs::write(
        &env_path,
        dotenv::render(&[(DOMAIN_ENV, domain.as_str())]),
    )?;

    let config_path = match Config::find(dir) {
        Some(existing) => {
            tracing::info!(path = %existing.display(), "keeping existing config");
            None
        }
        None => {
            let path = dir.join(CONFIG_FILENAME);
            std::fs::write(&path, generate_template_yaml(&app))?;
            Some(path)
        }
    };

    Ok(InitReport {
        domain,
        env_path,
        config_path,
    })
}

/// Turn a directory name into a Worker-safe name: lowercase, with runs of
/// other characters collapsed to single hyphens.
fn app_name_from_dir(dir: &Path) -> String {
    let raw = dir
        .canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .or_else(|| dir.file_name())
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let mut name = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            name.push(c);
        } else if !name.ends_with('-') {
            name.push('-');
        }
    }
    let name: String = name.trim_matches('-').chars().take(MAX_APP_NAME_LEN).collect();
    name.trim_end_matches('-').to_string()
}

fn generate_template_yaml(app: &AppName) -> String {
    format!(
        r#"app: {app}
# Custom domain; read from {DOMAIN_ENV} in the environment or .env by default.
# domain: {{ env: {DOMAIN_ENV} }}
infra_dir: infra
deploy_cli: bunx wrangler

build:
  # Keep --outdir in sync with out_dir.
  command: ["bun", "build", "./frontend/index.html", "--outdir", "./dist", "--sourcemap=external", "--target=browser", "--minify"]
  out_dir: dist

migrations:
  schema: auth/db-schema.ts
  dir: infra/migrations

worker:
  entrypoint: infra/index.ts
  compatibility_flags: [nodejs_compat]

database:
  binding: DB
  # verify_cached: true

secret:
  name: BETTER_AUTH_SECRET
  length: 32

timeouts:
  stage: 10m
  api: 30s
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_app_name_from_directory() {
        assert_eq!(
            app_name_from_dir(Path::new("/tmp/My Starter_App")),
            "my-starter-app"
        );
        assert_eq!(app_name_from_dir(Path::new("/tmp/--weird--")), "weird");
    }

    #[test]
    fn template_parses_as_config() {
        let app = AppName::new("demo").unwrap();
        let config = Config::from_yaml(&generate_template_yaml(&app)).unwrap();
        assert_eq!(config.app.as_str(), "demo");
        assert_eq!(config.secret.name, "BETTER_AUTH_SECRET");
        assert_eq!(config.deploy_cli.head, "bunx");
    }
}
