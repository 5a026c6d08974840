// ABOUTME: Renders the per-run wrangler configuration for the Worker.
// ABOUTME: Bindings, custom domain route, assets and observability, written to a temp file.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::provision::DatabaseBinding;
use crate::types::{AppName, CustomDomain};

pub const ASSETS_BINDING: &str = "ASSETS";

/// Everything the rendered config depends on.
#[derive(Debug, Clone)]
pub struct RenderInputs<'a> {
    pub app: &'a AppName,
    pub domain: &'a CustomDomain,
    pub entrypoint: &'a Path,
    pub compatibility_date: &'a str,
    pub compatibility_flags: &'a [String],
    pub assets_dir: &'a Path,
    pub database_binding: &'a str,
    pub database: &'a DatabaseBinding,
    pub migrations_dir: &'a Path,
}

/// wrangler.json document.
#[derive(Debug, Serialize)]
pub struct WranglerConfig {
    name: String,
    main: String,
    compatibility_date: String,
    compatibility_flags: Vec<String>,
    assets: AssetsConfig,
    d1_databases: Vec<D1Binding>,
    routes: Vec<Route>,
    workers_dev: bool,
    observability: Observability,
}

#[derive(Debug, Serialize)]
struct AssetsConfig {
    directory: String,
    binding: String,
    not_found_handling: String,
}

#[derive(Debug, Serialize)]
struct D1Binding {
    binding: String,
    database_name: String,
    database_id: String,
    migrations_dir: String,
}

#[derive(Debug, Serialize)]
struct Route {
    pattern: String,
    custom_domain: bool,
}

#[derive(Debug, Serialize)]
struct Observability {
    enabled: bool,
    head_sampling_rate: f64,
    logs: ObservabilityLogs,
}

#[derive(Debug, Serialize)]
struct ObservabilityLogs {
    invocation_logs: bool,
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

impl WranglerConfig {
    pub fn new(inputs: &RenderInputs<'_>) -> Self {
        Self {
            name: inputs.app.to_string(),
            main: path_string(inputs.entrypoint),
            compatibility_date: inputs.compatibility_date.to_string(),
            compatibility_flags: inputs.compatibility_flags.to_vec(),
            assets: AssetsConfig {
                directory: path_string(inputs.assets_dir),
                binding: ASSETS_BINDING.to_string(),
                not_found_handling: "single-page-application".to_string(),
            },
            d1_databases: vec![D1Binding {
                binding: inputs.database_binding.to_string(),
                database_name: inputs.database.name.clone(),
                database_id: inputs.database.id.to_string(),
                migrations_dir: path_string(inputs.migrations_dir),
            }],
            routes: vec![Route {
                pattern: inputs.domain.to_string(),
                custom_domain: true,
            }],
            workers_dev: true,
            observability: Observability {
                enabled: true,
                head_sampling_rate: 1.0,
                logs: ObservabilityLogs {
                    invocation_logs: true,
                },
            },
        }
    }

    pub fn to_json(&self) -> Result<String, RenderError> {
        serde_json::to_string_pretty(self).map_err(RenderError::Serialize)
    }

    /// Write the config to a fresh temp file in `dir`.
    pub fn write_temp(&self, dir: &Path) -> Result<RenderedConfig, RenderError> {
        std::fs::create_dir_all(dir)?;
        let mut file = tempfile::Builder::new()
            .prefix("wrangler-")
            .suffix(".json")
            .tempfile_in(dir)?;
        file.write_all(self.to_json()?.as_bytes())?;
        file.flush()?;
        tracing::debug!(path = %file.path().display(), "rendered wrangler config");
        Ok(RenderedConfig { file })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to serialize wrangler config: {0}")]
    Serialize(serde_json::Error),

    #[error("failed to write wrangler config: {0}")]
    Io(#[from] std::io::Error),
}

/// A rendered config on disk. The file is removed when this is dropped or closed.
#[derive(Debug)]
pub struct RenderedConfig {
    file: NamedTempFile,
}

impl RenderedConfig {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn path_buf(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Remove the file now, reporting failure instead of ignoring it.
    pub fn close(self) -> std::io::Result<()> {
        self.file.close()
    }
}
