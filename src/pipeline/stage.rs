// ABOUTME: The fixed, linear list of deploy stages.
// ABOUTME: Names are what error messages and progress output refer to.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Build,
    GenerateMigrations,
    ProvisionDatabase,
    RenderConfig,
    ApplyMigrations,
    Deploy,
    EnsureSecret,
}

impl Stage {
    /// Execution order. Every deploy walks this list front to back.
    pub const ALL: [Stage; 7] = [
        Stage::Build,
        Stage::GenerateMigrations,
        Stage::ProvisionDatabase,
        Stage::RenderConfig,
        Stage::ApplyMigrations,
        Stage::Deploy,
        Stage::EnsureSecret,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Build => "build",
            Stage::GenerateMigrations => "generate-migrations",
            Stage::ProvisionDatabase => "provision-database",
            Stage::RenderConfig => "render-config",
            Stage::ApplyMigrations => "apply-migrations",
            Stage::Deploy => "deploy",
            Stage::EnsureSecret => "ensure-secret",
        }
    }

    /// Progress line shown while the stage runs.
    pub fn description(&self) -> &'static str {
        match self {
            Stage::Build => "Building frontend",
            Stage::GenerateMigrations => "Generating migrations from schema",
            Stage::ProvisionDatabase => "Ensuring D1 database exists",
            Stage::RenderConfig => "Rendering wrangler config",
            Stage::ApplyMigrations => "Applying migrations to remote database",
            Stage::Deploy => "Deploying worker",
            Stage::EnsureSecret => "Ensuring auth secret is set",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
