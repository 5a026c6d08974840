// ABOUTME: Init command implementation.
// ABOUTME: Writes the custom domain to .env and creates a hoist.yml template.

use std::path::Path;

use hoist::config::{self, InitOptions};
use hoist::error::Result;
use hoist::output::Output;

pub fn init(project_dir: &Path, options: &InitOptions, output: &Output) -> Result<()> {
    let report = config::init_project(project_dir, options)?;

    output.progress(&format!("Wrote {}", report.env_path.display()));
    match report.config_path {
        Some(ref path) => output.progress(&format!("Created {}", path.display())),
        None => output.progress("Kept existing configuration file"),
    }
    output.success(&format!("Configured custom domain {}", report.domain));
    Ok(())
}
