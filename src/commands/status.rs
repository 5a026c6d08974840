// ABOUTME: Status command implementation.
// ABOUTME: Prints the project's configuration and what the ledger records, without calling out.

use std::path::Path;

use hoist::config::{Config, EnvLookup};
use hoist::error::Result;
use hoist::output::Output;
use hoist::state::StateStore;

pub fn status(config: &Config, project_dir: &Path, output: &Output) -> Result<()> {
    let env = EnvLookup::load(project_dir)?;
    let domain = config
        .domain
        .resolve_with(&env)
        .unwrap_or_else(|_| "(not configured)".to_string());

    output.data(&format!("App:      {}", config.app));
    output.data(&format!("Domain:   {domain}"));

    let store = StateStore::for_infra_dir(&project_dir.join(&config.infra_dir));
    output.data(&format!("Ledger:   {}", store.path().display()));

    // Loading creates a missing ledger; status stays read-only.
    if !store.exists() {
        output.success("Not deployed yet");
        return Ok(());
    }

    let state = store.load()?;
    match (&state.database_id, &state.database_name) {
        (Some(id), Some(name)) => output.data(&format!("Database: {name} ({id})")),
        (Some(id), None) => output.data(&format!("Database: {id}")),
        _ => output.data("Database: not provisioned"),
    }
    output.data(&format!(
        "Secret:   {}",
        if state.auth_secret_set { "set" } else { "not set" }
    ));
    output.success("Status read from ledger");
    Ok(())
}
