// ABOUTME: Persistent idempotency ledger for deploy side effects.
// ABOUTME: A flat JSON record of which one-time steps have already been performed.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{AccountId, DatabaseId};

/// Directory under the infra directory holding hoist's local files.
pub const STATE_DIR: &str = ".hoist";
pub const STATE_FILENAME: &str = "state.json";

/// The ledger record.
///
/// This caches "have I already done this"; it is not a source of truth
/// about what exists remotely. Fields this version does not know about are
/// kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_id: Option<DatabaseId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,

    /// Account the database lives in. Later runs hand it to the deploy CLI
    /// so it never has to pick between accounts itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub auth_secret_set: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl DeployState {
    /// Record the provisioned database. An already recorded id is kept.
    pub fn record_database(
        &mut self,
        id: DatabaseId,
        name: impl Into<String>,
        account: AccountId,
    ) {
        if self.database_id.is_some() {
            tracing::warn!("database already recorded in state, keeping existing id");
            return;
        }
        self.database_id = Some(id);
        self.database_name = Some(name.into());
        self.account_id = Some(account);
    }

    pub fn mark_secret_set(&mut self) {
        self.auth_secret_set = true;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to access state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is not a valid ledger: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads and writes the ledger file. Performs no locking.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store for a project's infra directory: `<infra>/.hoist/state.json`.
    pub fn for_infra_dir(infra_dir: &Path) -> Self {
        Self::new(infra_dir.join(STATE_DIR).join(STATE_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the ledger, creating an empty one first if the file is missing.
    pub fn load(&self) -> Result<DeployState, StateError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "creating empty state file");
            self.save(&DeployState::default())?;
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| self.io(source))?;
        serde_json::from_str(&content).map_err(|source| StateError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the ledger with `state`.
    ///
    /// Writes to a sibling temp file and renames it into place, so readers
    /// see either the old record or the new one.
    pub fn save(&self, state: &DeployState) -> Result<(), StateError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir).map_err(|source| self.io(source))?;

        let json = serde_json::to_string_pretty(state).map_err(|source| StateError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|source| self.io(source))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.write_all(b"\n"))
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|source| self.io(source))?;
        tmp.persist(&self.path)
            .map_err(|e| self.io(e.error))?;

        tracing::debug!(path = %self.path.display(), "state saved");
        Ok(())
    }

    fn io(&self, source: std::io::Error) -> StateError {
        StateError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
