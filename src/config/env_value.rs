// ABOUTME: Config values that may come from the environment.
// ABOUTME: Looks in the process environment first, then the project's .env file.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::dotenv;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn from_env(var: impl Into<String>) -> Self {
        EnvValue::FromEnv {
            var: var.into(),
            default: None,
        }
    }

    /// Resolve against the process environment only.
    pub fn resolve(&self) -> Result<String> {
        self.resolve_with(&EnvLookup::default())
    }

    pub fn resolve_with(&self, env: &EnvLookup) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => env
                .get(var)
                .or_else(|| default.clone())
                .ok_or_else(|| Error::MissingEnvVar(var.clone())),
        }
    }
}

/// Variable lookup: process environment, then values read from `.env`.
#[derive(Debug, Clone, Default)]
pub struct EnvLookup {
    file: HashMap<String, String>,
}

impl EnvLookup {
    pub fn new(file: HashMap<String, String>) -> Self {
        Self { file }
    }

    /// Read `<project_dir>/.env` if present.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let file = dotenv::read(&project_dir.join(dotenv::DOTENV_FILENAME))?;
        Ok(Self::new(file))
    }

    pub fn get(&self, var: &str) -> Option<String> {
        std::env::var(var)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.file.get(var).cloned())
    }
}
