// ABOUTME: Validated custom domain the Worker is routed on.
// ABOUTME: Accepts bare hostnames only (no scheme, path, or port).

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CustomDomainError {
    #[error("domain cannot be empty")]
    Empty,

    #[error("domain must be a bare hostname, got '{0}'")]
    NotBareHost(String),

    #[error("invalid domain label in '{0}'")]
    InvalidLabel(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomDomain(String);

impl CustomDomain {
    pub fn new(value: &str) -> Result<Self, CustomDomainError> {
        let value = value.trim().trim_end_matches('.').to_ascii_lowercase();
        if value.is_empty() {
            return Err(CustomDomainError::Empty);
        }

        if value.contains("://") || value.contains('/') || value.contains(':') {
            return Err(CustomDomainError::NotBareHost(value));
        }

        let valid = value.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
        if !valid {
            return Err(CustomDomainError::InvalidLabel(value));
        }

        Ok(Self(value))
    }

    /// Join an optional subdomain onto a zone name.
    pub fn with_subdomain(zone: &str, subdomain: Option<&str>) -> Result<Self, CustomDomainError> {
        match subdomain.map(str::trim).filter(|s| !s.is_empty()) {
            Some(sub) => Self::new(&format!("{sub}.{zone}")),
            None => Self::new(zone),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn url(&self) -> String {
        format!("https://{}", self.0)
    }
}

impl fmt::Display for CustomDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
