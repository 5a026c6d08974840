// ABOUTME: Validated app name, used as the Worker script name and D1 database prefix.
// ABOUTME: Both names share Cloudflare's 63-char lowercase/digit/hyphen rule.

use std::fmt;
use thiserror::Error;

/// Longest Worker script (and D1 database) name Cloudflare accepts.
pub const MAX_WORKER_NAME_LEN: usize = 63;

const DATABASE_SUFFIX: &str = "-db";

/// Longest app name whose derived `<app>-db` database name still fits.
pub const MAX_APP_NAME_LEN: usize = MAX_WORKER_NAME_LEN - DATABASE_SUFFIX.len();

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppNameError {
    #[error("app name cannot be empty")]
    Empty,

    #[error(
        "app name '{name}' is {len} characters; at most {max} fit alongside the '-db' database suffix"
    )]
    TooLong { name: String, len: usize, max: usize },

    #[error("app name '{0}' must start and end with a letter or digit")]
    HyphenAtEdge(String),

    #[error(
        "app name '{name}' has '{ch}' at position {index}; only lowercase letters, digits and hyphens are allowed"
    )]
    InvalidChar { name: String, ch: char, index: usize },
}

/// A Worker script name. The D1 database is named after it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppName(String);

impl AppName {
    pub fn new(value: &str) -> Result<Self, AppNameError> {
        if value.is_empty() {
            return Err(AppNameError::Empty);
        }

        if let Some((index, ch)) = value
            .char_indices()
            .find(|&(_, c)| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'))
        {
            return Err(AppNameError::InvalidChar {
                name: value.to_string(),
                ch,
                index,
            });
        }

        if value.starts_with('-') || value.ends_with('-') {
            return Err(AppNameError::HyphenAtEdge(value.to_string()));
        }

        // ASCII only past this point, so bytes == chars.
        if value.len() > MAX_APP_NAME_LEN {
            return Err(AppNameError::TooLong {
                name: value.to_string(),
                len: value.len(),
                max: MAX_APP_NAME_LEN,
            });
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the D1 database provisioned for this app.
    ///
    /// Deterministic so that every checkout of the same app asks for the
    /// same database.
    pub fn database_name(&self) -> String {
        format!("{}{DATABASE_SUFFIX}", self.0)
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_worker_names() {
        for name in ["demo", "bun-starter", "app2", "a", "my-app-v2"] {
            assert_eq!(AppName::new(name).unwrap().as_str(), name);
        }
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(AppName::new(""), Err(AppNameError::Empty));
    }

    #[test]
    fn uppercase_and_punctuation_report_position() {
        assert_eq!(
            AppName::new("My-app"),
            Err(AppNameError::InvalidChar {
                name: "My-app".to_string(),
                ch: 'M',
                index: 0,
            })
        );

        let err = AppName::new("my_app").unwrap_err();
        assert!(matches!(err, AppNameError::InvalidChar { ch: '_', index: 2, .. }));
        assert!(err.to_string().contains("position 2"));

        assert!(matches!(
            AppName::new("café"),
            Err(AppNameError::InvalidChar { ch: 'é', .. })
        ));
    }

    #[test]
    fn leading_or_trailing_hyphen_is_rejected() {
        assert!(matches!(AppName::new("-app"), Err(AppNameError::HyphenAtEdge(_))));
        assert!(matches!(AppName::new("app-"), Err(AppNameError::HyphenAtEdge(_))));
        assert!(matches!(AppName::new("-"), Err(AppNameError::HyphenAtEdge(_))));
    }

    #[test]
    fn length_leaves_room_for_database_suffix() {
        let longest = "a".repeat(MAX_APP_NAME_LEN);
        let app = AppName::new(&longest).unwrap();
        assert_eq!(app.database_name().len(), MAX_WORKER_NAME_LEN);

        let too_long = "a".repeat(MAX_APP_NAME_LEN + 1);
        let err = AppName::new(&too_long).unwrap_err();
        assert_eq!(
            err,
            AppNameError::TooLong {
                name: too_long,
                len: MAX_APP_NAME_LEN + 1,
                max: MAX_APP_NAME_LEN,
            }
        );
        assert!(err.to_string().contains("-db"));
    }

    #[test]
    fn database_name_appends_suffix() {
        let app = AppName::new("bun-starter").unwrap();
        assert_eq!(app.database_name(), "bun-starter-db");
        assert_eq!(app.to_string(), "bun-starter");
    }
}
