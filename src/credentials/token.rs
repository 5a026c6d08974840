// ABOUTME: Opaque Cloudflare API token.
// ABOUTME: Wraps a SecretString so the value never reaches logs or Debug output.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// A Cloudflare API or OAuth token.
#[derive(Clone)]
pub struct ApiToken(SecretString);

impl ApiToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// The raw token, for building an `Authorization` header or child environment.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(<redacted>)")
    }
}
