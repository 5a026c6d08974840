// ABOUTME: Error types for Cloudflare API calls.
// ABOUTME: Separates transport failures, HTTP status failures, and API-reported errors.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Cloudflare API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cloudflare API request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cloudflare API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Cloudflare API reported failure: {0}")]
    Api(String),

    #[error("Cloudflare API response had no result")]
    EmptyResult,
}
