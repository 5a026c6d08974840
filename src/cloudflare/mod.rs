// ABOUTME: Typed access to the parts of the Cloudflare v4 API the deploy needs.
// ABOUTME: CloudApi is the trait seam; CloudflareClient is the reqwest-backed implementation.

mod client;
mod error;
mod types;

use async_trait::async_trait;

use crate::types::{AccountId, DatabaseId};

pub use client::{API_BASE_URL, CloudflareClient, DEFAULT_API_TIMEOUT};
pub use error::ApiError;
pub use types::{Account, ApiMessage, D1Database, Envelope, Zone};

/// Remote operations used by provisioning and project setup.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// Accounts visible to the credential, in the order the API returns them.
    async fn list_accounts(&self) -> Result<Vec<Account>, ApiError>;

    /// Create a D1 database. The returned record may lack an id; callers check.
    async fn create_database(
        &self,
        account: &AccountId,
        name: &str,
    ) -> Result<D1Database, ApiError>;

    /// Look up a D1 database. `None` when the API reports it does not exist.
    async fn get_database(
        &self,
        account: &AccountId,
        id: &DatabaseId,
    ) -> Result<Option<D1Database>, ApiError>;

    /// Zones (domains) visible to the credential.
    async fn list_zones(&self) -> Result<Vec<Zone>, ApiError>;
}
