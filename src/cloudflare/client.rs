// ABOUTME: reqwest-backed Cloudflare v4 API client.
// ABOUTME: Bearer-token authenticated GET/POST returning the unwrapped envelope result.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};

use super::types::CreateDatabaseRequest;
use super::{Account, ApiError, CloudApi, D1Database, Envelope, Zone};
use crate::credentials::ApiToken;
use crate::types::{AccountId, DatabaseId};

pub const API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare API client.
pub struct CloudflareClient {
    client: Client,
    base_url: String,
    token: ApiToken,
    timeout: Duration,
}

impl CloudflareClient {
    pub fn new(token: ApiToken, timeout: Duration) -> Result<Self, ApiError> {
        Self::with_base_url(API_BASE_URL, token, timeout)
    }

    /// Point the client at another endpoint (a proxy or a local fake).
    pub fn with_base_url(
        base_url: &str,
        token: ApiToken,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hoist/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token.expose()))
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.unwrap_envelope(response).await.map(Some)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token.expose()))
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        self.unwrap_envelope(response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Cloudflare API returned {}", status);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| self.transport(e))?;
        if !envelope.success {
            let messages = envelope
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ApiError::Api(messages));
        }
        envelope.result.ok_or(ApiError::EmptyResult)
    }

    fn transport(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Http(err)
        }
    }
}

#[async_trait]
impl CloudApi for CloudflareClient {
    async fn list_accounts(&self) -> Result<Vec<Account>, ApiError> {
        Ok(self.get("/accounts").await?.unwrap_or_default())
    }

    async fn create_database(
        &self,
        account: &AccountId,
        name: &str,
    ) -> Result<D1Database, ApiError> {
        self.post(
            &format!("/accounts/{account}/d1/database"),
            &CreateDatabaseRequest { name },
        )
        .await
    }

    async fn get_database(
        &self,
        account: &AccountId,
        id: &DatabaseId,
    ) -> Result<Option<D1Database>, ApiError> {
        self.get(&format!("/accounts/{account}/d1/database/{id}")).await
    }

    async fn list_zones(&self) -> Result<Vec<Zone>, ApiError> {
        Ok(self.get("/zones?per_page=50").await?.unwrap_or_default())
    }
}
