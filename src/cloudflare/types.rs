// ABOUTME: Wire types for Cloudflare v4 API responses.
// ABOUTME: Every response is wrapped in the same success/errors/result envelope.

use serde::{Deserialize, Serialize};

use crate::types::{AccountId, DatabaseId, ZoneId};

/// Standard v4 response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    #[serde(default = "Option::default")]
    pub result: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: AccountId,
    #[serde(default)]
    pub name: String,
}

/// A D1 database as returned by create/get.
///
/// `uuid` is optional on purpose: a create response without one is a
/// provisioning failure the caller must detect.
#[derive(Debug, Clone, Deserialize)]
pub struct D1Database {
    #[serde(default)]
    pub uuid: Option<DatabaseId>,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateDatabaseRequest<'a> {
    pub name: &'a str,
}
