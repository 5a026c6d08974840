// ABOUTME: In-memory CloudApi that counts calls.
// ABOUTME: Lets tests assert on how many remote requests an operation made.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use hoist::cloudflare::{Account, ApiError, CloudApi, D1Database, Zone};
use hoist::types::{AccountId, DatabaseId, ZoneId};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApiCalls {
    pub list_accounts: usize,
    pub create_database: usize,
    pub get_database: usize,
    pub list_zones: usize,
}

pub struct FakeApi {
    accounts: Vec<Account>,
    /// Id handed out by the next create; `None` simulates a response without one.
    next_id: Mutex<Option<String>>,
    /// HTTP status every create request fails with.
    create_status: Option<u16>,
    existing: Mutex<HashSet<String>>,
    created: Mutex<Vec<(AccountId, String)>>,
    calls: Mutex<ApiCalls>,
}

impl FakeApi {
    /// One account, and creates return `db-1`.
    pub fn new() -> Self {
        Self::with_accounts(vec![account("acct-1", "Primary")])
    }

    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        Self {
            accounts,
            next_id: Mutex::new(Some("db-1".to_string())),
            create_status: None,
            existing: Mutex::new(HashSet::new()),
            created: Mutex::new(Vec::new()),
            calls: Mutex::new(ApiCalls::default()),
        }
    }

    /// Make the next create return a record without an id.
    pub fn without_ids(self) -> Self {
        *self.next_id.lock() = None;
        self
    }

    /// Make every create request fail with HTTP `status`.
    pub fn failing_creates(mut self, status: u16) -> Self {
        self.create_status = Some(status);
        self
    }

    /// Register a database that `get_database` will find.
    pub fn with_existing(self, id: &str) -> Self {
        self.existing.lock().insert(id.to_string());
        self
    }

    pub fn calls(&self) -> ApiCalls {
        *self.calls.lock()
    }

    /// (account, name) for every create request.
    pub fn created(&self) -> Vec<(AccountId, String)> {
        self.created.lock().clone()
    }
}

pub fn account(id: &str, name: &str) -> Account {
    Account {
        id: AccountId::new(id),
        name: name.to_string(),
    }
}

#[async_trait]
impl CloudApi for FakeApi {
    async fn list_accounts(&self) -> Result<Vec<Account>, ApiError> {
        self.calls.lock().list_accounts += 1;
        Ok(self.accounts.clone())
    }

    async fn create_database(
        &self,
        account: &AccountId,
        name: &str,
    ) -> Result<D1Database, ApiError> {
        self.calls.lock().create_database += 1;
        self.created.lock().push((account.clone(), name.to_string()));

        if let Some(status) = self.create_status {
            return Err(ApiError::Status {
                status,
                body: r#"{"success":false,"errors":[{"code":7500,"message":"internal error"}]}"#
                    .to_string(),
            });
        }

        let uuid = self.next_id.lock().clone();
        if let Some(ref id) = uuid {
            self.existing.lock().insert(id.clone());
        }
        Ok(D1Database {
            uuid: uuid.map(DatabaseId::new),
            name: name.to_string(),
        })
    }

    async fn get_database(
        &self,
        _account: &AccountId,
        id: &DatabaseId,
    ) -> Result<Option<D1Database>, ApiError> {
        self.calls.lock().get_database += 1;
        Ok(self
            .existing
            .lock()
            .contains(id.as_str())
            .then(|| D1Database {
                uuid: Some(id.clone()),
                name: String::new(),
            }))
    }

    async fn list_zones(&self) -> Result<Vec<Zone>, ApiError> {
        self.calls.lock().list_zones += 1;
        Ok(vec![Zone {
            id: ZoneId::new("zone-1"),
            name: "example.com".to_string(),
            status: Some("active".to_string()),
        }])
    }
}
