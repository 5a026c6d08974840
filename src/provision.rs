// ABOUTME: Ensures the app's D1 database exists, creating it at most once.
// ABOUTME: Consults the ledger first and records a new database before returning it.

use crate::cloudflare::{ApiError, CloudApi};
use crate::state::{StateError, StateStore};
use crate::types::{AccountId, AppName, DatabaseId};

/// The database a deploy binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseBinding {
    pub id: DatabaseId,
    pub name: String,
}

/// Result of [`Provisioner::ensure_database`].
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub binding: DatabaseBinding,
    /// Account the database lives in: the configured one, else the one
    /// recorded in the ledger or looked up by this run. `None` only for
    /// ledgers written before the account was recorded.
    pub account: Option<AccountId>,
    /// True when this call issued the create request.
    pub created: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("the Cloudflare credential has access to no accounts")]
    NoAccount,

    #[error("create request for database '{name}' returned no database id")]
    MissingId { name: String },

    #[error(
        "database {id} recorded in {path} no longer exists; remove the databaseId/databaseName entries to provision a new one"
    )]
    StaleState { id: DatabaseId, path: String },
}

/// Creates the app's database on first use and remembers that it did.
pub struct Provisioner<'a> {
    api: &'a dyn CloudApi,
    store: &'a StateStore,
    account: Option<AccountId>,
    verify_cached: bool,
}

impl<'a> Provisioner<'a> {
    pub fn new(api: &'a dyn CloudApi, store: &'a StateStore) -> Self {
        Self {
            api,
            store,
            account: None,
            verify_cached: false,
        }
    }

    /// Use this account instead of the first one the credential can see.
    pub fn account(mut self, account: Option<AccountId>) -> Self {
        self.account = account;
        self
    }

    /// Check that a cached database still exists before trusting it.
    pub fn verify_cached(mut self, verify: bool) -> Self {
        self.verify_cached = verify;
        self
    }

    /// Return the app's database, creating it if the ledger has none.
    ///
    /// With a recorded id (and verification off) this makes no remote calls.
    /// A new database is written to the ledger before this returns, so a
    /// later failure in the deploy cannot lead to a second create.
    pub async fn ensure_database(&self, app: &AppName) -> Result<Provisioned, ProvisionError> {
        let mut state = self.store.load()?;

        if let Some(id) = state.database_id.clone() {
            let name = state
                .database_name
                .clone()
                .unwrap_or_else(|| app.database_name());
            tracing::info!(database = %name, id = %id, "database already provisioned");

            let recorded = self.account.clone().or_else(|| state.account_id.clone());
            let account = if self.verify_cached {
                Some(self.verify(&id, recorded).await?)
            } else {
                recorded
            };

            return Ok(Provisioned {
                binding: DatabaseBinding { id, name },
                account,
                created: false,
            });
        }

        let account = self.resolve_account().await?;
        let name = app.database_name();
        tracing::info!(database = %name, account = %account, "creating D1 database");

        let created = self.api.create_database(&account, &name).await?;
        let id = created
            .uuid
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProvisionError::MissingId { name: name.clone() })?;

        state.record_database(id.clone(), name.clone(), account.clone());
        self.store.save(&state)?;

        Ok(Provisioned {
            binding: DatabaseBinding { id, name },
            account: Some(account),
            created: true,
        })
    }

    /// The configured account, or the first account visible to the credential.
    pub async fn resolve_account(&self) -> Result<AccountId, ProvisionError> {
        if let Some(ref account) = self.account {
            return Ok(account.clone());
        }

        let accounts = self.api.list_accounts().await?;
        let first = accounts.into_iter().next().ok_or(ProvisionError::NoAccount)?;
        tracing::debug!(account = %first.id, name = %first.name, "using first visible account");
        Ok(first.id)
    }

    async fn verify(
        &self,
        id: &DatabaseId,
        known: Option<AccountId>,
    ) -> Result<AccountId, ProvisionError> {
        let account = match known {
            Some(account) => account,
            None => self.resolve_account().await?,
        };
        match self.api.get_database(&account, id).await? {
            Some(_) => Ok(account),
            None => Err(ProvisionError::StaleState {
                id: id.clone(),
                path: self.store.path().display().to_string(),
            }),
        }
    }
}
