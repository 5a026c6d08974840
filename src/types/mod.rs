// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Phantom-typed remote ids plus validated app names and domains.

mod app_name;
mod domain;
mod id;

pub use app_name::{AppName, AppNameError, MAX_APP_NAME_LEN, MAX_WORKER_NAME_LEN};
pub use domain::{CustomDomain, CustomDomainError};
pub use id::{AccountId, DatabaseId, ZoneId};
