// ABOUTME: Library root for hoist - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod cloudflare;
pub mod config;
pub mod credentials;
pub mod diagnostics;
pub mod error;
pub mod lock;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod provision;
pub mod render;
pub mod secret;
pub mod state;
pub mod types;
