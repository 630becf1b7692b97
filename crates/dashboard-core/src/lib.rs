//! ============================================================================
//! DASHBOARD-CORE: SPV Dashboard Backend
//! ============================================================================
//! This crate handles all backend logic for the SPV outlet dashboard:
//! - Credential gate and daily-cutoff session expiry
//! - Persisted view state with rehydration guards (redb)
//! - Checklist completion inference from spreadsheet day columns
//! - n8n webhook clients for tasks, deposits, stock, and purchase orders
//! ============================================================================

pub mod api;
pub mod auth;
pub mod config;
pub mod dates;
pub mod db;
pub mod inference;
pub mod session;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use types::*;
pub use api::{DepositClient, PoClient, StockClient, TaskClient};
pub use auth::CredentialGate;
pub use config::DashboardConfig;
pub use db::StateDb;
pub use session::{AutoLogout, ExpiryPolicy, Session};
pub use store::DashboardStore;
