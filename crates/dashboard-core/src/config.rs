//! ============================================================================
//! Configuration
//! ============================================================================
//! Everything comes from environment variables (loaded from .env by the
//! shells). Missing credentials are kept as None so the gate can fail
//! closed instead of comparing against a default.
//! ============================================================================

use tracing::warn;

use crate::session::ExpiryPolicy;

/// Known URL fallback so a missing env file degrades to the production
/// backend instead of crashing at startup.
pub const DEFAULT_API_BASE_URL: &str = "https://n8n.srv1123014.hstgr.cloud";

/// Outlet roster shown on the selector screen
pub const OUTLETS: &[&str] = &[
    "Pizza Nyantuy Sungai Poso",
    "Pizza Nyantuy Gowa",
    "Pizza Nyantuy Sudiang",
    "Pizza Nyantuy Barombong",
    "Pizza Nyantuy Limbung",
];

pub const MIN_PHOTOS: usize = 1;
pub const MAX_PHOTOS: usize = 1;

/// Runtime configuration for the dashboard
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Base URL of the n8n webhook API
    pub api_base_url: String,
    /// Expected login username (gate fails closed when absent)
    pub login_user: Option<String>,
    /// Expected login password (gate fails closed when absent)
    pub login_pass: Option<String>,
    /// Session expiry policy
    pub expiry_policy: ExpiryPolicy,
    /// Optional override for the state database location
    pub db_path: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let api_base_url = match std::env::var("SPV_API_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            _ => {
                warn!("SPV_API_BASE_URL not set, using default URL");
                DEFAULT_API_BASE_URL.to_string()
            }
        };

        Self {
            api_base_url,
            login_user: env_non_empty("SPV_LOGIN_USER"),
            login_pass: env_non_empty("SPV_LOGIN_PASS"),
            expiry_policy: ExpiryPolicy::from_env(),
            db_path: env_non_empty("SPV_DB_PATH"),
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
