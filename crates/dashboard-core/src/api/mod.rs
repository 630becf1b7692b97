//! ============================================================================
//! Webhook API Clients
//! ============================================================================
//! One client per n8n workflow family:
//! - tasks: checklist rows and submissions
//! - deposit: cash deposit proofs and the cash-sum lookup
//! - stock: goods catalog, usage and opname reports
//! - po: purchase order list and arrival confirmations
//!
//! All clients share the same non-2xx contract: the response body (or the
//! status reason when the body is empty) is surfaced verbatim so the
//! frontend can show exactly what the server said.
//! ============================================================================

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::types::DashboardError;

pub mod deposit;
pub mod po;
pub mod stock;
pub mod tasks;

pub use deposit::DepositClient;
pub use po::PoClient;
pub use stock::StockClient;
pub use tasks::TaskClient;

/// Join the configured base URL with a webhook path, tolerating stray
/// slashes on either side.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Map a non-2xx response into the shared error shape, pulling the body
/// text for the message. `Server Error (500): something broke`
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, DashboardError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("Unknown Error").to_string()
    } else {
        body
    };
    Err(DashboardError::Network(format!(
        "Server Error ({}): {}",
        status.as_u16(),
        detail
    )))
}

pub(crate) fn send_error(e: reqwest::Error) -> DashboardError {
    DashboardError::Network(e.to_string())
}

pub(crate) fn parse_error(e: impl std::fmt::Display) -> DashboardError {
    DashboardError::Parse(e.to_string())
}

/// Longest-numeric-prefix float parse: sign, digits, one decimal point.
/// `"12.5kg"` is 12.5, `"1.2.3"` is 1.2, a string with no leading number
/// is None.
pub(crate) fn parse_float_prefix(s: &str) -> Option<f64> {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let mut seen_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return None;
    }
    t[..end].parse::<f64>().ok()
}

/// Submission timestamp in the ISO-8601 shape the workflows expect
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Loose-field helpers
// ============================================================================
// The sheet-backed workflows return rows whose columns drift between
// spreadsheet headers and snake_case names, with empty cells showing up
// as "", 0, or null depending on the export. These helpers resolve the
// alias chains.

/// First listed key holding a non-empty, non-zero value, as a string
pub(crate) fn first_truthy(row: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find(|v| !is_falsy(v))
        .map(display_string)
}

pub(crate) fn is_falsy(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(true),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

pub(crate) fn display_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================
