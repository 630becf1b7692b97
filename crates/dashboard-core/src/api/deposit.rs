//! ============================================================================
//! Deposit Webhook Client
//! ============================================================================
//! Posts cash-deposit proofs and fetches the cash total for a date range.
//! The cash-sum workflow has been reshaped several times on the server
//! side, so the reader copes with every shape it has ever produced:
//! a bare number, `{ "total": n }`, a columnar sheet dump, a flat row
//! list, and plain-text bodies.
//! ============================================================================

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info};

use super::{endpoint, ensure_success, iso_timestamp, parse_error, parse_float_prefix, send_error};
use crate::dates::parse_flexible_date;
use crate::types::{DashboardError, DepositSubmission};

const SUBMIT_DEPOSIT: &str = "webhook/submit-setoran-outlet";
const GET_CASH_SUM: &str = "webhook/setoran-tunai";

const INVALID_RANGE: &str = "Rentang tanggal tidak valid (min 1 hari, max 7 hari).";
const PHOTO_REQUIRED: &str = "Bukti transfer wajib diunggah.";

/// Client for the deposit workflows
pub struct DepositClient {
    client: reqwest::Client,
    base_url: String,
}

impl DepositClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Post a deposit proof
    pub async fn submit_deposit(
        &self,
        submission: &DepositSubmission,
    ) -> Result<(), DashboardError> {
        info!(
            "Submitting deposit proof for '{}' ({} .. {})",
            submission.outlet, submission.tanggal_mulai, submission.tanggal_selesai
        );

        let response = self
            .client
            .post(endpoint(&self.base_url, SUBMIT_DEPOSIT))
            .json(submission)
            .send()
            .await
            .map_err(send_error)?;
        ensure_success(response).await?;

        info!("Deposit proof submitted");
        Ok(())
    }

    /// Sum of recorded cash for an outlet over a date range
    pub async fn fetch_cash_sum(
        &self,
        outlet: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<f64, DashboardError> {
        debug!(
            "Fetching cash sum for '{}' ({} .. {})",
            outlet, start_date, end_date
        );

        let response = self
            .client
            .get(endpoint(&self.base_url, GET_CASH_SUM))
            .query(&[("outlet", outlet), ("start", start_date), ("end", end_date)])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(send_error)?;
        let response = ensure_success(response).await?;

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);

        if is_json {
            let payload: Value = response.json().await.map_err(parse_error)?;
            Ok(coerce_cash_payload(&payload, start_date, end_date))
        } else {
            // Plain-text body, e.g. "Rp 125000"
            let text = response.text().await.map_err(send_error)?;
            let kept: String = text
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
                .collect();
            Ok(parse_float_prefix(&kept).unwrap_or(0.0))
        }
    }
}

// ============================================================================
// Validation and payload assembly
// ============================================================================

/// Check a deposit date range and return its length in days.
/// Valid ranges run from 1 to 7 days inclusive.
pub fn validate_range(start_date: &str, end_date: &str) -> Result<i64, DashboardError> {
    let invalid = || DashboardError::Validation(INVALID_RANGE.to_string());
    let start = parse_flexible_date(start_date).ok_or_else(invalid)?;
    let end = parse_flexible_date(end_date).ok_or_else(invalid)?;
    if end < start {
        return Err(invalid());
    }
    let days = (end - start).num_days() + 1;
    if !(1..=7).contains(&days) {
        return Err(invalid());
    }
    Ok(days)
}

/// Drop a `data:image/...;base64,` prefix if present; anything else is
/// passed through untouched.
pub fn strip_data_url_prefix(photo: &str) -> &str {
    if let Some(rest) = photo.strip_prefix("data:image/") {
        if let Some(idx) = rest.find(";base64,") {
            let subtype = &rest[..idx];
            if !subtype.is_empty()
                && subtype.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return &rest[idx + ";base64,".len()..];
            }
        }
    }
    photo
}

/// Validate the form fields and assemble the submission payload.
/// `cash_total` is attached when known; the caller fetches it beforehand
/// and passes None when the lookup failed.
pub fn prepare_submission(
    outlet: &str,
    start_date: &str,
    end_date: &str,
    photo_data_url: &str,
    cash_total: Option<f64>,
    notes: &str,
) -> Result<DepositSubmission, DashboardError> {
    validate_range(start_date, end_date)?;
    if photo_data_url.is_empty() {
        return Err(DashboardError::Validation(PHOTO_REQUIRED.to_string()));
    }

    Ok(DepositSubmission {
        outlet: outlet.to_string(),
        tanggal_mulai: start_date.to_string(),
        tanggal_selesai: end_date.to_string(),
        bukti_base64: strip_data_url_prefix(photo_data_url).to_string(),
        jumlah_tunai_periode: cash_total,
        catatan: if notes.is_empty() {
            None
        } else {
            Some(notes.to_string())
        },
        timestamp: iso_timestamp(),
    })
}

// ============================================================================
// Cash payload coercion
// ============================================================================

/// Reduce whatever the cash-sum workflow returned to a single number
pub(crate) fn coerce_cash_payload(payload: &Value, start_date: &str, end_date: &str) -> f64 {
    match payload {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Object(map) => match map.get("total") {
            Some(Value::Number(total)) => total.as_f64().unwrap_or(0.0),
            _ => 0.0,
        },
        Value::Array(rows) => sum_rows(rows, start_date, end_date),
        _ => 0.0,
    }
}

fn sum_rows(rows: &[Value], start_date: &str, end_date: &str) -> f64 {
    // Columnar shape first: one record holding parallel date and amount
    // arrays, possibly nested under a "json" wrapper.
    if let Some(first) = rows.first() {
        let obj = match first.get("json") {
            Some(j) if !j.is_string() && !j.is_number() && !j.is_boolean() => j,
            _ => first,
        };
        let dates = obj.get("Tanggal").and_then(Value::as_array);
        let amounts = obj.get("Uang Tunai Yang Ada").and_then(Value::as_array);
        if let (Some(dates), Some(amounts)) = (dates, amounts) {
            if dates.len() == amounts.len() {
                if let (Some(start), Some(end)) =
                    (parse_flexible_date(start_date), parse_flexible_date(end_date))
                {
                    return sum_columnar(dates, amounts, start, end);
                }
            }
        }
    }

    // Flat shape: every record carries its own date and amount columns
    let start = parse_flexible_date(start_date);
    let end = parse_flexible_date(end_date);
    rows.iter()
        .filter(|row| row_in_range(row, start, end))
        .map(row_amount)
        .sum()
}

fn sum_columnar(dates: &[Value], amounts: &[Value], start: NaiveDate, end: NaiveDate) -> f64 {
    let mut sum = 0.0;
    for (date_cell, amount_cell) in dates.iter().zip(amounts) {
        let Some(date) = date_cell.as_str().and_then(parse_flexible_date) else {
            continue;
        };
        if date < start || date > end {
            continue;
        }
        match amount_cell {
            Value::Number(n) => sum += n.as_f64().unwrap_or(0.0),
            Value::String(s) if !s.is_empty() => {
                if let Some(n) = parse_locale_number(s) {
                    sum += n;
                }
            }
            _ => {}
        }
    }
    sum
}

/// A record with no recognizable date column is kept; a record with one
/// is kept only when it parses and falls inside the range.
fn row_in_range(row: &Value, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    let Some(map) = row.as_object() else {
        return true;
    };
    let Some(date_key) = map.keys().find(|k| normalize_ws(k) == "tanggal") else {
        return true;
    };
    let (Some(start), Some(end)) = (start, end) else {
        return false;
    };
    match map
        .get(date_key)
        .and_then(Value::as_str)
        .and_then(parse_flexible_date)
    {
        Some(date) => date >= start && date <= end,
        None => false,
    }
}

fn row_amount(row: &Value) -> f64 {
    let Some(map) = row.as_object() else {
        return 0.0;
    };
    let matched = map
        .keys()
        .find(|k| normalize_ws(k) == "uang tunai yang ada")
        .or_else(|| {
            ["total", "amount", "nominal", "uang"]
                .iter()
                .find_map(|fk| map.get_key_value(*fk).map(|(k, _)| k))
        });
    match matched.and_then(|k| map.get(k)) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => parse_locale_number(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Indonesian-locale amount strings: "Rp 1.234,56" has dot thousands
/// separators and a comma decimal point.
pub(crate) fn parse_locale_number(s: &str) -> Option<f64> {
    let kept: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    let normalized: String = kept
        .chars()
        .filter(|c| *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    parse_float_prefix(&normalized)
}

fn normalize_ws(key: &str) -> String {
    key.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Tests
// ============================================================================
