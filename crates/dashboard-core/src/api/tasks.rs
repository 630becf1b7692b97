//! ============================================================================
//! Task Webhook Client
//! ============================================================================
//! Fetches the per-outlet checklist and posts completed-task reports.
//! The task webhook is backed by a spreadsheet, so the response shape
//! drifts: sometimes a bare array, sometimes `{ "data": [...] }`, and a
//! single row arrives as a lone object.
//! ============================================================================

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{endpoint, ensure_success, parse_error, send_error};
use crate::types::{DashboardError, TaskRecord, TaskSubmission};

const GET_TASKS: &str = "webhook/get-task-spv";
const SUBMIT_TASK: &str = "webhook/submit-checklist";

/// Client for the checklist workflows
pub struct TaskClient {
    client: reqwest::Client,
    base_url: String,
}

impl TaskClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Fetch the checklist rows for one outlet
    pub async fn fetch_tasks(&self, outlet: &str) -> Result<Vec<TaskRecord>, DashboardError> {
        info!("Fetching tasks for outlet '{}'", outlet);

        let response = self
            .client
            .get(endpoint(&self.base_url, GET_TASKS))
            .query(&[("outlet", outlet)])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(send_error)?;
        let response = ensure_success(response).await?;

        let payload: Value = response.json().await.map_err(parse_error)?;
        let tasks = normalize_task_payload(payload);
        debug!("Received {} task rows", tasks.len());
        Ok(tasks)
    }

    /// Post a completed-task report
    pub async fn submit_task(&self, submission: &TaskSubmission) -> Result<(), DashboardError> {
        info!(
            "Submitting task '{}' for outlet '{}'",
            submission.tugas, submission.outlet
        );

        let response = self
            .client
            .post(endpoint(&self.base_url, SUBMIT_TASK))
            .json(submission)
            .send()
            .await
            .map_err(send_error)?;
        ensure_success(response).await?;

        info!("Task '{}' submitted", submission.tugas);
        Ok(())
    }
}

/// Flatten the drifting payload shapes into a row list, dropping
/// anything that is not an object.
pub(crate) fn normalize_task_payload(payload: Value) -> Vec<TaskRecord> {
    let rows: Vec<Value> = match payload {
        Value::Array(rows) => rows,
        Value::Object(ref map) => match map.get("data") {
            Some(Value::Array(rows)) => rows.clone(),
            _ => vec![payload],
        },
        _ => Vec::new(),
    };

    rows.into_iter()
        .filter(|row| row.is_object())
        .filter_map(|row| match serde_json::from_value::<TaskRecord>(row) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!("Skipping malformed task row: {}", e);
                None
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_passes_through() {
        let tasks = normalize_task_payload(json!([
            {"Kategoriugas": "Dapur", "Tugas": "Cek stok"},
            {"Kategoriugas": "Servis", "Tugas": "Sapa pelanggan"}
        ]));
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title(), Some("Cek stok"));
    }

    #[test]
    fn data_wrapper_is_unwrapped() {
        let tasks = normalize_task_payload(json!({
            "data": [{"Tugas": "Cuci piring"}]
        }));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title(), Some("Cuci piring"));
    }

    #[test]
    fn single_object_becomes_one_row() {
        let tasks = normalize_task_payload(json!({"Tugas": "Tutup kasir"}));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title(), Some("Tutup kasir"));
    }

    #[test]
    fn non_object_rows_are_dropped() {
        let tasks = normalize_task_payload(json!([
            {"Tugas": "a"},
            "stray string",
            42,
            null,
            {"Tugas": "b"}
        ]));
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn scalar_payloads_yield_nothing() {
        assert!(normalize_task_payload(json!(null)).is_empty());
        assert!(normalize_task_payload(json!("nope")).is_empty());
        assert!(normalize_task_payload(json!(7)).is_empty());
    }

    #[test]
    fn unknown_columns_ride_along() {
        let tasks = normalize_task_payload(json!([
            {"Tugas": "Cek freezer", "Tanggal 5": true, "row_number": 12}
        ]));
        assert_eq!(
            tasks[0].extra.get("Tanggal 5"),
            Some(&serde_json::Value::Bool(true))
        );
    }
}
