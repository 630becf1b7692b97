//! ============================================================================
//! Database Types - Serializable records for redb storage
//! ============================================================================

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::{AppView, CompletionStatus, TaskRecord};

/// The whole UI state, persisted wholesale after every action.
/// `user`/`login_at_ms` mirror the session record; the separately keyed
/// session record stays authoritative for identity on rehydration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ViewState {
    pub view: AppView,
    #[serde(default)]
    pub selected_outlet: String,
    #[serde(default)]
    pub selected_date: String,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub completions: BTreeMap<String, CompletionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_at_ms: Option<i64>,
}

impl ViewState {
    /// Ids that currently count as done (pending or confirmed)
    pub fn completed_ids(&self) -> BTreeSet<String> {
        self.completions
            .iter()
            .filter(|(_, status)| status.counts_as_done())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// (done, total) over the loaded task list
    pub fn progress(&self) -> (usize, usize) {
        let done = self
            .tasks
            .iter()
            .filter(|t| {
                self.completions
                    .get(&t.task_id())
                    .map(|s| s.counts_as_done())
                    .unwrap_or(false)
            })
            .count();
        (done, self.tasks.len())
    }
}

/// One item's draft input on a stock report
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftEntry {
    /// Kept as a string so partial input ("0,", "1.5") survives round-trips
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub note: String,
}

/// Draft inputs keyed by catalog item id
pub type DraftRecord = BTreeMap<String, DraftEntry>;

/// Audit trail entry appended after each accepted deposit submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DepositMeta {
    pub outlet: String,
    pub start_date: String,
    pub end_date: String,
    pub timestamp_ms: i64,
}

/// Summary of everything in the state database (for the inspection CLI)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbStats {
    pub has_state: bool,
    pub view: Option<String>,
    pub selected_outlet: Option<String>,
    pub selected_date: Option<String>,
    pub task_count: usize,
    /// Completion counts keyed by status name
    pub completion_counts: BTreeMap<String, usize>,
    pub has_session: bool,
    pub session_user: Option<String>,
    pub draft_scopes: usize,
    pub deposit_log_entries: usize,
}
