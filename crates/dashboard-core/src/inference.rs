//! ============================================================================
//! Pre-completion Inference
//! ============================================================================
//! Task rows come from a spreadsheet where finished tasks get a mark in a
//! per-day column ("Tanggal 5", "Tgl 05", "tgl5", ...). On load we infer
//! which tasks are already done today so the checklist does not ask for
//! them again. Column names are operator-typed, hence the fuzzy matching.
//! ============================================================================

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;

use crate::dates::day_of_month;
use crate::types::TaskRecord;

/// How many records to probe when discovering the date column
const PROBE_DEPTH: usize = 5;

/// Acceptable column names for a given day of month: tanggal/tgl, padded
/// and unpadded day, with and without the separating space.
pub fn day_variants(day: u32) -> Vec<String> {
    vec![
        format!("tanggal {}", day),
        format!("tgl {}", day),
        format!("tanggal {:02}", day),
        format!("tgl {:02}", day),
        format!("tanggal{}", day),
        format!("tgl{}", day),
        format!("tanggal{:02}", day),
        format!("tgl{:02}", day),
    ]
}

/// Lowercase, collapse every run of non-alphanumerics into one space, trim.
pub fn normalize_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for ch in s.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out
}

/// A cell counts as "done" for a non-empty trimmed string, a non-zero
/// number, or `true`. Everything else (null, false, zero, whitespace,
/// arrays, objects) does not.
pub fn value_indicates_done(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::Bool(b) => *b,
        _ => false,
    }
}

/// Infer already-completed task ids for the selected date.
/// The date column is discovered by probing the first few records; records
/// that lack the discovered column fall back to scanning their own keys,
/// since each row may carry the column under a differently mangled name.
pub fn infer_completed(tasks: &[TaskRecord], date: &str) -> BTreeSet<String> {
    let mut completed = BTreeSet::new();

    let day = match day_of_month(date) {
        Some(d) => d,
        None => return completed,
    };
    let variants = day_variants(day);

    let mut date_column: Option<String> = None;
    'probe: for task in tasks.iter().take(PROBE_DEPTH) {
        for key in task.extra.keys() {
            if variants.iter().any(|v| v == &normalize_key(key)) {
                date_column = Some(key.clone());
                break 'probe;
            }
        }
    }
    if let Some(column) = &date_column {
        debug!("Date column discovered: '{}'", column);
    }

    for task in tasks {
        let matched = match date_column.as_ref().and_then(|k| task.extra.get(k)) {
            Some(value) => value_indicates_done(value),
            None => task.extra.iter().any(|(key, value)| {
                variants.iter().any(|v| v == &normalize_key(key)) && value_indicates_done(value)
            }),
        };
        if matched {
            completed.insert(task.task_id());
        }
    }

    completed
}

// ============================================================================
// Tests
// ============================================================================
