//! ============================================================================
//! Core Types for the SPV Dashboard
//! ============================================================================
//! Views, task records, submission payloads, and the error taxonomy.
//! These types are serialized to JSON for IPC with the TypeScript frontend
//! and for the persisted local state.
//! ============================================================================

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Screen the frontend is currently showing
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppView {
    #[default]
    Login,
    SelectOutlet,
    SelectFeature,
    Checklist,
    Deposit,
    Po,
    Stock,
}

/// Feature chosen on the main menu
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Task,
    Deposit,
    Po,
    Stock,
    Opname,
}

/// Which stock report is being edited (scopes the draft key)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StockMode {
    Usage,
    Opname,
}

impl StockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockMode::Usage => "usage",
            StockMode::Opname => "opname",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "usage" => Some(StockMode::Usage),
            "opname" => Some(StockMode::Opname),
            _ => None,
        }
    }
}

/// Per-task completion lifecycle.
/// Pending covers the optimistic window between the local mark and the
/// webhook acknowledgement; RolledBack means the submission failed and the
/// task no longer counts as done.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Pending,
    Confirmed,
    RolledBack,
}

impl CompletionStatus {
    pub fn counts_as_done(&self) -> bool {
        !matches!(self, CompletionStatus::RolledBack)
    }
}

// ============================================================================
// Task Records
// ============================================================================

/// One checklist row as the task webhook returns it.
/// The sheet behind the webhook is operator-maintained, so only a handful of
/// column names are stable (typos included); everything else, the per-day
/// completion columns in particular, rides in the open map.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    #[serde(rename = "Kategoriugas", default, skip_serializing_if = "Option::is_none")]
    pub kategori_ugas: Option<String>,
    #[serde(rename = "KategoriTugas", default, skip_serializing_if = "Option::is_none")]
    pub kategori_tugas: Option<String>,
    /// Task name column
    #[serde(rename = "Tugas", default, skip_serializing_if = "Option::is_none")]
    pub tugas: Option<String>,
    /// Expected action / instruction column
    #[serde(rename = "Tindakan", default, skip_serializing_if = "Option::is_none")]
    pub tindakan: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TaskRecord {
    /// Category with the raw-id default. Empty strings count as missing.
    pub fn category(&self) -> &str {
        non_empty(&self.kategori_ugas)
            .or_else(|| non_empty(&self.kategori_tugas))
            .unwrap_or("general")
    }

    /// Display category: upper-cased, "LAINNYA" when the row has none.
    pub fn category_label(&self) -> String {
        non_empty(&self.kategori_ugas)
            .or_else(|| non_empty(&self.kategori_tugas))
            .unwrap_or("LAINNYA")
            .to_uppercase()
    }

    pub fn title(&self) -> Option<&str> {
        non_empty(&self.tugas)
    }

    pub fn action(&self) -> Option<&str> {
        non_empty(&self.tindakan)
    }

    /// Stable-ish id: `{category}-{name}` with whitespace runs collapsed to
    /// hyphens and lower-cased. Deterministic only for rows that carry a
    /// name column; nameless rows draw a fresh base36 suffix per call.
    pub fn task_id(&self) -> String {
        let name = match self.title() {
            Some(t) => t.to_string(),
            None => random_task_name(),
        };
        hyphenate(&format!("{}-{}", self.category(), name))
    }
}

fn non_empty(opt: &Option<String>) -> Option<&str> {
    opt.as_deref().filter(|s| !s.is_empty())
}

/// Collapse whitespace runs to single hyphens and lower-case the rest.
fn hyphenate(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('-');
            }
            in_whitespace = true;
        } else {
            out.extend(ch.to_lowercase());
            in_whitespace = false;
        }
    }
    out
}

fn random_task_name() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("task-{}", suffix)
}

// ============================================================================
// Submission Payloads (field names match the n8n workflows)
// ============================================================================

/// Checklist submission for one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSubmission {
    pub outlet: String,
    pub tanggal: String,
    pub kategori: String,
    pub tugas: String,
    /// Base64 photo payloads, data-URL prefix already stripped
    pub foto_base64: Vec<String>,
    pub catatan: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Cash deposit proof for a date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositSubmission {
    pub outlet: String,
    pub tanggal_mulai: String,
    pub tanggal_selesai: String,
    pub bukti_base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jumlah_tunai_periode: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catatan: Option<String>,
    pub timestamp: String,
}

/// Purchase order awaiting arrival confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoItem {
    pub id_transaksi: String,
    pub nama_barang: String,
    pub outlet: String,
    pub jumlah_po: f64,
    pub harga_satuan: f64,
    pub total_harga: f64,
    pub supplier: String,
    #[serde(default)]
    pub id_barang: String,
    #[serde(default)]
    pub satuan: String,
}

/// Arrival confirmation for one purchase order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoConfirmation {
    pub id_transaksi: String,
    pub id_barang: String,
    pub nama_barang: String,
    pub jumlah_po: f64,
    pub jumlah_diterima: f64,
    pub satuan: String,
    pub supplier: String,
    pub outlet: String,
    pub nomor_invoice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keterangan_spv: Option<String>,
    pub tanggal_konfirmasi: String,
}

impl PoConfirmation {
    /// Receiving fewer units than ordered flags the delivery as short.
    pub fn status(&self) -> &'static str {
        if self.jumlah_diterima >= self.jumlah_po {
            "DITERIMA"
        } else {
            "KURANG"
        }
    }
}

/// Photo attachment crossing the multipart boundary
#[derive(Debug, Clone)]
pub struct PhotoFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Catalog item from the goods database webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub id: String,
    pub nama_barang: String,
    pub satuan: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kategori: Option<String>,
}

/// One line of a stock usage / opname report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockUsageItem {
    pub outlet: String,
    pub tanggal: String,
    pub id_barang: String,
    pub nama_barang: String,
    pub jumlah_pakai: f64,
    pub satuan: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keterangan: Option<String>,
    pub timestamp: String,
}

// ============================================================================
// Errors
// ============================================================================

/// Error taxonomy for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum DashboardError {
    #[error("Konfigurasi login belum diatur")]
    ConfigurationMissing,

    #[error("Username atau password salah")]
    InvalidCredentials,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(category: Option<&str>, title: Option<&str>) -> TaskRecord {
        TaskRecord {
            kategori_ugas: category.map(String::from),
            tugas: title.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn task_id_joins_category_and_name() {
        let t = record(Some("Kebersihan"), Some("Cuci Piring"));
        assert_eq!(t.task_id(), "kebersihan-cuci-piring");
    }

    #[test]
    fn task_id_collapses_whitespace_runs() {
        let t = record(Some("Dapur  Utama"), Some("Cek \t Freezer"));
        assert_eq!(t.task_id(), "dapur-utama-cek-freezer");
    }

    #[test]
    fn task_id_falls_back_through_category_aliases() {
        let t = TaskRecord {
            kategori_tugas: Some("Servis".into()),
            tugas: Some("Sapa pelanggan".into()),
            ..Default::default()
        };
        assert_eq!(t.task_id(), "servis-sapa-pelanggan");
    }

    #[test]
    fn empty_category_counts_as_missing() {
        let t = record(Some(""), Some("Tugas X"));
        assert_eq!(t.category(), "general");
        assert_eq!(t.task_id(), "general-tugas-x");
    }

    #[test]
    fn missing_name_gets_random_suffix() {
        let t = record(Some("Umum"), None);
        let id = t.task_id();
        assert!(id.starts_with("umum-task-"), "unexpected id: {}", id);
        // Distinct rows must not collide
        assert_ne!(record(Some("Umum"), None).task_id(), id);
    }

    #[test]
    fn category_label_defaults_to_lainnya() {
        assert_eq!(record(None, Some("x")).category_label(), "LAINNYA");
        assert_eq!(record(Some("dapur"), Some("x")).category_label(), "DAPUR");
    }

    #[test]
    fn task_record_keeps_unknown_columns() {
        let json = serde_json::json!({
            "Kategoriugas": "Dapur",
            "Tugas": "Cek stok",
            "Tanggal 5": "ok",
            "row_number": 3
        });
        let t: TaskRecord = serde_json::from_value(json).unwrap();
        assert_eq!(t.title(), Some("Cek stok"));
        assert_eq!(t.extra.get("Tanggal 5").and_then(|v| v.as_str()), Some("ok"));
        assert_eq!(t.extra.get("row_number").and_then(|v| v.as_i64()), Some(3));
    }

    #[test]
    fn rolled_back_does_not_count_as_done() {
        assert!(CompletionStatus::Pending.counts_as_done());
        assert!(CompletionStatus::Confirmed.counts_as_done());
        assert!(!CompletionStatus::RolledBack.counts_as_done());
    }

    #[test]
    fn po_status_derivation() {
        let mut c = PoConfirmation {
            id_transaksi: "TX-1".into(),
            id_barang: "B-1".into(),
            nama_barang: "Keju".into(),
            jumlah_po: 10.0,
            jumlah_diterima: 10.0,
            satuan: "pcs".into(),
            supplier: "CV Maju".into(),
            outlet: "Pizza Nyantuy Gowa".into(),
            nomor_invoice: "INV-9".into(),
            keterangan_spv: None,
            tanggal_konfirmasi: "2024-05-05".into(),
        };
        assert_eq!(c.status(), "DITERIMA");
        c.jumlah_diterima = 9.0;
        assert_eq!(c.status(), "KURANG");
    }
}
