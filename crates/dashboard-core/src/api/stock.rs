//! ============================================================================
//! Stock Webhook Client
//! ============================================================================
//! Fetches the goods catalog and posts stock usage / opname reports.
//! Usage and opname share one payload shape and differ only in the
//! receiving workflow.
//! ============================================================================

use serde_json::Value;
use tracing::{debug, info};

use super::{
    display_string, endpoint, ensure_success, first_truthy, is_falsy, parse_error,
    parse_float_prefix, send_error,
};
use crate::db::DraftRecord;
use crate::types::{DashboardError, StockItem, StockUsageItem};

const GET_GOODS: &str = "webhook/get-barang";
const SUBMIT_USAGE: &str = "webhook/submit-penggunaan-barang";
const SUBMIT_OPNAME: &str = "webhook/stok-opname";

const NOTHING_FILLED: &str = "Belum ada pemakaian stok yang diisi.";

/// Client for the stock workflows
pub struct StockClient {
    client: reqwest::Client,
    base_url: String,
}

impl StockClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Fetch the goods catalog
    pub async fn fetch_items(&self) -> Result<Vec<StockItem>, DashboardError> {
        info!("Fetching goods catalog");

        let response = self
            .client
            .get(endpoint(&self.base_url, GET_GOODS))
            .send()
            .await
            .map_err(send_error)?;
        let response = ensure_success(response).await?;

        let payload: Value = response.json().await.map_err(parse_error)?;
        let items = map_stock_items(&payload)?;
        debug!("Catalog has {} items", items.len());
        Ok(items)
    }

    /// Post a usage report (a bare array of line items)
    pub async fn submit_usage(&self, items: &[StockUsageItem]) -> Result<(), DashboardError> {
        info!("Submitting stock usage report ({} lines)", items.len());
        self.submit_to(SUBMIT_USAGE, items).await
    }

    /// Post an opname (physical count) report
    pub async fn submit_opname(&self, items: &[StockUsageItem]) -> Result<(), DashboardError> {
        info!("Submitting stock opname report ({} lines)", items.len());
        self.submit_to(SUBMIT_OPNAME, items).await
    }

    async fn submit_to(&self, path: &str, items: &[StockUsageItem]) -> Result<(), DashboardError> {
        let response = self
            .client
            .post(endpoint(&self.base_url, path))
            .json(items)
            .send()
            .await
            .map_err(send_error)?;
        ensure_success(response).await?;
        Ok(())
    }
}

// ============================================================================
// Catalog mapping
// ============================================================================

/// Map raw catalog rows into items, resolving the column aliases the
/// goods workflow has used over time. Rows with no name under any alias
/// are dropped; the index fallback for ids counts unfiltered rows.
pub(crate) fn map_stock_items(payload: &Value) -> Result<Vec<StockItem>, DashboardError> {
    let rows = payload
        .as_array()
        .ok_or_else(|| parse_error("goods payload is not an array"))?;

    Ok(rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let nama_barang = first_truthy(row, &["Barang", "nama_barang", "name"])?;
            Some(StockItem {
                id: row
                    .get("row_number")
                    .filter(|v| !is_falsy(v))
                    .map(display_string)
                    .unwrap_or_else(|| index.to_string()),
                nama_barang,
                satuan: first_truthy(row, &["Satuan Konversi", "satuan"])
                    .unwrap_or_else(|| "pcs".to_string()),
                kategori: Some(
                    first_truthy(row, &["Kategori"]).unwrap_or_else(|| "Umum".to_string()),
                ),
            })
        })
        .collect())
}

// ============================================================================
// Report assembly
// ============================================================================

/// Turn a draft into submission line items. Only rows with a positive
/// quantity count as filled; an all-empty draft is a validation error.
pub fn build_report(
    draft: &DraftRecord,
    catalog: &[StockItem],
    outlet: &str,
    date: &str,
    timestamp: &str,
) -> Result<Vec<StockUsageItem>, DashboardError> {
    let lines: Vec<StockUsageItem> = draft
        .iter()
        .filter_map(|(item_id, entry)| {
            let quantity = parse_float_prefix(&entry.quantity).filter(|q| *q > 0.0)?;
            let item = catalog.iter().find(|i| i.id == *item_id);
            Some(StockUsageItem {
                outlet: outlet.to_string(),
                tanggal: date.to_string(),
                id_barang: item_id.clone(),
                nama_barang: item
                    .map(|i| i.nama_barang.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                jumlah_pakai: quantity,
                satuan: item.map(|i| i.satuan.clone()).unwrap_or_default(),
                keterangan: Some(entry.note.clone()),
                timestamp: timestamp.to_string(),
            })
        })
        .collect();

    if lines.is_empty() {
        return Err(DashboardError::Validation(NOTHING_FILLED.to_string()));
    }
    Ok(lines)
}

// ============================================================================
// Tests
// ============================================================================
