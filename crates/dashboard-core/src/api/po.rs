//! ============================================================================
//! Purchase Order Webhook Client
//! ============================================================================
//! Lists purchase orders awaiting arrival confirmation and posts the
//! confirmation with its photo evidence. The list webhook returns every
//! order; only rows already approved by finance ("terima") whose SPV
//! verification is still explicitly false are shown to the supervisor.
//! ============================================================================

use serde_json::Value;
use tracing::{debug, info};

use super::{display_string, endpoint, ensure_success, first_truthy, parse_error, send_error};
use crate::types::{DashboardError, PhotoFile, PoConfirmation, PoItem};

const GET_PO_LIST: &str = "webhook/list-permintaan-po";
const CONFIRM_PO: &str = "webhook/spv-konfirmasi-po-tiba";

/// Client for the purchase order workflows
pub struct PoClient {
    client: reqwest::Client,
    base_url: String,
}

impl PoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Fetch the purchase orders awaiting confirmation
    pub async fn fetch_po_list(&self) -> Result<Vec<PoItem>, DashboardError> {
        info!("Fetching purchase order list");

        let response = self
            .client
            .get(endpoint(&self.base_url, GET_PO_LIST))
            .send()
            .await
            .map_err(send_error)?;
        let response = ensure_success(response).await?;

        let payload: Value = response.json().await.map_err(parse_error)?;
        let items = normalize_po_list(&payload);
        debug!("{} purchase orders awaiting confirmation", items.len());
        Ok(items)
    }

    /// Post an arrival confirmation as a multipart form, attaching the
    /// invoice and goods photos when provided.
    pub async fn confirm_po(
        &self,
        confirmation: &PoConfirmation,
        invoice_photo: Option<&PhotoFile>,
        goods_photo: Option<&PhotoFile>,
    ) -> Result<(), DashboardError> {
        info!(
            "Confirming PO '{}' as {}",
            confirmation.id_transaksi,
            confirmation.status()
        );

        let mut form = reqwest::multipart::Form::new()
            .text("id_transaksi", confirmation.id_transaksi.clone())
            .text("nama_barang", confirmation.nama_barang.clone())
            .text("jumlah_po", confirmation.jumlah_po.to_string())
            .text("jumlah_diterima", confirmation.jumlah_diterima.to_string())
            .text("satuan", confirmation.satuan.clone())
            .text("supplier", confirmation.supplier.clone())
            .text("id_barang", confirmation.id_barang.clone())
            .text("outlet", confirmation.outlet.clone())
            .text("nomor_invoice", confirmation.nomor_invoice.clone())
            .text("tanggal_konfirmasi", confirmation.tanggal_konfirmasi.clone())
            .text("status", confirmation.status());
        if let Some(photo) = invoice_photo {
            form = form.part("foto_nota", photo_part(photo)?);
        }
        if let Some(photo) = goods_photo {
            form = form.part("foto_barang", photo_part(photo)?);
        }

        let response = self
            .client
            .post(endpoint(&self.base_url, CONFIRM_PO))
            .multipart(form)
            .send()
            .await
            .map_err(send_error)?;
        ensure_success(response).await?;

        info!("PO '{}' confirmed", confirmation.id_transaksi);
        Ok(())
    }
}

fn photo_part(photo: &PhotoFile) -> Result<reqwest::multipart::Part, DashboardError> {
    reqwest::multipart::Part::bytes(photo.bytes.clone())
        .file_name(photo.file_name.clone())
        .mime_str(&photo.mime)
        .map_err(|e| DashboardError::Validation(format!("Invalid photo mime type: {}", e)))
}

// ============================================================================
// List normalization
// ============================================================================

/// Filter to rows awaiting SPV confirmation and resolve the column
/// aliases the PO workflow has used over time.
pub(crate) fn normalize_po_list(payload: &Value) -> Vec<PoItem> {
    let rows: &[Value] = match payload {
        Value::Array(rows) => rows,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(rows)) => rows,
            _ => &[],
        },
        _ => &[],
    };

    rows.iter()
        .filter(|row| awaiting_confirmation(row))
        .map(map_po_row)
        .collect()
}

/// Finance must have approved the order, and the SPV flag must be an
/// explicit false (`false`, `"false"`, `0`, `"0"`). An absent or empty
/// flag does not count: those rows were never released for confirmation.
fn awaiting_confirmation(row: &Value) -> bool {
    let finance_ok = matches!(
        row.get("VerifikasiFinance"),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("terima")
    );
    let spv = match row.get("VerifikasiSPV") {
        Some(Value::Null) | None => row.get("VerifSPV"),
        some => some,
    };
    let spv_false = match spv {
        Some(Value::Bool(b)) => !*b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("false") || s == "0",
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        _ => false,
    };
    finance_ok && spv_false
}

fn map_po_row(row: &Value) -> PoItem {
    PoItem {
        id_transaksi: first_truthy(row, &["ID TRANSAKSI", "id_transaksi"]).unwrap_or_default(),
        nama_barang: first_truthy(row, &["NAMA BARANG", "nama_barang"]).unwrap_or_default(),
        outlet: first_truthy(row, &["outlet"]).unwrap_or_default(),
        jumlah_po: first_present_number(row, &["JUMLAH", "jumlah_po"]),
        harga_satuan: first_present_number(row, &["HARGA", "harga_satuan"]),
        total_harga: first_present_number(row, &["TOTAL HARGA", "total_harga"]),
        supplier: first_present_string(row, &["NAMA SUPLIER", "supplier"]),
        id_barang: first_present_string(row, &["ID BARANG", "id_barang"]),
        satuan: first_present_string(row, &["SATUAN", "satuan"]),
    }
}

/// First listed key that is present and non-null, as a string.
/// Unlike `first_truthy`, "" and 0 are taken as-is.
fn first_present_string(row: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find(|v| !v.is_null())
        .map(display_string)
        .unwrap_or_default()
}

fn first_present_number(row: &Value, keys: &[&str]) -> f64 {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find(|v| !v.is_null())
        .map(number_of)
        .unwrap_or(0.0)
}

fn number_of(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                0.0
            } else {
                t.parse().unwrap_or(0.0)
            }
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(finance: Value, spv: Value) -> Value {
        json!({
            "VerifikasiFinance": finance,
            "VerifikasiSPV": spv,
            "ID TRANSAKSI": "TX-1",
            "NAMA BARANG": "Keju",
            "outlet": "Pizza Nyantuy Gowa",
            "JUMLAH": 10,
            "HARGA": 50000,
            "TOTAL HARGA": 500000,
            "NAMA SUPLIER": "CV Maju",
            "ID BARANG": "B-1",
            "SATUAN": "pack"
        })
    }

    #[test]
    fn approved_and_unverified_rows_are_kept() {
        for spv in [json!(false), json!("false"), json!("FALSE"), json!(0), json!("0")] {
            let list = normalize_po_list(&json!([row(json!("terima"), spv.clone())]));
            assert_eq!(list.len(), 1, "expected keep for spv={}", spv);
        }
    }

    #[test]
    fn finance_approval_is_case_insensitive() {
        let list = normalize_po_list(&json!([row(json!("TERIMA"), json!(false))]));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn unapproved_rows_are_dropped() {
        for finance in [json!("tolak"), json!(""), json!(1), json!(null)] {
            let list = normalize_po_list(&json!([row(finance.clone(), json!(false))]));
            assert!(list.is_empty(), "expected drop for finance={}", finance);
        }
    }

    #[test]
    fn already_verified_or_unreleased_rows_are_dropped() {
        for spv in [json!(true), json!("true"), json!(1), json!(""), json!(null)] {
            let list = normalize_po_list(&json!([row(json!("terima"), spv.clone())]));
            assert!(list.is_empty(), "expected drop for spv={}", spv);
        }
        // Missing flag altogether
        let mut bare = row(json!("terima"), json!(null));
        bare.as_object_mut().unwrap().remove("VerifikasiSPV");
        assert!(normalize_po_list(&json!([bare])).is_empty());
    }

    #[test]
    fn null_spv_flag_falls_back_to_the_short_alias() {
        let mut r = row(json!("terima"), json!(null));
        r.as_object_mut().unwrap().insert("VerifSPV".into(), json!("false"));
        assert_eq!(normalize_po_list(&json!([r])).len(), 1);
    }

    #[test]
    fn explicit_false_beats_the_short_alias() {
        let mut r = row(json!("terima"), json!(false));
        r.as_object_mut().unwrap().insert("VerifSPV".into(), json!(true));
        assert_eq!(normalize_po_list(&json!([r])).len(), 1);
    }

    #[test]
    fn sheet_columns_are_mapped() {
        let list = normalize_po_list(&json!([row(json!("terima"), json!(false))]));
        let item = &list[0];
        assert_eq!(item.id_transaksi, "TX-1");
        assert_eq!(item.nama_barang, "Keju");
        assert_eq!(item.outlet, "Pizza Nyantuy Gowa");
        assert_eq!(item.jumlah_po, 10.0);
        assert_eq!(item.harga_satuan, 50000.0);
        assert_eq!(item.total_harga, 500000.0);
        assert_eq!(item.supplier, "CV Maju");
        assert_eq!(item.id_barang, "B-1");
        assert_eq!(item.satuan, "pack");
    }

    #[test]
    fn snake_case_aliases_are_mapped() {
        let list = normalize_po_list(&json!([{
            "VerifikasiFinance": "terima",
            "VerifikasiSPV": "false",
            "id_transaksi": "TX-2",
            "nama_barang": "Saus",
            "jumlah_po": "7",
            "supplier": "UD Sanjaya"
        }]));
        let item = &list[0];
        assert_eq!(item.id_transaksi, "TX-2");
        assert_eq!(item.jumlah_po, 7.0);
        assert_eq!(item.supplier, "UD Sanjaya");
        assert_eq!(item.satuan, "");
    }

    #[test]
    fn data_wrapper_is_unwrapped() {
        let list = normalize_po_list(&json!({
            "data": [row(json!("terima"), json!(false))]
        }));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn scalar_payloads_yield_nothing() {
        assert!(normalize_po_list(&json!(null)).is_empty());
        assert!(normalize_po_list(&json!("x")).is_empty());
        assert!(normalize_po_list(&json!({"rows": []})).is_empty());
    }
}
