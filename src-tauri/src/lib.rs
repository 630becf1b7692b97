//! ============================================================================
//! SPV Dashboard :: Tauri Backend (Async-First)
//! ============================================================================
//! Non-blocking IPC commands using tokio::spawn for all webhook calls.
//! Ensures the webview never stalls waiting on the n8n backend; every
//! command returns an AsyncResult envelope instead of a rejected promise.
//!
//! Pattern: Clone Arc -> tokio::spawn -> JoinHandle -> await result
//! ============================================================================

use dashboard_core::api::{self, deposit, stock};
use dashboard_core::config::OUTLETS;
use dashboard_core::dates::today_jakarta;
use dashboard_core::db::{DepositMeta, DraftRecord};
use dashboard_core::session::now_ms;
use dashboard_core::store::StoreSnapshot;
use dashboard_core::{
    AutoLogout, CredentialGate, DashboardConfig, DashboardError, DashboardStore, DepositClient,
    Feature, PhotoFile, PoClient, PoConfirmation, PoItem, StateDb, StockClient, StockItem,
    StockMode, TaskClient, TaskSubmission,
};

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tauri::{AppHandle, Emitter, State};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

// ============================================================================
// Application State (Thread-Safe)
// ============================================================================

/// Shared application state - the store and timer sit behind Arc<RwLock<T>>
/// for safe concurrent access from multiple tokio tasks; the webhook clients
/// are immutable and shared via plain Arc.
pub struct AppState {
    pub store: Arc<RwLock<DashboardStore>>,
    pub db: Arc<StateDb>,
    pub gate: CredentialGate,
    // Webhook clients, one per workflow family
    pub task_client: Arc<TaskClient>,
    pub deposit_client: Arc<DepositClient>,
    pub stock_client: Arc<StockClient>,
    pub po_client: Arc<PoClient>,
    /// Goods catalog from the last fetch, reused when building stock reports
    pub stock_catalog: Arc<RwLock<Vec<StockItem>>>,
    pub auto_logout: Arc<RwLock<AutoLogout>>,
    /// Generation counter for cash-sum lookups; late responses lose
    pub cash_generation: AtomicU64,
    pub config: DashboardConfig,
}

// ============================================================================
// Async Task Result Type
// ============================================================================

/// Wrapper for async task results to handle spawn errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> AsyncResult<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }
}

// ============================================================================
// IPC Payload Types
// ============================================================================

/// Cash-sum lookup result; `superseded` marks a response that lost the race
/// to a newer lookup and must not be applied to the form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashSumResponse {
    pub total: f64,
    pub superseded: bool,
}

/// Session record as shown on the header badge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user: Option<String>,
    pub login_at_ms: Option<i64>,
    pub expires_at_ms: Option<i64>,
    pub valid: bool,
    pub policy: String,
}

/// Photo attachment as the frontend sends it: base64 body plus metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoPayload {
    pub file_name: String,
    pub base64: String,
    pub mime: String,
}

fn decode_photo(payload: &PhotoPayload) -> Result<PhotoFile, String> {
    let body = deposit::strip_data_url_prefix(&payload.base64);
    match STANDARD.decode(body) {
        Ok(bytes) => Ok(PhotoFile {
            file_name: payload.file_name.clone(),
            bytes,
            mime: payload.mime.clone(),
        }),
        Err(e) => Err(format!("Invalid photo encoding: {}", e)),
    }
}

// ============================================================================
// Session Expiry Timer
// ============================================================================

/// Arm the one-shot logout timer. When it fires, the store is logged out on
/// a fresh task and the frontend is told to drop to the login screen.
fn schedule_auto_logout(
    timer: &mut AutoLogout,
    store: Arc<RwLock<DashboardStore>>,
    app: AppHandle,
    expires_at: DateTime<Local>,
) {
    timer.arm(expires_at, move || {
        info!("Session expired, logging out");
        tokio::spawn(async move {
            {
                let mut store = store.write().await;
                if let Err(e) = store.logout() {
                    error!("Auto-logout could not persist: {}", e);
                }
            }
            if let Err(e) = app.emit("session-expired", ()) {
                warn!("Could not emit session-expired event: {}", e);
            }
        });
    });
    info!("Auto-logout armed for {}", expires_at.format("%Y-%m-%d %H:%M"));
}

// ============================================================================
// Tauri Commands - State & Navigation
// ============================================================================

/// Full render snapshot for the frontend
#[tauri::command]
async fn get_state(state: State<'_, AppState>) -> Result<AsyncResult<StoreSnapshot>, String> {
    debug!("[IPC] get_state called");
    let store = state.store.read().await;
    Ok(AsyncResult::ok(store.snapshot()))
}

/// Outlet roster for the selector screen
#[tauri::command]
fn list_outlets() -> AsyncResult<Vec<String>> {
    debug!("[IPC] list_outlets called");
    AsyncResult::ok(OUTLETS.iter().map(|s| s.to_string()).collect())
}

/// Pick an outlet; this also pins the business date (Asia/Jakarta)
#[tauri::command]
async fn select_outlet(
    state: State<'_, AppState>,
    outlet: String,
) -> Result<AsyncResult<StoreSnapshot>, String> {
    info!("[IPC] select_outlet called: {}", outlet);

    let date = today_jakarta();
    let mut store = state.store.write().await;
    match store.select_outlet(&outlet, &date) {
        Ok(()) => Ok(AsyncResult::ok(store.snapshot())),
        Err(e) => {
            error!("[IPC] select_outlet error: {}", e);
            Ok(AsyncResult::err(e.to_string()))
        }
    }
}

/// Pick a feature from the main menu
#[tauri::command]
async fn select_feature(
    state: State<'_, AppState>,
    feature: Feature,
) -> Result<AsyncResult<StoreSnapshot>, String> {
    info!("[IPC] select_feature called: {:?}", feature);

    let mut store = state.store.write().await;
    match store.select_feature(feature) {
        Ok(()) => Ok(AsyncResult::ok(store.snapshot())),
        Err(e) => Ok(AsyncResult::err(e.to_string())),
    }
}

/// One step back in the screen hierarchy
#[tauri::command]
async fn go_back(state: State<'_, AppState>) -> Result<AsyncResult<StoreSnapshot>, String> {
    debug!("[IPC] go_back called");

    let mut store = state.store.write().await;
    match store.go_back() {
        Ok(()) => Ok(AsyncResult::ok(store.snapshot())),
        Err(e) => Ok(AsyncResult::err(e.to_string())),
    }
}

// ============================================================================
// Tauri Commands - Session
// ============================================================================

/// Check credentials, persist the session, and arm the expiry timer
#[tauri::command]
async fn login(
    app: AppHandle,
    state: State<'_, AppState>,
    username: String,
    password: String,
) -> Result<AsyncResult<StoreSnapshot>, String> {
    info!("[IPC] login called for '{}'", username);

    let session = match state.gate.authenticate(&username, &password) {
        Ok(s) => s,
        Err(e) => return Ok(AsyncResult::err(e.to_string())),
    };

    {
        let mut store = state.store.write().await;
        if let Err(e) = store.login(session.clone()) {
            error!("[IPC] login could not persist: {}", e);
            return Ok(AsyncResult::err(e.to_string()));
        }
    }

    match session.expires_at(&state.config.expiry_policy) {
        Some(expires_at) => {
            let mut timer = state.auto_logout.write().await;
            schedule_auto_logout(&mut timer, Arc::clone(&state.store), app, expires_at);
        }
        None => warn!("Login timestamp out of range, no auto-logout scheduled"),
    }

    let store = state.store.read().await;
    Ok(AsyncResult::ok(store.snapshot()))
}

/// Manual logout: cancel the timer and clear the session
#[tauri::command]
async fn logout(state: State<'_, AppState>) -> Result<AsyncResult<StoreSnapshot>, String> {
    info!("[IPC] logout called");

    {
        let mut timer = state.auto_logout.write().await;
        timer.disarm();
    }

    let mut store = state.store.write().await;
    match store.logout() {
        Ok(()) => Ok(AsyncResult::ok(store.snapshot())),
        Err(e) => {
            error!("[IPC] logout error: {}", e);
            Ok(AsyncResult::err(e.to_string()))
        }
    }
}

/// Stored session with its computed expiry under the configured policy
#[tauri::command]
async fn get_session_info(state: State<'_, AppState>) -> Result<AsyncResult<SessionInfo>, String> {
    debug!("[IPC] get_session_info called");

    let policy = &state.config.expiry_policy;
    match state.db.load_session() {
        Ok(Some(session)) => {
            let expires_at_ms = session.expires_at(policy).map(|at| at.timestamp_millis());
            Ok(AsyncResult::ok(SessionInfo {
                valid: session.is_valid(policy),
                user: Some(session.user),
                login_at_ms: Some(session.login_at_ms),
                expires_at_ms,
                policy: policy.describe(),
            }))
        }
        Ok(None) => Ok(AsyncResult::ok(SessionInfo {
            user: None,
            login_at_ms: None,
            expires_at_ms: None,
            valid: false,
            policy: policy.describe(),
        })),
        Err(e) => Ok(AsyncResult::err(e.to_string())),
    }
}

// ============================================================================
// Tauri Commands - Checklist (Non-Blocking)
// ============================================================================

/// Load the task list for the selected outlet.
/// Spawns the fetch; a stale response (newer load or logout won) is dropped.
#[tauri::command]
async fn load_tasks(state: State<'_, AppState>) -> Result<AsyncResult<StoreSnapshot>, String> {
    info!("[IPC] load_tasks called");

    let (generation, outlet) = {
        let mut store = state.store.write().await;
        let outlet = store.state().selected_outlet.clone();
        if outlet.is_empty() {
            return Ok(AsyncResult::err("No outlet selected"));
        }
        (store.begin_task_load(), outlet)
    };

    // One frame for the webview to paint the spinner before the fetch
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = Arc::clone(&state.task_client);
    let handle = tokio::spawn(async move { client.fetch_tasks(&outlet).await });

    let outcome = match handle.await {
        Ok(result) => result,
        Err(e) => {
            error!("[IPC] load_tasks task panic: {}", e);
            Err(DashboardError::Network(format!("Task failed: {}", e)))
        }
    };

    let mut store = state.store.write().await;
    match store.finish_task_load(generation, outcome) {
        Ok(applied) => {
            if !applied {
                debug!("[IPC] load_tasks superseded (generation {})", generation);
            }
            Ok(AsyncResult::ok(store.snapshot()))
        }
        Err(e) => {
            error!("[IPC] load_tasks could not persist: {}", e);
            Ok(AsyncResult::err(e.to_string()))
        }
    }
}

/// Submit one finished task.
/// The completion is marked optimistically before the webhook answers and
/// rolled back if the submission fails; either way the returned snapshot
/// tells the frontend what happened.
#[tauri::command]
async fn complete_task(
    state: State<'_, AppState>,
    task_id: String,
    submission: TaskSubmission,
) -> Result<AsyncResult<StoreSnapshot>, String> {
    info!("[IPC] complete_task called: {}", task_id);

    {
        let mut store = state.store.write().await;
        if let Err(e) = store.complete_task(&task_id) {
            error!("[IPC] complete_task could not persist: {}", e);
            return Ok(AsyncResult::err(e.to_string()));
        }
    }

    let client = Arc::clone(&state.task_client);
    let handle = tokio::spawn(async move { client.submit_task(&submission).await });

    let outcome = match handle.await {
        Ok(result) => result,
        Err(e) => Err(DashboardError::Network(format!("Task failed: {}", e))),
    };

    let mut store = state.store.write().await;
    let persisted = match outcome {
        Ok(()) => store.confirm_task(&task_id),
        Err(e) => {
            error!("[IPC] Task submission failed, rolling back {}: {}", task_id, e);
            store.fail_task(&task_id, e.to_string())
        }
    };
    match persisted {
        Ok(()) => Ok(AsyncResult::ok(store.snapshot())),
        Err(e) => {
            error!("[IPC] complete_task could not persist: {}", e);
            Ok(AsyncResult::err(e.to_string()))
        }
    }
}

/// "Tutup & Keluar" on the all-done banner
#[tauri::command]
async fn close_checklist(state: State<'_, AppState>) -> Result<AsyncResult<StoreSnapshot>, String> {
    info!("[IPC] close_checklist called");

    let mut store = state.store.write().await;
    match store.close_completed_checklist() {
        Ok(()) => Ok(AsyncResult::ok(store.snapshot())),
        Err(e) => Ok(AsyncResult::err(e.to_string())),
    }
}

/// Drop the success toast
#[tauri::command]
async fn dismiss_notification(
    state: State<'_, AppState>,
) -> Result<AsyncResult<StoreSnapshot>, String> {
    debug!("[IPC] dismiss_notification called");

    let mut store = state.store.write().await;
    store.dismiss_notification();
    Ok(AsyncResult::ok(store.snapshot()))
}

// ============================================================================
// Tauri Commands - Deposits (Non-Blocking)
// ============================================================================

/// Sum the recorded cash for a date range, for the deposit form's
/// auto-filled total. Guarded by a generation counter: the form edits
/// faster than the webhook answers, so a late response comes back flagged
/// as superseded instead of clobbering a newer lookup.
#[tauri::command]
async fn fetch_cash_sum(
    state: State<'_, AppState>,
    start_date: String,
    end_date: String,
) -> Result<AsyncResult<CashSumResponse>, String> {
    debug!("[IPC] fetch_cash_sum called: {} .. {}", start_date, end_date);

    let outlet = {
        let store = state.store.read().await;
        store.state().selected_outlet.clone()
    };
    if outlet.is_empty() {
        return Ok(AsyncResult::err("No outlet selected"));
    }

    let generation = state.cash_generation.fetch_add(1, Ordering::SeqCst) + 1;

    let client = Arc::clone(&state.deposit_client);
    let handle =
        tokio::spawn(async move { client.fetch_cash_sum(&outlet, &start_date, &end_date).await });

    let result = match handle.await {
        Ok(result) => result,
        Err(e) => Err(DashboardError::Network(format!("Task failed: {}", e))),
    };

    let superseded = state.cash_generation.load(Ordering::SeqCst) != generation;
    match result {
        Ok(total) => {
            if superseded {
                debug!("[IPC] Cash sum superseded (generation {})", generation);
            }
            Ok(AsyncResult::ok(CashSumResponse { total, superseded }))
        }
        Err(e) => {
            warn!("[IPC] Cash sum lookup failed: {}", e);
            Ok(AsyncResult::err(e.to_string()))
        }
    }
}

/// Validate and submit a cash deposit report.
/// When the background lookup never landed, the period total is fetched
/// inline; a lookup failure leaves it absent rather than blocking the
/// deposit. An accepted submission is appended to the local audit log.
#[tauri::command]
async fn submit_deposit(
    state: State<'_, AppState>,
    start_date: String,
    end_date: String,
    photo_data_url: String,
    cash_total: Option<f64>,
    notes: String,
) -> Result<AsyncResult<bool>, String> {
    info!("[IPC] submit_deposit called: {} .. {}", start_date, end_date);

    let outlet = {
        let store = state.store.read().await;
        store.state().selected_outlet.clone()
    };
    if outlet.is_empty() {
        return Ok(AsyncResult::err("No outlet selected"));
    }

    let cash_total = match cash_total {
        Some(v) => Some(v),
        None => {
            let client = Arc::clone(&state.deposit_client);
            let (o, s, e) = (outlet.clone(), start_date.clone(), end_date.clone());
            let handle = tokio::spawn(async move { client.fetch_cash_sum(&o, &s, &e).await });
            match handle.await {
                Ok(Ok(total)) => Some(total),
                Ok(Err(e)) => {
                    warn!("[IPC] Cash sum lookup before deposit failed: {}", e);
                    None
                }
                Err(e) => {
                    warn!("[IPC] Cash sum task panic: {}", e);
                    None
                }
            }
        }
    };

    let submission = match deposit::prepare_submission(
        &outlet,
        &start_date,
        &end_date,
        &photo_data_url,
        cash_total,
        &notes,
    ) {
        Ok(s) => s,
        Err(e) => return Ok(AsyncResult::err(e.to_string())),
    };

    let client = Arc::clone(&state.deposit_client);
    let handle = tokio::spawn(async move { client.submit_deposit(&submission).await });

    match handle.await {
        Ok(Ok(())) => {
            // Audit trail; a log failure never voids an accepted deposit
            let meta = DepositMeta { outlet, start_date, end_date, timestamp_ms: now_ms() };
            if let Err(e) = state.db.append_deposit_meta(&meta) {
                warn!("[IPC] Could not append deposit log entry: {}", e);
            }
            Ok(AsyncResult::ok(true))
        }
        Ok(Err(e)) => {
            error!("[IPC] submit_deposit error: {}", e);
            Ok(AsyncResult::err(e.to_string()))
        }
        Err(e) => Ok(AsyncResult::err(format!("Task failed: {}", e))),
    }
}

// ============================================================================
// Tauri Commands - Stock Reports (Non-Blocking)
// ============================================================================

/// Goods catalog for the stock report screen; cached for report building
#[tauri::command]
async fn fetch_stock_items(
    state: State<'_, AppState>,
) -> Result<AsyncResult<Vec<StockItem>>, String> {
    info!("[IPC] fetch_stock_items called");

    let client = Arc::clone(&state.stock_client);
    let handle = tokio::spawn(async move { client.fetch_items().await });

    match handle.await {
        Ok(Ok(items)) => {
            let mut catalog = state.stock_catalog.write().await;
            *catalog = items.clone();
            Ok(AsyncResult::ok(items))
        }
        Ok(Err(e)) => {
            error!("[IPC] fetch_stock_items error: {}", e);
            Ok(AsyncResult::err(e.to_string()))
        }
        Err(e) => Ok(AsyncResult::err(format!("Task failed: {}", e))),
    }
}

/// Draft inputs for the current mode and outlet (empty when none saved)
#[tauri::command]
async fn load_stock_draft(state: State<'_, AppState>) -> Result<AsyncResult<DraftRecord>, String> {
    debug!("[IPC] load_stock_draft called");

    let (mode, outlet) = {
        let store = state.store.read().await;
        (store.stock_mode(), store.state().selected_outlet.clone())
    };
    if outlet.is_empty() {
        return Ok(AsyncResult::err("No outlet selected"));
    }

    match state.db.load_draft(mode, &outlet) {
        Ok(draft) => Ok(AsyncResult::ok(draft)),
        Err(e) => {
            error!("[IPC] load_stock_draft error: {}", e);
            Ok(AsyncResult::err(e.to_string()))
        }
    }
}

/// Persist the draft inputs as typed, scoped to mode and outlet
#[tauri::command]
async fn save_stock_draft(
    state: State<'_, AppState>,
    draft: DraftRecord,
) -> Result<AsyncResult<bool>, String> {
    debug!("[IPC] save_stock_draft called ({} items)", draft.len());

    let (mode, outlet) = {
        let store = state.store.read().await;
        (store.stock_mode(), store.state().selected_outlet.clone())
    };
    if outlet.is_empty() {
        return Ok(AsyncResult::err("No outlet selected"));
    }

    match state.db.save_draft(mode, &outlet, &draft) {
        Ok(()) => Ok(AsyncResult::ok(true)),
        Err(e) => {
            error!("[IPC] save_stock_draft error: {}", e);
            Ok(AsyncResult::err(e.to_string()))
        }
    }
}

/// Build the report from the saved draft and submit it.
/// The draft is only cleared after the webhook accepted the report, so a
/// failed submission keeps the typed quantities.
#[tauri::command]
async fn submit_stock_report(state: State<'_, AppState>) -> Result<AsyncResult<bool>, String> {
    info!("[IPC] submit_stock_report called");

    let (mode, outlet, date) = {
        let store = state.store.read().await;
        (
            store.stock_mode(),
            store.state().selected_outlet.clone(),
            store.state().selected_date.clone(),
        )
    };
    if outlet.is_empty() {
        return Ok(AsyncResult::err("No outlet selected"));
    }

    let draft = match state.db.load_draft(mode, &outlet) {
        Ok(d) => d,
        Err(e) => return Ok(AsyncResult::err(e.to_string())),
    };

    let catalog = {
        let cached = state.stock_catalog.read().await;
        cached.clone()
    };
    let catalog = if catalog.is_empty() {
        debug!("[IPC] Stock catalog not cached, fetching");
        let client = Arc::clone(&state.stock_client);
        let handle = tokio::spawn(async move { client.fetch_items().await });
        match handle.await {
            Ok(Ok(items)) => {
                let mut cache = state.stock_catalog.write().await;
                *cache = items.clone();
                items
            }
            Ok(Err(e)) => return Ok(AsyncResult::err(e.to_string())),
            Err(e) => return Ok(AsyncResult::err(format!("Task failed: {}", e))),
        }
    } else {
        catalog
    };

    let timestamp = api::iso_timestamp();
    let report = match stock::build_report(&draft, &catalog, &outlet, &date, &timestamp) {
        Ok(r) => r,
        Err(e) => return Ok(AsyncResult::err(e.to_string())),
    };

    info!("[IPC] Submitting {} {} lines for {}", report.len(), mode.as_str(), outlet);

    let client = Arc::clone(&state.stock_client);
    let submit_mode = mode;
    let handle = tokio::spawn(async move {
        match submit_mode {
            StockMode::Usage => client.submit_usage(&report).await,
            StockMode::Opname => client.submit_opname(&report).await,
        }
    });

    match handle.await {
        Ok(Ok(())) => {
            if let Err(e) = state.db.clear_draft(mode, &outlet) {
                warn!("[IPC] Could not clear submitted draft: {}", e);
            }
            Ok(AsyncResult::ok(true))
        }
        Ok(Err(e)) => {
            error!("[IPC] submit_stock_report error: {}", e);
            Ok(AsyncResult::err(e.to_string()))
        }
        Err(e) => Ok(AsyncResult::err(format!("Task failed: {}", e))),
    }
}

// ============================================================================
// Tauri Commands - Purchase Orders (Non-Blocking)
// ============================================================================

/// Purchase orders cleared by finance and still awaiting SPV confirmation
#[tauri::command]
async fn fetch_po_list(state: State<'_, AppState>) -> Result<AsyncResult<Vec<PoItem>>, String> {
    info!("[IPC] fetch_po_list called");

    let client = Arc::clone(&state.po_client);
    let handle = tokio::spawn(async move { client.fetch_po_list().await });

    match handle.await {
        Ok(Ok(items)) => Ok(AsyncResult::ok(items)),
        Ok(Err(e)) => {
            error!("[IPC] fetch_po_list error: {}", e);
            Ok(AsyncResult::err(e.to_string()))
        }
        Err(e) => Ok(AsyncResult::err(format!("Task failed: {}", e))),
    }
}

/// Confirm a delivery: decode the photos and post the multipart form
#[tauri::command]
async fn confirm_po(
    state: State<'_, AppState>,
    confirmation: PoConfirmation,
    invoice_photo: Option<PhotoPayload>,
    goods_photo: Option<PhotoPayload>,
) -> Result<AsyncResult<bool>, String> {
    info!("[IPC] confirm_po called: {}", confirmation.id_transaksi);

    let invoice = match invoice_photo.as_ref().map(decode_photo).transpose() {
        Ok(v) => v,
        Err(e) => return Ok(AsyncResult::err(e)),
    };
    let goods = match goods_photo.as_ref().map(decode_photo).transpose() {
        Ok(v) => v,
        Err(e) => return Ok(AsyncResult::err(e)),
    };

    let client = Arc::clone(&state.po_client);
    let handle = tokio::spawn(async move {
        client.confirm_po(&confirmation, invoice.as_ref(), goods.as_ref()).await
    });

    match handle.await {
        Ok(Ok(())) => Ok(AsyncResult::ok(true)),
        Ok(Err(e)) => {
            error!("[IPC] confirm_po error: {}", e);
            Ok(AsyncResult::err(e.to_string()))
        }
        Err(e) => Ok(AsyncResult::err(format!("Task failed: {}", e))),
    }
}

// ============================================================================
// Tauri Commands - Frontend Logging (for debugging)
// ============================================================================

/// Log a message from the frontend to the terminal
#[tauri::command]
fn frontend_log(level: String, message: String) {
    match level.as_str() {
        "error" => error!("[Frontend] {}", message),
        "warn" => warn!("[Frontend] {}", message),
        "info" => info!("[Frontend] {}", message),
        _ => debug!("[Frontend] {}", message),
    }
}

// ============================================================================
// Application Setup
// ============================================================================

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("spv_dashboard=debug".parse().unwrap())
                .add_directive("dashboard_core=debug".parse().unwrap()),
        )
        .init();

    info!("Starting SPV Dashboard");

    let config = DashboardConfig::default();

    // Everything below leans on the state database; refuse to start blind
    let db = Arc::new(
        StateDb::open(config.db_path.as_deref()).expect("Failed to open state database"),
    );
    info!("State database at: {}", db.path().display());

    let mut store = DashboardStore::new(Arc::clone(&db), config.expiry_policy);
    if let Err(e) = store.hydrate() {
        warn!("State hydration failed, starting fresh: {}", e);
    }

    // Re-validate any restored session; the expiry timer is re-armed in
    // setup() once the async runtime is up.
    let restored_session = match db.load_session() {
        Ok(Some(s)) if s.is_valid(&config.expiry_policy) => Some(s),
        Ok(_) => None,
        Err(e) => {
            warn!("Could not read stored session: {}", e);
            None
        }
    };

    let gate = CredentialGate::new(&config);
    let task_client = Arc::new(TaskClient::new(&config.api_base_url));
    let deposit_client = Arc::new(DepositClient::new(&config.api_base_url));
    let stock_client = Arc::new(StockClient::new(&config.api_base_url));
    let po_client = Arc::new(PoClient::new(&config.api_base_url));

    let store = Arc::new(RwLock::new(store));
    let auto_logout = Arc::new(RwLock::new(AutoLogout::new()));
    let policy = config.expiry_policy;

    let state = AppState {
        store: Arc::clone(&store),
        db: Arc::clone(&db),
        gate,
        task_client,
        deposit_client,
        stock_client,
        po_client,
        stock_catalog: Arc::new(RwLock::new(Vec::new())),
        auto_logout: Arc::clone(&auto_logout),
        cash_generation: AtomicU64::new(0),
        config,
    };

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        // TODO: Generate signing keypair and set pubkey in tauri.conf.json before release
        .plugin(tauri_plugin_updater::Builder::new().build())
        .manage(state)
        .setup(move |app| {
            if let Some(session) = restored_session {
                let app_handle = app.handle().clone();
                let store = Arc::clone(&store);
                let auto_logout = Arc::clone(&auto_logout);
                tauri::async_runtime::spawn(async move {
                    match session.expires_at(&policy) {
                        Some(expires_at) => {
                            let mut timer = auto_logout.write().await;
                            schedule_auto_logout(&mut timer, store, app_handle, expires_at);
                            info!("Restored session for '{}'", session.user);
                        }
                        None => warn!("Restored session has no computable expiry"),
                    }
                });
            }
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // State & navigation
            get_state,
            list_outlets,
            select_outlet,
            select_feature,
            go_back,
            // Session
            login,
            logout,
            get_session_info,
            // Checklist (async spawned)
            load_tasks,
            complete_task,
            close_checklist,
            dismiss_notification,
            // Deposits (async spawned)
            fetch_cash_sum,
            submit_deposit,
            // Stock reports (async spawned)
            fetch_stock_items,
            load_stock_draft,
            save_stock_draft,
            submit_stock_report,
            // Purchase orders (async spawned)
            fetch_po_list,
            confirm_po,
            // Debug
            frontend_log,
        ])
        .run(tauri::generate_context!())
        .expect("Error running SPV Dashboard");
}
