//! ============================================================================
//! Dashboard Store
//! ============================================================================
//! Single owner of the UI state. Every action mutates the in-memory state
//! and persists it wholesale, so a killed app restarts exactly where it
//! was, within the rehydration guards:
//!   - an expired or missing session forces the view back to Login,
//!   - a selected date from a previous business day resets the checklist
//!     while keeping the selected outlet.
//! Task loads carry a generation counter; a response that arrives after a
//! newer load (or a logout) started is discarded instead of clobbering.
//! ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::dates::today_jakarta;
use crate::db::{StateDb, ViewState};
use crate::inference::infer_completed;
use crate::session::{now_ms, ExpiryPolicy, Session};
use crate::types::{AppView, CompletionStatus, DashboardError, Feature, StockMode, TaskRecord};

/// Error banner shown after a failed task list load
const LOAD_TASKS_ERROR: &str = "Gagal memuat daftar tugas. Periksa koneksi internet.";

/// Transient success toast; the id makes consecutive identical messages
/// distinguishable to the frontend.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notification {
    pub id: i64,
    pub message: String,
}

/// Everything the frontend needs to render, in one payload
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot {
    #[serde(flatten)]
    pub state: ViewState,
    pub completed_ids: BTreeSet<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub notification: Option<Notification>,
    pub stock_mode: StockMode,
    pub categories: Vec<String>,
    pub progress: (usize, usize),
}

/// The view-state store. One instance per app; construct then `hydrate`.
pub struct DashboardStore {
    state: ViewState,
    db: Arc<StateDb>,
    policy: ExpiryPolicy,
    // Transient, never persisted
    loading: bool,
    last_error: Option<String>,
    notification: Option<Notification>,
    stock_mode: StockMode,
    load_generation: u64,
}

impl DashboardStore {
    pub fn new(db: Arc<StateDb>, policy: ExpiryPolicy) -> Self {
        Self {
            state: ViewState::default(),
            db,
            policy,
            loading: false,
            last_error: None,
            notification: None,
            stock_mode: StockMode::Usage,
            load_generation: 0,
        }
    }

    // ========================================================================
    // Hydration
    // ========================================================================

    /// Restore persisted state, re-validating the session and applying the
    /// new-day guard.
    pub fn hydrate(&mut self) -> Result<(), DashboardError> {
        self.hydrate_at(Local::now(), &today_jakarta())
    }

    pub fn hydrate_at(&mut self, now: DateTime<Local>, today: &str) -> Result<(), DashboardError> {
        let saved = self.db.load_state().map_err(storage_err)?;
        let mut restored = match saved {
            Some(state) => state,
            None => {
                debug!("No persisted state, starting fresh");
                self.state = ViewState::default();
                return Ok(());
            }
        };

        // The session record is authoritative for identity; the copy inside
        // the state blob is never trusted on its own.
        let session = self.db.load_session().map_err(storage_err)?;
        let session_valid = match &session {
            Some(s) => s.is_valid_at(now, &self.policy),
            None => false,
        };
        if session_valid {
            if let Some(s) = &session {
                restored.user = Some(s.user.clone());
                restored.login_at_ms = Some(s.login_at_ms);
            }
        }

        let new_day = !restored.selected_date.is_empty() && restored.selected_date != today;
        self.state = if new_day {
            info!(
                "Business day rolled over ({} -> {}), resetting checklist",
                restored.selected_date, today
            );
            ViewState {
                view: if session_valid { AppView::SelectOutlet } else { AppView::Login },
                selected_outlet: restored.selected_outlet,
                selected_date: String::new(),
                tasks: Vec::new(),
                completions: Default::default(),
                user: if session_valid { restored.user } else { None },
                login_at_ms: if session_valid { restored.login_at_ms } else { None },
            }
        } else if session_valid {
            restored
        } else {
            if restored.user.is_some() {
                info!("Session expired, returning to login");
            }
            ViewState {
                view: AppView::Login,
                user: None,
                login_at_ms: None,
                ..restored
            }
        };

        self.persist()
    }

    // ========================================================================
    // Session actions
    // ========================================================================

    pub fn login(&mut self, session: Session) -> Result<(), DashboardError> {
        self.db.save_session(&session).map_err(storage_err)?;
        self.state.user = Some(session.user);
        self.state.login_at_ms = Some(session.login_at_ms);
        self.state.view = AppView::SelectOutlet;
        self.persist()
    }

    pub fn logout(&mut self) -> Result<(), DashboardError> {
        self.db.clear_session().map_err(storage_err)?;
        self.state.view = AppView::Login;
        self.state.user = None;
        self.state.login_at_ms = None;
        self.state.selected_outlet.clear();
        self.state.selected_date.clear();
        self.state.tasks.clear();
        self.state.completions.clear();
        // Retire any in-flight task load
        self.load_generation += 1;
        self.loading = false;
        info!("Logged out");
        self.persist()
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn select_outlet(&mut self, outlet: &str, date: &str) -> Result<(), DashboardError> {
        self.state.selected_outlet = outlet.to_string();
        self.state.selected_date = date.to_string();
        self.state.view = AppView::SelectFeature;
        debug!("Outlet selected: '{}' on {}", outlet, date);
        self.persist()
    }

    pub fn select_feature(&mut self, feature: Feature) -> Result<(), DashboardError> {
        match feature {
            Feature::Task => {
                // Switch immediately so the loading screen paints; the task
                // fetch runs separately and lands via finish_task_load.
                self.state.view = AppView::Checklist;
                self.state.tasks.clear();
                self.loading = true;
                self.last_error = None;
            }
            Feature::Deposit => self.state.view = AppView::Deposit,
            Feature::Po => self.state.view = AppView::Po,
            Feature::Stock => {
                self.stock_mode = StockMode::Usage;
                self.state.view = AppView::Stock;
            }
            Feature::Opname => {
                self.stock_mode = StockMode::Opname;
                self.state.view = AppView::Stock;
            }
        }
        self.persist()
    }

    pub fn go_back(&mut self) -> Result<(), DashboardError> {
        match self.state.view {
            AppView::Checklist | AppView::Deposit | AppView::Po | AppView::Stock => {
                self.state.view = AppView::SelectFeature;
            }
            AppView::SelectFeature => {
                self.state.view = AppView::SelectOutlet;
            }
            _ => {}
        }
        self.persist()
    }

    // ========================================================================
    // Task loading
    // ========================================================================

    /// Start a load: bump the generation, flag loading, clear the error.
    /// The returned generation must be passed back to `finish_task_load`.
    pub fn begin_task_load(&mut self) -> u64 {
        self.load_generation += 1;
        self.loading = true;
        self.last_error = None;
        debug!("Task load {} started", self.load_generation);
        self.load_generation
    }

    /// Land a load. Stale generations are discarded wholesale (a newer
    /// load, or a logout, owns the flags now). Returns whether the outcome
    /// was applied.
    pub fn finish_task_load(
        &mut self,
        generation: u64,
        outcome: Result<Vec<TaskRecord>, DashboardError>,
    ) -> Result<bool, DashboardError> {
        if generation != self.load_generation {
            warn!(
                "Discarding stale task load (generation {}, current {})",
                generation, self.load_generation
            );
            return Ok(false);
        }

        match outcome {
            Ok(tasks) => {
                let inferred = infer_completed(&tasks, &self.state.selected_date);
                info!(
                    "Loaded {} tasks, {} inferred already done",
                    tasks.len(),
                    inferred.len()
                );
                self.state.view = AppView::Checklist;
                self.state.tasks = tasks;
                self.state.completions = inferred
                    .into_iter()
                    .map(|id| (id, CompletionStatus::Confirmed))
                    .collect();
                self.loading = false;
                self.persist()?;
            }
            Err(e) => {
                error!("Task load failed: {}", e);
                self.last_error = Some(LOAD_TASKS_ERROR.to_string());
                self.loading = false;
            }
        }
        Ok(true)
    }

    // ========================================================================
    // Task completion
    // ========================================================================

    /// Optimistic completion: mark pending and raise the success toast
    /// before the webhook answers.
    pub fn complete_task(&mut self, task_id: &str) -> Result<(), DashboardError> {
        self.state
            .completions
            .insert(task_id.to_string(), CompletionStatus::Pending);
        self.notification = Some(Notification {
            id: now_ms(),
            message: "Laporan berhasil dikirim!".to_string(),
        });
        self.persist()
    }

    /// The webhook accepted the submission.
    pub fn confirm_task(&mut self, task_id: &str) -> Result<(), DashboardError> {
        self.state
            .completions
            .insert(task_id.to_string(), CompletionStatus::Confirmed);
        self.persist()
    }

    /// The webhook rejected the submission: roll the mark back and surface
    /// the error.
    pub fn fail_task(&mut self, task_id: &str, message: impl Into<String>) -> Result<(), DashboardError> {
        self.state
            .completions
            .insert(task_id.to_string(), CompletionStatus::RolledBack);
        self.last_error = Some(message.into());
        self.persist()
    }

    /// "Tutup & Keluar" on the all-done banner: leave the checklist and
    /// drop its rows, staying logged in.
    pub fn close_completed_checklist(&mut self) -> Result<(), DashboardError> {
        self.state.view = AppView::SelectOutlet;
        self.state.tasks.clear();
        self.state.completions.clear();
        self.load_generation += 1;
        self.loading = false;
        self.persist()
    }

    // ========================================================================
    // Transients and accessors
    // ========================================================================

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn stock_mode(&self) -> StockMode {
        self.stock_mode
    }

    /// "SEMUA" plus the sorted distinct category labels of the loaded tasks
    pub fn categories(&self) -> Vec<String> {
        let labels: BTreeSet<String> =
            self.state.tasks.iter().map(|t| t.category_label()).collect();
        let mut out = Vec::with_capacity(labels.len() + 1);
        out.push("SEMUA".to_string());
        out.extend(labels);
        out
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            completed_ids: self.state.completed_ids(),
            categories: self.categories(),
            progress: self.state.progress(),
            state: self.state.clone(),
            loading: self.loading,
            error: self.last_error.clone(),
            notification: self.notification.clone(),
            stock_mode: self.stock_mode,
        }
    }

    fn persist(&self) -> Result<(), DashboardError> {
        self.db.save_state(&self.state).map_err(storage_err)
    }
}

fn storage_err(e: anyhow::Error) -> DashboardError {
    DashboardError::Storage(e.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use tempfile::TempDir;

    const TODAY: &str = "2024-05-05";

    fn open_store() -> (TempDir, Arc<StateDb>, DashboardStore) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.redb");
        let db = Arc::new(StateDb::open(Some(path.to_str().unwrap())).unwrap());
        let store = DashboardStore::new(db.clone(), ExpiryPolicy::default());
        (dir, db, store)
    }

    fn task(fields: serde_json::Value) -> TaskRecord {
        serde_json::from_value(fields).unwrap()
    }

    fn fresh_session() -> Session {
        Session { user: "Budi".into(), login_at_ms: now_ms() }
    }

    fn stale_session() -> Session {
        let two_days_ago = Local::now() - Duration::days(2);
        Session { user: "Budi".into(), login_at_ms: two_days_ago.timestamp_millis() }
    }

    #[test]
    fn fresh_store_starts_at_login() {
        let (_dir, _db, store) = open_store();
        assert_eq!(store.state().view, AppView::Login);
        assert!(store.state().user.is_none());
    }

    #[test]
    fn login_moves_to_outlet_selection_and_persists() {
        let (_dir, db, mut store) = open_store();
        store.login(fresh_session()).unwrap();

        assert_eq!(store.state().view, AppView::SelectOutlet);
        assert_eq!(store.state().user.as_deref(), Some("Budi"));
        assert_eq!(db.load_session().unwrap().unwrap().user, "Budi");
        assert_eq!(db.load_state().unwrap().unwrap().view, AppView::SelectOutlet);
    }

    #[test]
    fn logout_clears_everything_but_keeps_the_store_usable() {
        let (_dir, db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.select_outlet("Pizza Nyantuy Gowa", TODAY).unwrap();
        store.logout().unwrap();

        assert_eq!(store.state().view, AppView::Login);
        assert!(store.state().user.is_none());
        assert!(store.state().selected_outlet.is_empty());
        assert!(db.load_session().unwrap().is_none());
    }

    #[test]
    fn outlet_then_feature_navigation() {
        let (_dir, _db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.select_outlet("Pizza Nyantuy Gowa", TODAY).unwrap();
        assert_eq!(store.state().view, AppView::SelectFeature);

        store.select_feature(Feature::Deposit).unwrap();
        assert_eq!(store.state().view, AppView::Deposit);

        store.go_back().unwrap();
        assert_eq!(store.state().view, AppView::SelectFeature);
        store.go_back().unwrap();
        assert_eq!(store.state().view, AppView::SelectOutlet);
    }

    #[test]
    fn selecting_the_task_feature_primes_the_checklist() {
        let (_dir, _db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.select_outlet("Pizza Nyantuy Gowa", TODAY).unwrap();
        store.select_feature(Feature::Task).unwrap();

        assert_eq!(store.state().view, AppView::Checklist);
        assert!(store.state().tasks.is_empty());
        assert!(store.is_loading());
    }

    #[test]
    fn stock_and_opname_share_the_stock_view() {
        let (_dir, _db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.select_outlet("Pizza Nyantuy Gowa", TODAY).unwrap();

        store.select_feature(Feature::Stock).unwrap();
        assert_eq!(store.state().view, AppView::Stock);
        assert_eq!(store.stock_mode(), StockMode::Usage);

        store.select_feature(Feature::Opname).unwrap();
        assert_eq!(store.state().view, AppView::Stock);
        assert_eq!(store.stock_mode(), StockMode::Opname);
    }

    #[test]
    fn finished_load_installs_tasks_and_inferred_completions() {
        let (_dir, _db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.select_outlet("Pizza Nyantuy Gowa", TODAY).unwrap();
        store.select_feature(Feature::Task).unwrap();

        let generation = store.begin_task_load();
        let tasks = vec![
            task(json!({"Kategoriugas": "Dapur", "Tugas": "Cek stok", "Tanggal 5": "ok"})),
            task(json!({"Kategoriugas": "Dapur", "Tugas": "Cuci piring"})),
        ];
        let applied = store.finish_task_load(generation, Ok(tasks)).unwrap();

        assert!(applied);
        assert!(!store.is_loading());
        assert_eq!(store.state().tasks.len(), 2);
        let done = store.state().completed_ids();
        assert!(done.contains("dapur-cek-stok"));
        assert!(!done.contains("dapur-cuci-piring"));
        assert_eq!(
            store.state().completions.get("dapur-cek-stok"),
            Some(&CompletionStatus::Confirmed)
        );
    }

    #[test]
    fn stale_load_is_discarded() {
        let (_dir, _db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.select_outlet("Pizza Nyantuy Gowa", TODAY).unwrap();

        let first = store.begin_task_load();
        let second = store.begin_task_load();

        let applied = store
            .finish_task_load(first, Ok(vec![task(json!({"Tugas": "old"}))]))
            .unwrap();
        assert!(!applied);
        assert!(store.state().tasks.is_empty());
        assert!(store.is_loading());

        let applied = store.finish_task_load(second, Ok(vec![])).unwrap();
        assert!(applied);
        assert!(!store.is_loading());
    }

    #[test]
    fn logout_retires_inflight_loads() {
        let (_dir, _db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        let generation = store.begin_task_load();
        store.logout().unwrap();

        let applied = store
            .finish_task_load(generation, Ok(vec![task(json!({"Tugas": "late"}))]))
            .unwrap();
        assert!(!applied);
        assert_eq!(store.state().view, AppView::Login);
        assert!(store.state().tasks.is_empty());
    }

    #[test]
    fn failed_load_surfaces_the_banner_and_clears_loading() {
        let (_dir, _db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        let generation = store.begin_task_load();
        store
            .finish_task_load(generation, Err(DashboardError::Network("boom".into())))
            .unwrap();

        assert!(!store.is_loading());
        assert_eq!(store.snapshot().error.as_deref(), Some(LOAD_TASKS_ERROR));
        assert!(store.state().tasks.is_empty());
    }

    #[test]
    fn optimistic_complete_then_confirm() {
        let (_dir, _db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.complete_task("dapur-cek-stok").unwrap();

        assert_eq!(
            store.state().completions.get("dapur-cek-stok"),
            Some(&CompletionStatus::Pending)
        );
        assert!(store.state().completed_ids().contains("dapur-cek-stok"));
        let toast = store.snapshot().notification.unwrap();
        assert_eq!(toast.message, "Laporan berhasil dikirim!");

        store.confirm_task("dapur-cek-stok").unwrap();
        assert_eq!(
            store.state().completions.get("dapur-cek-stok"),
            Some(&CompletionStatus::Confirmed)
        );
    }

    #[test]
    fn failed_submission_rolls_back() {
        let (_dir, _db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.complete_task("dapur-cek-stok").unwrap();
        store.fail_task("dapur-cek-stok", "Server Error (500): oops").unwrap();

        assert!(!store.state().completed_ids().contains("dapur-cek-stok"));
        assert_eq!(
            store.state().completions.get("dapur-cek-stok"),
            Some(&CompletionStatus::RolledBack)
        );
        assert_eq!(store.snapshot().error.as_deref(), Some("Server Error (500): oops"));
    }

    #[test]
    fn closing_a_finished_checklist_keeps_the_session() {
        let (_dir, _db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.select_outlet("Pizza Nyantuy Gowa", TODAY).unwrap();
        let generation = store.begin_task_load();
        store
            .finish_task_load(generation, Ok(vec![task(json!({"Tugas": "x"}))]))
            .unwrap();
        store.complete_task("general-x").unwrap();

        store.close_completed_checklist().unwrap();
        assert_eq!(store.state().view, AppView::SelectOutlet);
        assert!(store.state().tasks.is_empty());
        assert!(store.state().completions.is_empty());
        assert_eq!(store.state().user.as_deref(), Some("Budi"));
    }

    #[test]
    fn notification_can_be_dismissed() {
        let (_dir, _db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.complete_task("x").unwrap();
        assert!(store.snapshot().notification.is_some());
        store.dismiss_notification();
        assert!(store.snapshot().notification.is_none());
    }

    #[test]
    fn categories_are_semua_plus_sorted_labels() {
        let (_dir, _db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        let generation = store.begin_task_load();
        store
            .finish_task_load(
                generation,
                Ok(vec![
                    task(json!({"Kategoriugas": "servis", "Tugas": "a"})),
                    task(json!({"Kategoriugas": "dapur", "Tugas": "b"})),
                    task(json!({"Tugas": "c"})),
                ]),
            )
            .unwrap();

        assert_eq!(store.categories(), vec!["SEMUA", "DAPUR", "LAINNYA", "SERVIS"]);
    }

    // ------------------------------------------------------------------
    // Rehydration
    // ------------------------------------------------------------------

    #[test]
    fn hydrate_without_saved_state_stays_fresh() {
        let (_dir, db, mut store) = open_store();
        db.save_session(&fresh_session()).unwrap();

        store.hydrate_at(Local::now(), TODAY).unwrap();
        assert_eq!(store.state().view, AppView::Login);
        assert!(store.state().user.is_none());
    }

    #[test]
    fn hydrate_restores_a_valid_session_same_day() {
        let (_dir, db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.select_outlet("Pizza Nyantuy Gowa", TODAY).unwrap();
        store.select_feature(Feature::Deposit).unwrap();

        let mut restored = DashboardStore::new(db, ExpiryPolicy::default());
        restored.hydrate_at(Local::now(), TODAY).unwrap();

        assert_eq!(restored.state().view, AppView::Deposit);
        assert_eq!(restored.state().selected_outlet, "Pizza Nyantuy Gowa");
        assert_eq!(restored.state().user.as_deref(), Some("Budi"));
    }

    #[test]
    fn hydrate_takes_identity_from_the_session_record() {
        let (_dir, db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        // A different identity sneaks into the state blob
        let mut tampered = db.load_state().unwrap().unwrap();
        tampered.user = Some("Penyusup".into());
        db.save_state(&tampered).unwrap();

        let mut restored = DashboardStore::new(db, ExpiryPolicy::default());
        restored.hydrate_at(Local::now(), TODAY).unwrap();
        assert_eq!(restored.state().user.as_deref(), Some("Budi"));
    }

    #[test]
    fn hydrate_with_expired_session_forces_login_but_keeps_the_rest() {
        let (_dir, db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.select_outlet("Pizza Nyantuy Gowa", TODAY).unwrap();
        db.save_session(&stale_session()).unwrap();

        let mut restored = DashboardStore::new(db, ExpiryPolicy::default());
        restored.hydrate_at(Local::now(), TODAY).unwrap();

        assert_eq!(restored.state().view, AppView::Login);
        assert!(restored.state().user.is_none());
        assert!(restored.state().login_at_ms.is_none());
        // Rest of the snapshot is intact
        assert_eq!(restored.state().selected_outlet, "Pizza Nyantuy Gowa");
        assert_eq!(restored.state().selected_date, TODAY);
    }

    #[test]
    fn hydrate_with_missing_session_forces_login() {
        let (_dir, db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        db.clear_session().unwrap();

        let mut restored = DashboardStore::new(db, ExpiryPolicy::default());
        restored.hydrate_at(Local::now(), TODAY).unwrap();
        assert_eq!(restored.state().view, AppView::Login);
        assert!(restored.state().user.is_none());
    }

    #[test]
    fn new_day_resets_checklist_but_preserves_outlet() {
        let (_dir, db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.select_outlet("Pizza Nyantuy Gowa", "2024-05-04").unwrap();
        let generation = store.begin_task_load();
        store
            .finish_task_load(generation, Ok(vec![task(json!({"Tugas": "x"}))]))
            .unwrap();
        store.complete_task("general-x").unwrap();

        let mut restored = DashboardStore::new(db, ExpiryPolicy::default());
        restored.hydrate_at(Local::now(), TODAY).unwrap();

        assert_eq!(restored.state().view, AppView::SelectOutlet);
        assert_eq!(restored.state().selected_outlet, "Pizza Nyantuy Gowa");
        assert!(restored.state().selected_date.is_empty());
        assert!(restored.state().tasks.is_empty());
        assert!(restored.state().completions.is_empty());
        assert_eq!(restored.state().user.as_deref(), Some("Budi"));
    }

    #[test]
    fn new_day_with_expired_session_lands_on_login() {
        let (_dir, db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.select_outlet("Pizza Nyantuy Gowa", "2024-05-04").unwrap();
        db.save_session(&stale_session()).unwrap();

        let mut restored = DashboardStore::new(db, ExpiryPolicy::default());
        restored.hydrate_at(Local::now(), TODAY).unwrap();

        assert_eq!(restored.state().view, AppView::Login);
        assert!(restored.state().user.is_none());
        assert_eq!(restored.state().selected_outlet, "Pizza Nyantuy Gowa");
    }

    #[test]
    fn completions_survive_a_restart_within_the_day() {
        let (_dir, db, mut store) = open_store();
        store.login(fresh_session()).unwrap();
        store.select_outlet("Pizza Nyantuy Gowa", TODAY).unwrap();
        let generation = store.begin_task_load();
        store
            .finish_task_load(generation, Ok(vec![task(json!({"Tugas": "x"}))]))
            .unwrap();
        store.complete_task("general-x").unwrap();

        let mut restored = DashboardStore::new(db, ExpiryPolicy::default());
        restored.hydrate_at(Local::now(), TODAY).unwrap();
        assert!(restored.state().completed_ids().contains("general-x"));
        assert_eq!(restored.state().tasks.len(), 1);
    }
}
