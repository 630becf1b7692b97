// ============================================================================
// StateDb — Embedded Database (redb)
// ============================================================================
// Persistent local storage for the view state, the session record, stock
// report drafts, and the deposit submission log.
// Default path: ~/.spv-dashboard/state.redb (override via SPV_DB_PATH)
//
// Values are JSON documents. Reads treat corrupt JSON as absent (with a
// warning) so a bad write can never lock the user out; only real database
// faults surface as errors.
// ============================================================================

pub mod types;

pub use types::{DbStats, DepositMeta, DraftEntry, DraftRecord, ViewState};

use anyhow::{anyhow, Result};
use redb::{Database, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::session::Session;
use crate::types::StockMode;

// Table definitions
const STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("state");
const SESSION: TableDefinition<&str, &[u8]> = TableDefinition::new("session");
const DRAFTS: TableDefinition<&str, &[u8]> = TableDefinition::new("drafts");
const DEPOSIT_LOG: TableDefinition<&str, &[u8]> = TableDefinition::new("deposit_log");

// Storage keys (single-row tables keep the localStorage-era names)
const STATE_KEY: &str = "spv_checklist_state";
const SESSION_KEY: &str = "spv_session";
const DEPOSIT_LOG_KEY: &str = "deposit_submissions";

/// Embedded database for the dashboard's local state
pub struct StateDb {
    db: Database,
    path: PathBuf,
}

impl StateDb {
    /// Open (or create) the database at the given path.
    /// If `path` is None, uses SPV_DB_PATH env var or ~/.spv-dashboard/state.redb
    pub fn open(path: Option<&str>) -> Result<Self> {
        let db_path = if let Some(p) = path {
            PathBuf::from(p)
        } else if let Ok(env_path) = std::env::var("SPV_DB_PATH") {
            PathBuf::from(env_path)
        } else {
            let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
            let app_dir = home.join(".spv-dashboard");
            std::fs::create_dir_all(&app_dir)
                .map_err(|e| anyhow!("Failed to create .spv-dashboard directory: {}", e))?;
            app_dir.join("state.redb")
        };

        info!("Opening state database at: {}", db_path.display());

        let db = Database::create(&db_path)
            .map_err(|e| anyhow!("Failed to open database: {}", e))?;

        // Ensure tables exist by doing a write transaction
        let write_txn = db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let _ = write_txn.open_table(STATE).map_err(|e| anyhow!("Failed to create state table: {}", e))?;
            let _ = write_txn.open_table(SESSION).map_err(|e| anyhow!("Failed to create session table: {}", e))?;
            let _ = write_txn.open_table(DRAFTS).map_err(|e| anyhow!("Failed to create drafts table: {}", e))?;
            let _ = write_txn.open_table(DEPOSIT_LOG).map_err(|e| anyhow!("Failed to create deposit_log table: {}", e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit init: {}", e))?;

        info!("State database ready");

        Ok(Self { db, path: db_path })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ========================================================================
    // Shared plumbing
    // ========================================================================

    fn put_json<T: Serialize>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
        value: &T,
    ) -> Result<()> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| anyhow!("Failed to serialize '{}': {}", key, e))?;

        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut t = write_txn.open_table(table)
                .map_err(|e| anyhow!("Failed to open table: {}", e))?;
            t.insert(key, bytes.as_slice())
                .map_err(|e| anyhow!("Failed to insert '{}': {}", key, e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit: {}", e))?;
        Ok(())
    }

    /// Read a JSON record. Corrupt JSON logs a warning and reads as absent.
    fn read_json<T: DeserializeOwned>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> Result<Option<T>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let t = read_txn.open_table(table)
            .map_err(|e| anyhow!("Failed to open table: {}", e))?;

        match t.get(key).map_err(|e| anyhow!("Failed to get '{}': {}", key, e))? {
            Some(value) => match serde_json::from_slice::<T>(value.value()) {
                Ok(decoded) => Ok(Some(decoded)),
                Err(e) => {
                    warn!("Corrupt record '{}' treated as absent: {}", key, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn remove(&self, table: TableDefinition<&str, &[u8]>, key: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        let removed;
        {
            let mut t = write_txn.open_table(table)
                .map_err(|e| anyhow!("Failed to open table: {}", e))?;
            removed = t.remove(key)
                .map_err(|e| anyhow!("Failed to remove '{}': {}", key, e))?
                .is_some();
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit: {}", e))?;
        Ok(removed)
    }

    // ========================================================================
    // View State Operations
    // ========================================================================

    pub fn save_state(&self, state: &ViewState) -> Result<()> {
        self.put_json(STATE, STATE_KEY, state)?;
        debug!("Persisted view state ({:?})", state.view);
        Ok(())
    }

    pub fn load_state(&self) -> Result<Option<ViewState>> {
        self.read_json(STATE, STATE_KEY)
    }

    pub fn clear_state(&self) -> Result<bool> {
        let removed = self.remove(STATE, STATE_KEY)?;
        debug!("Cleared view state (existed: {})", removed);
        Ok(removed)
    }

    // ========================================================================
    // Session Operations
    // ========================================================================

    pub fn save_session(&self, session: &Session) -> Result<()> {
        self.put_json(SESSION, SESSION_KEY, session)?;
        debug!("Persisted session for '{}'", session.user);
        Ok(())
    }

    pub fn load_session(&self) -> Result<Option<Session>> {
        self.read_json(SESSION, SESSION_KEY)
    }

    pub fn clear_session(&self) -> Result<bool> {
        let removed = self.remove(SESSION, SESSION_KEY)?;
        debug!("Cleared session (existed: {})", removed);
        Ok(removed)
    }

    // ========================================================================
    // Draft Operations
    // ========================================================================
    // One draft per (report mode, outlet); scopes never collide.

    pub fn draft_key(mode: StockMode, outlet: &str) -> String {
        format!("draft_stock_{}_{}", mode.as_str(), outlet)
    }

    pub fn save_draft(&self, mode: StockMode, outlet: &str, draft: &DraftRecord) -> Result<()> {
        let key = Self::draft_key(mode, outlet);
        self.put_json(DRAFTS, &key, draft)?;
        debug!("Saved draft '{}' ({} items)", key, draft.len());
        Ok(())
    }

    /// Load a draft; absent or corrupt reads as an empty draft.
    pub fn load_draft(&self, mode: StockMode, outlet: &str) -> Result<DraftRecord> {
        let key = Self::draft_key(mode, outlet);
        Ok(self.read_json(DRAFTS, &key)?.unwrap_or_default())
    }

    /// Remove a draft. Call only after the report was accepted upstream.
    pub fn clear_draft(&self, mode: StockMode, outlet: &str) -> Result<bool> {
        let key = Self::draft_key(mode, outlet);
        let removed = self.remove(DRAFTS, &key)?;
        debug!("Cleared draft '{}' (existed: {})", key, removed);
        Ok(removed)
    }

    /// Load a draft by its raw scope key (as returned by `list_draft_scopes`)
    pub fn load_draft_scope(&self, key: &str) -> Result<DraftRecord> {
        Ok(self.read_json(DRAFTS, key)?.unwrap_or_default())
    }

    /// Remove every stored draft, returning how many were deleted
    pub fn clear_all_drafts(&self) -> Result<usize> {
        let scopes = self.list_draft_scopes()?;
        for key in &scopes {
            self.remove(DRAFTS, key)?;
        }
        Ok(scopes.len())
    }

    pub fn list_draft_scopes(&self) -> Result<Vec<String>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let table = read_txn.open_table(DRAFTS)
            .map_err(|e| anyhow!("Failed to open drafts table: {}", e))?;

        let mut scopes = Vec::new();
        let iter = table.range::<&str>(..)
            .map_err(|e| anyhow!("Failed to iterate drafts: {}", e))?;
        for entry in iter {
            let (key, _value) = entry.map_err(|e| anyhow!("Failed to read entry: {}", e))?;
            scopes.push(key.value().to_string());
        }
        Ok(scopes)
    }

    // ========================================================================
    // Deposit Log Operations
    // ========================================================================

    /// Append one meta record after an accepted deposit submission.
    pub fn append_deposit_meta(&self, meta: &DepositMeta) -> Result<()> {
        let mut log = self.list_deposit_log()?;
        log.push(meta.clone());
        self.put_json(DEPOSIT_LOG, DEPOSIT_LOG_KEY, &log)?;
        debug!("Deposit log now has {} entries", log.len());
        Ok(())
    }

    pub fn list_deposit_log(&self) -> Result<Vec<DepositMeta>> {
        Ok(self.read_json(DEPOSIT_LOG, DEPOSIT_LOG_KEY)?.unwrap_or_default())
    }

    // ========================================================================
    // Stats
    // ========================================================================

    pub fn stats(&self) -> Result<DbStats> {
        let state = self.load_state()?;
        let session = self.load_session()?;
        let draft_scopes = self.list_draft_scopes()?.len();
        let deposit_log_entries = self.list_deposit_log()?.len();

        let mut completion_counts = std::collections::BTreeMap::new();
        if let Some(s) = &state {
            for status in s.completions.values() {
                *completion_counts
                    .entry(format!("{:?}", status).to_lowercase())
                    .or_insert(0) += 1;
            }
        }

        Ok(DbStats {
            has_state: state.is_some(),
            view: state.as_ref().map(|s| format!("{:?}", s.view)),
            selected_outlet: state
                .as_ref()
                .map(|s| s.selected_outlet.clone())
                .filter(|o| !o.is_empty()),
            selected_date: state
                .as_ref()
                .map(|s| s.selected_date.clone())
                .filter(|d| !d.is_empty()),
            task_count: state.as_ref().map(|s| s.tasks.len()).unwrap_or(0),
            completion_counts,
            has_session: session.is_some(),
            session_user: session.map(|s| s.user),
            draft_scopes,
            deposit_log_entries,
        })
    }

    // Raw bytes entry point so tests can simulate corruption
    #[cfg(test)]
    fn put_raw(&self, table: TableDefinition<&str, &[u8]>, key: &str, bytes: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(table)?;
            t.insert(key, bytes)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AppView, CompletionStatus};
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, StateDb) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.redb");
        let db = StateDb::open(Some(path.to_str().unwrap())).unwrap();
        (dir, db)
    }

    #[test]
    fn state_round_trips() {
        let (_dir, db) = open_temp();
        assert!(db.load_state().unwrap().is_none());

        let mut state = ViewState {
            view: AppView::Checklist,
            selected_outlet: "Pizza Nyantuy Gowa".into(),
            selected_date: "2024-05-05".into(),
            ..Default::default()
        };
        state
            .completions
            .insert("dapur-cuci".into(), CompletionStatus::Confirmed);

        db.save_state(&state).unwrap();
        let loaded = db.load_state().unwrap().unwrap();
        assert_eq!(loaded, state);

        assert!(db.clear_state().unwrap());
        assert!(db.load_state().unwrap().is_none());
    }

    #[test]
    fn corrupt_state_reads_as_absent() {
        let (_dir, db) = open_temp();
        db.put_raw(STATE, STATE_KEY, b"{not json").unwrap();
        assert!(db.load_state().unwrap().is_none());
    }

    #[test]
    fn session_round_trips_and_clears() {
        let (_dir, db) = open_temp();
        let session = Session { user: "Budi".into(), login_at_ms: 1_715_000_000_000 };
        db.save_session(&session).unwrap();
        assert_eq!(db.load_session().unwrap().unwrap(), session);

        assert!(db.clear_session().unwrap());
        assert!(db.load_session().unwrap().is_none());
        assert!(!db.clear_session().unwrap());
    }

    #[test]
    fn draft_scopes_are_independent() {
        let (_dir, db) = open_temp();
        let mut draft = DraftRecord::new();
        draft.insert("7".into(), DraftEntry { quantity: "2.5".into(), note: "sisa".into() });

        db.save_draft(StockMode::Usage, "Pizza Nyantuy Gowa", &draft).unwrap();

        assert_eq!(db.load_draft(StockMode::Usage, "Pizza Nyantuy Gowa").unwrap(), draft);
        assert!(db.load_draft(StockMode::Opname, "Pizza Nyantuy Gowa").unwrap().is_empty());
        assert!(db.load_draft(StockMode::Usage, "Pizza Nyantuy Limbung").unwrap().is_empty());

        let scopes = db.list_draft_scopes().unwrap();
        assert_eq!(scopes, vec!["draft_stock_usage_Pizza Nyantuy Gowa".to_string()]);
    }

    #[test]
    fn clearing_a_draft_leaves_others_alone() {
        let (_dir, db) = open_temp();
        let mut draft = DraftRecord::new();
        draft.insert("1".into(), DraftEntry { quantity: "1".into(), note: String::new() });

        db.save_draft(StockMode::Usage, "A", &draft).unwrap();
        db.save_draft(StockMode::Opname, "A", &draft).unwrap();

        assert!(db.clear_draft(StockMode::Usage, "A").unwrap());
        assert!(db.load_draft(StockMode::Usage, "A").unwrap().is_empty());
        assert_eq!(db.load_draft(StockMode::Opname, "A").unwrap(), draft);
    }

    #[test]
    fn corrupt_draft_reads_as_empty() {
        let (_dir, db) = open_temp();
        let key = StateDb::draft_key(StockMode::Usage, "A");
        db.put_raw(DRAFTS, &key, b"\xff\xfe").unwrap();
        assert!(db.load_draft(StockMode::Usage, "A").unwrap().is_empty());
    }

    #[test]
    fn deposit_log_appends() {
        let (_dir, db) = open_temp();
        assert!(db.list_deposit_log().unwrap().is_empty());

        let meta = DepositMeta {
            outlet: "Pizza Nyantuy Sudiang".into(),
            start_date: "2024-05-01".into(),
            end_date: "2024-05-03".into(),
            timestamp_ms: 1_715_000_000_000,
        };
        db.append_deposit_meta(&meta).unwrap();
        db.append_deposit_meta(&meta).unwrap();

        let log = db.list_deposit_log().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], meta);
    }

    #[test]
    fn stats_summarize_tables() {
        let (_dir, db) = open_temp();
        let mut state = ViewState {
            view: AppView::Checklist,
            selected_outlet: "Pizza Nyantuy Gowa".into(),
            selected_date: "2024-05-05".into(),
            ..Default::default()
        };
        state.completions.insert("a".into(), CompletionStatus::Confirmed);
        state.completions.insert("b".into(), CompletionStatus::Confirmed);
        state.completions.insert("c".into(), CompletionStatus::RolledBack);
        db.save_state(&state).unwrap();
        db.save_session(&Session { user: "Budi".into(), login_at_ms: 1 }).unwrap();

        let stats = db.stats().unwrap();
        assert!(stats.has_state);
        assert!(stats.has_session);
        assert_eq!(stats.session_user.as_deref(), Some("Budi"));
        assert_eq!(stats.completion_counts.get("confirmed"), Some(&2));
        assert_eq!(stats.completion_counts.get("rolledback"), Some(&1));
        assert_eq!(stats.draft_scopes, 0);
    }
}
