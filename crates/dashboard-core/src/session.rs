//! ============================================================================
//! Session Clock
//! ============================================================================
//! Supervisors log in with a shared credential pair and the session lives
//! until the configured expiry: by default the next 23:30 wall-clock, so a
//! login after the cutoff stays valid through the following evening. The
//! policy is a single named configuration; expiry math is device-local on
//! purpose (the business date is pinned separately, see `dates`).
//! ============================================================================

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long a login stays valid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Valid until the next occurrence of HH:MM local time
    DailyCutoff { hour: u32, minute: u32 },
    /// Valid for a fixed number of hours after login
    SlidingWindow { hours: i64 },
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        ExpiryPolicy::DailyCutoff { hour: 23, minute: 30 }
    }
}

impl ExpiryPolicy {
    /// Parse `daily-cutoff`, `daily-cutoff:HH:MM` or `sliding-window:<hours>`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        if s == "daily-cutoff" {
            return Some(ExpiryPolicy::default());
        }
        if let Some(rest) = s.strip_prefix("daily-cutoff:") {
            let (h, m) = rest.split_once(':')?;
            let hour: u32 = h.trim().parse().ok()?;
            let minute: u32 = m.trim().parse().ok()?;
            if hour > 23 || minute > 59 {
                return None;
            }
            return Some(ExpiryPolicy::DailyCutoff { hour, minute });
        }
        if let Some(rest) = s.strip_prefix("sliding-window:") {
            let hours: i64 = rest.trim().trim_end_matches('h').parse().ok()?;
            if hours < 1 {
                return None;
            }
            return Some(ExpiryPolicy::SlidingWindow { hours });
        }
        None
    }

    /// Read SPV_SESSION_POLICY; unknown values warn and fall back.
    pub fn from_env() -> Self {
        match std::env::var("SPV_SESSION_POLICY") {
            Ok(raw) => ExpiryPolicy::parse(&raw).unwrap_or_else(|| {
                warn!("Unrecognized SPV_SESSION_POLICY '{}', using daily cutoff 23:30", raw);
                ExpiryPolicy::default()
            }),
            Err(_) => ExpiryPolicy::default(),
        }
    }

    /// Human-readable form for logs and the inspection CLI
    pub fn describe(&self) -> String {
        match self {
            ExpiryPolicy::DailyCutoff { hour, minute } => {
                format!("daily-cutoff {:02}:{:02}", hour, minute)
            }
            ExpiryPolicy::SlidingWindow { hours } => format!("sliding-window {}h", hours),
        }
    }
}

/// Expiry instant for a login under the given policy.
/// For the daily cutoff: the same-day cutoff when the login precedes it,
/// otherwise the next day's. A login exactly at the cutoff gets the next
/// day (it would otherwise be dead on arrival).
pub fn expiry_for(login_at: DateTime<Local>, policy: &ExpiryPolicy) -> DateTime<Local> {
    match policy {
        ExpiryPolicy::DailyCutoff { hour, minute } => {
            let naive = login_at.naive_local();
            let mut candidate = naive
                .date()
                .and_hms_opt(*hour, *minute, 0)
                .unwrap_or(naive);
            if naive >= candidate {
                candidate += Duration::days(1);
            }
            resolve_local(candidate)
        }
        ExpiryPolicy::SlidingWindow { hours } => login_at + Duration::hours(*hours),
    }
}

/// Map a wall-clock time back onto the local timezone. Ambiguous times
/// (DST fold) take the earlier instant; nonexistent times (DST gap) are
/// pushed forward an hour.
fn resolve_local(naive: NaiveDateTime) -> DateTime<Local> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            Local
                .from_local_datetime(&shifted)
                .earliest()
                .unwrap_or_else(Local::now)
        }
    }
}

/// Current instant as epoch milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// An authenticated session, persisted separately from the view state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Display name as entered at login (trimmed, original casing)
    pub user: String,
    /// Login instant, epoch milliseconds
    pub login_at_ms: i64,
}

impl Session {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into(), login_at_ms: now_ms() }
    }

    /// Login instant in device-local time; None when the stored
    /// milliseconds are out of range.
    pub fn login_at(&self) -> Option<DateTime<Local>> {
        Local.timestamp_millis_opt(self.login_at_ms).single()
    }

    pub fn expires_at(&self, policy: &ExpiryPolicy) -> Option<DateTime<Local>> {
        self.login_at().map(|login| expiry_for(login, policy))
    }

    /// Valid strictly before the expiry instant
    pub fn is_valid_at(&self, now: DateTime<Local>, policy: &ExpiryPolicy) -> bool {
        match self.expires_at(policy) {
            Some(expires) => now < expires,
            None => false,
        }
    }

    pub fn is_valid(&self, policy: &ExpiryPolicy) -> bool {
        self.is_valid_at(Local::now(), policy)
    }
}

// ============================================================================
// Auto-logout timer
// ============================================================================

/// One-shot logout timer. Arming replaces any previous timer; a deadline
/// already in the past fires the callback synchronously.
#[derive(Default)]
pub struct AutoLogout {
    handle: Option<JoinHandle<()>>,
}

impl AutoLogout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `on_expire` for the deadline. Must be called from within a
    /// tokio runtime.
    pub fn arm<F>(&mut self, expires_at: DateTime<Local>, on_expire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.disarm();

        let remaining = expires_at - Local::now();
        if remaining <= Duration::zero() {
            debug!("Session already past expiry, logging out now");
            on_expire();
            return;
        }

        let sleep_for = remaining.to_std().unwrap_or(std::time::Duration::ZERO);
        debug!("Auto-logout armed, fires in {}s", sleep_for.as_secs());
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(sleep_for).await;
            debug!("Session expired, running auto-logout");
            on_expire();
        }));
    }

    /// Cancel the pending timer, if any.
    pub fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }
}

impl Drop for AutoLogout {
    fn drop(&mut self) {
        self.disarm();
    }
}

// ============================================================================
// Tests
// ============================================================================
