//! ============================================================================
//! Date Helpers
//! ============================================================================
//! The business day is pinned to Asia/Jakarta (fixed UTC+7) no matter where
//! the device thinks it is; session expiry math stays device-local and lives
//! in `session`. Webhook payloads carry dates in several shapes, so parsing
//! is deliberately forgiving.
//! ============================================================================

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

/// Today's business date (YYYY-MM-DD) in Asia/Jakarta.
pub fn today_jakarta() -> String {
    // UTC+7 is always a valid offset
    let jakarta = FixedOffset::east_opt(7 * 3600).unwrap();
    Utc::now().with_timezone(&jakarta).format("%Y-%m-%d").to_string()
}

/// Day-of-month from a YYYY-MM-DD string, if it has one.
pub fn day_of_month(date: &str) -> Option<u32> {
    let day = date.split('-').nth(2)?;
    day.trim().parse::<u32>().ok().filter(|d| (1..=31).contains(d))
}

/// Parse the date shapes the webhooks actually send: strict ISO
/// (YYYY-MM-DD), day-first D/M/YYYY or D-M-YYYY (two-digit years read as
/// 20xx, separators may be mixed), then common datetime forms as a last
/// resort. Returns None rather than guessing.
pub fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if is_iso_shape(s) {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    }

    if let Some(date) = parse_day_first(s) {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(s, "%Y/%m/%d").ok()
}

fn is_iso_shape(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..].iter().all(u8::is_ascii_digit)
}

fn parse_day_first(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split(['/', '-']).collect();
    if parts.len() != 3 {
        return None;
    }
    if !parts.iter().all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    if parts[0].len() > 2 || parts[1].len() > 2 {
        return None;
    }

    let day: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let year: i32 = match parts[2].len() {
        2 => 2000 + parts[2].parse::<i32>().ok()?,
        4 => parts[2].parse().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}
