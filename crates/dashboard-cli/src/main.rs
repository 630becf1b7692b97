// ============================================================================
// spv-db — CLI state inspection tool for the SPV Dashboard
// ============================================================================
// Usage:
//   spv-db stats                           Show state database statistics
//   spv-db state                           Dump the persisted view state as JSON
//   spv-db session                         Show the stored session and its expiry
//   spv-db list-drafts                     List stock draft scopes
//   spv-db show-draft --mode usage --outlet "Pizza Nyantuy Gowa"
//   spv-db clear [--state] [--session] [--drafts]
//   spv-db export --format json            Export full database as JSON
// ============================================================================

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use dashboard_core::{ExpiryPolicy, StateDb, StockMode};

/// SPV Dashboard state inspection tool
#[derive(Parser)]
#[command(name = "spv-db", version, about = "Inspect and manage the SPV dashboard state database")]
struct Cli {
    /// Path to the database file (default: ~/.spv-dashboard/state.redb)
    #[arg(long, global = true)]
    db_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show database statistics (view, tasks, completions, drafts)
    Stats,

    /// Dump the persisted view state as pretty JSON
    State,

    /// Show the stored session and its computed expiry
    Session,

    /// List stored stock draft scopes
    ListDrafts,

    /// Show one stock draft
    ShowDraft {
        /// Report mode: usage or opname
        #[arg(long)]
        mode: String,

        /// Outlet the draft belongs to
        #[arg(long)]
        outlet: String,
    },

    /// Clear stored records (pass at least one flag)
    Clear {
        /// Clear the persisted view state
        #[arg(long)]
        state: bool,

        /// Clear the stored session
        #[arg(long)]
        session: bool,

        /// Clear all stock drafts
        #[arg(long)]
        drafts: bool,
    },

    /// Export full database contents as JSON
    Export {
        /// Output format (currently only json is supported)
        #[arg(long, default_value = "json")]
        format: String,
    },
}

fn parse_mode(s: &str) -> Result<StockMode> {
    StockMode::parse(s)
        .ok_or_else(|| anyhow::anyhow!("Unknown mode '{}'. Valid values: usage, opname", s))
}

fn format_timestamp(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("(invalid: {})", ms))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let db = StateDb::open(cli.db_path.as_deref())?;

    match cli.command {
        Commands::Stats => cmd_stats(&db),
        Commands::State => cmd_state(&db),
        Commands::Session => cmd_session(&db),
        Commands::ListDrafts => cmd_list_drafts(&db),
        Commands::ShowDraft { mode, outlet } => cmd_show_draft(&db, &mode, &outlet),
        Commands::Clear {
            state,
            session,
            drafts,
        } => cmd_clear(&db, state, session, drafts),
        Commands::Export { format } => cmd_export(&db, &format),
    }
}

fn cmd_stats(db: &StateDb) -> Result<()> {
    let stats = db.stats()?;

    println!("=== SPV Dashboard Database Stats ===");
    println!("Database: {}", db.path().display());
    println!();
    if stats.has_state {
        println!("View:     {}", stats.view.as_deref().unwrap_or("-"));
        println!("Outlet:   {}", stats.selected_outlet.as_deref().unwrap_or("-"));
        println!("Date:     {}", stats.selected_date.as_deref().unwrap_or("-"));
        println!("Tasks:    {}", stats.task_count);
        for (status, count) in &stats.completion_counts {
            println!("  {:12} {}", status, count);
        }
    } else {
        println!("View state: (none)");
    }
    if stats.has_session {
        let validity = match db.load_session()? {
            Some(session) if session.is_valid(&ExpiryPolicy::from_env()) => "valid",
            _ => "expired",
        };
        println!(
            "Session:  {} ({})",
            stats.session_user.as_deref().unwrap_or("(unnamed)"),
            validity
        );
    } else {
        println!("Session:  (none)");
    }
    println!("Drafts:   {} scopes", stats.draft_scopes);
    println!("Deposit log: {} entries", stats.deposit_log_entries);

    Ok(())
}

fn cmd_state(db: &StateDb) -> Result<()> {
    match db.load_state()? {
        Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
        None => println!("No view state stored."),
    }
    Ok(())
}

fn cmd_session(db: &StateDb) -> Result<()> {
    let Some(session) = db.load_session()? else {
        println!("No session stored.");
        return Ok(());
    };
    let policy = ExpiryPolicy::from_env();

    println!("=== SPV Dashboard Session ===");
    println!("User:      {}", session.user);
    println!("Login at:  {}", format_timestamp(session.login_at_ms));
    println!("Policy:    {}", policy.describe());
    match session.expires_at(&policy) {
        Some(expiry) => println!("Expires:   {} (local)", expiry.format("%Y-%m-%d %H:%M:%S")),
        None => println!("Expires:   (unrepresentable login timestamp)"),
    }
    println!("Valid:     {}", if session.is_valid(&policy) { "yes" } else { "no" });

    Ok(())
}

fn cmd_list_drafts(db: &StateDb) -> Result<()> {
    let scopes = db.list_draft_scopes()?;
    if scopes.is_empty() {
        println!("No drafts stored.");
        return Ok(());
    }

    for scope in &scopes {
        let draft = db.load_draft_scope(scope)?;
        println!("{}  ({} items)", scope, draft.len());
    }
    println!("\nTotal: {} drafts", scopes.len());
    Ok(())
}

fn cmd_show_draft(db: &StateDb, mode: &str, outlet: &str) -> Result<()> {
    let mode = parse_mode(mode)?;
    let draft = db.load_draft(mode, outlet)?;

    if draft.is_empty() {
        println!("No {} draft for '{}'.", mode.as_str(), outlet);
        return Ok(());
    }

    println!("{:<12}  {:<10}  {}", "ITEM ID", "QTY", "NOTE");
    println!("{}", "-".repeat(60));
    for (item_id, entry) in &draft {
        let note = entry.note.chars().take(30).collect::<String>();
        println!("{:<12}  {:<10}  {}", item_id, entry.quantity, note);
    }
    println!("\nTotal: {} items", draft.len());
    Ok(())
}

fn cmd_clear(db: &StateDb, state: bool, session: bool, drafts: bool) -> Result<()> {
    if !state && !session && !drafts {
        anyhow::bail!("Nothing to clear. Pass --state, --session, and/or --drafts.");
    }

    if state {
        let existed = db.clear_state()?;
        println!("Cleared view state{}", if existed { "" } else { " (was empty)" });
    }
    if session {
        let existed = db.clear_session()?;
        println!("Cleared session{}", if existed { "" } else { " (was empty)" });
    }
    if drafts {
        let removed = db.clear_all_drafts()?;
        println!("Cleared {} drafts", removed);
    }

    Ok(())
}

fn cmd_export(db: &StateDb, format: &str) -> Result<()> {
    if format != "json" {
        anyhow::bail!("Unsupported format '{}'. Only 'json' is supported.", format);
    }

    let stats = db.stats()?;
    let state = db.load_state()?;
    let session = db.load_session()?;
    let deposit_log = db.list_deposit_log()?;

    let mut drafts = serde_json::Map::new();
    for scope in db.list_draft_scopes()? {
        let draft = db.load_draft_scope(&scope)?;
        drafts.insert(scope, serde_json::to_value(draft)?);
    }

    let export = serde_json::json!({
        "exported_at": Utc::now().to_rfc3339(),
        "stats": stats,
        "state": state,
        "session": session,
        "drafts": drafts,
        "deposit_log": deposit_log,
    });

    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mode_accepts_both_modes_case_insensitively() {
        assert_eq!(parse_mode("usage").unwrap(), StockMode::Usage);
        assert_eq!(parse_mode("OPNAME").unwrap(), StockMode::Opname);
    }

    #[test]
    fn parse_mode_rejects_unknown_values() {
        let err = parse_mode("audit").unwrap_err();
        assert!(err.to_string().contains("audit"));
    }

    #[test]
    fn format_timestamp_renders_epoch_millis_as_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_timestamp(1_700_000_000_000), "2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn format_timestamp_flags_unrepresentable_values() {
        assert!(format_timestamp(i64::MAX).starts_with("(invalid:"));
    }
}
