//! Logs command - view and manage the operational event log

use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use ledger_core::{EntryPoint, LoggingService};
use serde_json::json;

use super::get_data_dir;
use crate::output;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only failed commands
        #[arg(long)]
        errors: bool,
    },
    /// Clear old log entries
    Clear {
        /// Delete logs older than N days
        #[arg(long, default_value = "30", conflicts_with = "all")]
        older_than_days: u32,
        /// Delete every entry
        #[arg(long)]
        all: bool,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// Show log statistics and database path
    Stats,
}

fn get_logging_service() -> Result<LoggingService> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

fn format_timestamp(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

pub fn run(command: LogsCommands, json: bool) -> Result<()> {
    match command {
        LogsCommands::List { limit, errors } => run_list(limit, errors, json),
        LogsCommands::Clear {
            older_than_days,
            all,
            force,
        } => run_clear(older_than_days, all, force, json),
        LogsCommands::Stats => run_stats(json),
    }
}

fn run_list(limit: usize, errors: bool, json: bool) -> Result<()> {
    let service = get_logging_service()?;
    let entries = if errors {
        service.get_errors(limit)?
    } else {
        service.get_recent(limit)?
    };

    if json {
        return output::json(&entries);
    }
    if entries.is_empty() {
        println!("No log entries found.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Entry", "Event", "Command", "Error"]);
    for entry in entries {
        let error = entry
            .error_kind
            .map(|kind| kind.red().to_string())
            .unwrap_or_default();
        table.add_row(vec![
            format_timestamp(entry.timestamp),
            entry.entry_point,
            entry.event,
            entry.command.unwrap_or_default(),
            error,
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn run_clear(older_than_days: u32, all: bool, force: bool, json: bool) -> Result<()> {
    let service = get_logging_service()?;

    if !force && !json {
        let prompt = if all {
            "Delete all log entries?".to_string()
        } else {
            format!("Delete logs older than {} days?", older_than_days)
        };
        if !Confirm::new().with_prompt(prompt).default(false).interact()? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let deleted = if all {
        service.clear()?
    } else {
        let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
        service.delete_before(cutoff.timestamp_millis())?
    };

    if json {
        output::json(json!({ "deleted": deleted }))
    } else {
        println!("Deleted {} log entries", deleted);
        Ok(())
    }
}

fn run_stats(json: bool) -> Result<()> {
    let service = get_logging_service()?;
    let total = service.count()?;
    let counts = service.event_counts()?;
    let db_path = service.db_path().to_path_buf();
    let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    if json {
        return output::json(json!({
            "total_entries": total,
            "events": counts,
            "database_path": db_path.to_string_lossy(),
            "database_size_bytes": size_bytes,
        }));
    }

    println!("{}", "Log Statistics".bold());
    println!("  Total entries: {}", total);
    println!("  Database: {}", db_path.display());
    println!("  Size: {}", output::format_size(size_bytes));

    if !counts.is_empty() {
        println!();
        let mut table = output::create_table();
        table.set_header(vec!["Event", "Count"]);
        for count in counts {
            table.add_row(vec![count.event, count.count.to_string()]);
        }
        println!("{}", table);
    }
    Ok(())
}
