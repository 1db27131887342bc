//! Event log database migrations - embedded SQL files
//!
//! Kept apart from the ledger migrations because logs.duckdb is a separate
//! database file with its own sys_migrations table.

/// All log migrations, embedded at compile time.
/// Format: (filename, sql_content)
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_event_log.sql", include_str!("001_event_log.sql")),
];
