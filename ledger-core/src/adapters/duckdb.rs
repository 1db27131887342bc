//! DuckDB ledger store implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, Connection, OptionalExt};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::adapters::locks::AccountLocks;
use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, AccountBalance, AccountId, AccountStatus, NewAccount, NewTransactionRecord,
    TransactionKind, TransactionRecord,
};
use crate::ports::{LedgerStore, LedgerUnit};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Timestamp layout written into TIMESTAMP columns
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const ACCOUNT_COLUMNS: &str = "account_id, name, age, email, balance::VARCHAR, credential_hash,
     status, created_at::VARCHAR, updated_at::VARCHAR";

const TRANSACTION_COLUMNS: &str = "transaction_id, kind, sender_id, receiver_id, amount::VARCHAR,
     sender_old_balance::VARCHAR, sender_new_balance::VARCHAR,
     receiver_old_balance::VARCHAR, receiver_new_balance::VARCHAR, created_at::VARCHAR";

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
        || lower.contains("could not set lock on file")
}

/// Delay before the given retry attempt (zero-based)
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt))
}

/// DuckDB-backed account store and transaction log
///
/// Reads and account registration go through a shared connection. Every
/// atomic unit runs on its own cloned connection inside a DuckDB transaction,
/// so units over disjoint accounts do not wait on each other.
pub struct DuckDbStore {
    conn: Mutex<Connection>,
    locks: AccountLocks,
    db_path: Option<PathBuf>,
}

impl DuckDbStore {
    /// Open (or create) a ledger database file and apply pending migrations
    ///
    /// Opening retries with exponential backoff while another process holds
    /// the file lock.
    pub fn open(db_path: &Path) -> Result<Self> {
        let mut attempt = 0;
        let conn = loop {
            match Self::try_open_connection(db_path) {
                Ok(conn) => break conn,
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay = retry_delay(attempt);
                        warn!(
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            delay_ms = delay.as_millis() as u64,
                            "database busy, retrying: {}",
                            err_msg
                        );
                        thread::sleep(delay);
                        attempt += 1;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        };

        Self::with_connection(conn, Some(db_path.to_path_buf()))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            locks: AccountLocks::new(),
            db_path,
        };
        let migrations = store.run_migrations()?;
        if !migrations.applied.is_empty() {
            debug!(applied = ?migrations.applied, "applied ledger migrations");
        }
        Ok(store)
    }

    /// Attempt to open a database connection (called by open() with retry logic)
    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Extension autoloading stays off; the ledger uses only core types
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.connection();
        MigrationService::new(&conn)
            .run_pending()
            .map_err(|e| Error::persistence(format!("migration failed: {:#}", e)))
    }

    /// Path of the database file, `None` for in-memory stores
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A fresh connection to the same database for one atomic unit
    fn unit_connection(&self) -> Result<Connection> {
        Ok(self.connection().try_clone()?)
    }
}

/// One atomic unit running inside a DuckDB transaction
struct DuckDbUnit<'a> {
    conn: &'a Connection,
}

impl LedgerUnit for DuckDbUnit<'_> {
    fn load_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        fetch_account(self.conn, id)
    }

    fn update_balance(&mut self, id: AccountId, balance: Decimal) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE sys_accounts
             SET balance = CAST(? AS DECIMAL(18, 2)), updated_at = CAST(? AS TIMESTAMP)
             WHERE account_id = ?",
            params![balance.to_string(), format_timestamp(&Utc::now()), id.as_i64()],
        )?;
        if updated == 0 {
            return Err(Error::AccountNotFound(id));
        }
        Ok(())
    }

    fn append_transaction(&mut self, record: &NewTransactionRecord) -> Result<TransactionRecord> {
        let id: i64 = self.conn.query_row(
            "INSERT INTO sys_transactions (
                kind, sender_id, receiver_id, amount,
                sender_old_balance, sender_new_balance,
                receiver_old_balance, receiver_new_balance, created_at
             ) VALUES (
                ?, ?, ?, CAST(? AS DECIMAL(18, 2)),
                CAST(? AS DECIMAL(18, 2)), CAST(? AS DECIMAL(18, 2)),
                CAST(? AS DECIMAL(18, 2)), CAST(? AS DECIMAL(18, 2)), CAST(? AS TIMESTAMP)
             )
             RETURNING transaction_id",
            params![
                record.kind.as_str(),
                record.sender_id.map(|id| id.as_i64()),
                record.receiver_id.map(|id| id.as_i64()),
                record.amount.to_string(),
                record.sender_old_balance.map(|d| d.to_string()),
                record.sender_new_balance.map(|d| d.to_string()),
                record.receiver_old_balance.map(|d| d.to_string()),
                record.receiver_new_balance.map(|d| d.to_string()),
                format_timestamp(&record.created_at),
            ],
            |row| row.get(0),
        )?;
        Ok(record.clone().into_record(id))
    }
}

impl LedgerStore for DuckDbStore {
    fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        fetch_account(&self.connection(), id)
    }

    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_accounts WHERE email = ? AND status = 'active'",
            ACCOUNT_COLUMNS
        ))?;
        let row = stmt
            .query_row([Account::normalize_email(email)], AccountRow::from_row)
            .optional()?;
        row.map(AccountRow::into_account).transpose()
    }

    fn insert_account(&self, account: &NewAccount) -> Result<Account> {
        // The shared connection lock makes the email check and insert one step
        let conn = self.connection();
        let email = Account::normalize_email(&account.email);

        let taken: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sys_accounts WHERE email = ? AND status = 'active'",
            [&email],
            |row| row.get(0),
        )?;
        if taken > 0 {
            return Err(Error::EmailTaken(email));
        }

        let now = format_timestamp(&Utc::now());
        let id: i64 = conn.query_row(
            "INSERT INTO sys_accounts (name, age, email, credential_hash, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, 'active', CAST(? AS TIMESTAMP), CAST(? AS TIMESTAMP))
             RETURNING account_id",
            params![
                &account.name,
                account.age.map(|a| a as i32),
                &email,
                &account.credential_hash,
                &now,
                &now,
            ],
            |row| row.get(0),
        )?;

        fetch_account(&conn, AccountId(id))?
            .ok_or_else(|| Error::persistence(format!("account {} vanished after insert", id)))
    }

    fn soft_delete_account(&self, id: AccountId) -> Result<bool> {
        self.locks.hold(&[id], || {
            let updated = self.connection().execute(
                "UPDATE sys_accounts
                 SET status = 'deleted', updated_at = CAST(? AS TIMESTAMP)
                 WHERE account_id = ? AND status = 'active'",
                params![format_timestamp(&Utc::now()), id.as_i64()],
            )?;
            Ok(updated > 0)
        })
    }

    fn list_balances(&self) -> Result<Vec<AccountBalance>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT account_id, balance::VARCHAR FROM sys_accounts
             WHERE status = 'active'
             ORDER BY account_id",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<duckdb::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, balance)| {
                Ok(AccountBalance {
                    id: AccountId(id),
                    balance: parse_decimal(&balance)?,
                })
            })
            .collect()
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_accounts ORDER BY account_id",
            ACCOUNT_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], AccountRow::from_row)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        rows.into_iter().map(AccountRow::into_account).collect()
    }

    fn list_transactions(&self, account: Option<AccountId>) -> Result<Vec<TransactionRecord>> {
        let conn = self.connection();
        let rows = match account {
            Some(id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM sys_transactions
                     WHERE sender_id = ? OR receiver_id = ?
                     ORDER BY transaction_id",
                    TRANSACTION_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![id.as_i64(), id.as_i64()], TransactionRow::from_row)?
                    .collect::<duckdb::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM sys_transactions ORDER BY transaction_id",
                    TRANSACTION_COLUMNS
                ))?;
                let rows = stmt
                    .query_map([], TransactionRow::from_row)?
                    .collect::<duckdb::Result<Vec<_>>>()?;
                rows
            }
        };
        rows.into_iter().map(TransactionRow::into_record).collect()
    }

    fn transaction_count(&self) -> Result<i64> {
        let count: i64 =
            self.connection()
                .query_row("SELECT COUNT(*) FROM sys_transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    fn atomically<T, F>(&self, accounts: &[AccountId], work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn LedgerUnit) -> Result<T>,
    {
        self.locks.hold(accounts, || {
            let mut conn = self.unit_connection()?;
            let tx = conn.transaction()?;

            let outcome = {
                let mut unit = DuckDbUnit { conn: &tx };
                work(&mut unit)
            };

            match outcome {
                Ok(value) => {
                    tx.commit()?;
                    Ok(value)
                }
                Err(e) => {
                    if let Err(rollback) = tx.rollback() {
                        warn!(error = %rollback, "rollback failed");
                    }
                    Err(e)
                }
            }
        })
    }
}

// Row mapping

fn fetch_account(conn: &Connection, id: AccountId) -> Result<Option<Account>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM sys_accounts WHERE account_id = ?",
        ACCOUNT_COLUMNS
    ))?;
    let row = stmt
        .query_row([id.as_i64()], AccountRow::from_row)
        .optional()?;
    row.map(AccountRow::into_account).transpose()
}

/// Raw column values of an account row, converted strictly afterwards
struct AccountRow {
    id: i64,
    name: String,
    age: Option<i32>,
    email: String,
    balance: String,
    credential_hash: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl AccountRow {
    fn from_row(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            age: row.get(2)?,
            email: row.get(3)?,
            balance: row.get(4)?,
            credential_hash: row.get(5)?,
            status: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_account(self) -> Result<Account> {
        let age = self
            .age
            .map(|a| {
                u32::try_from(a)
                    .map_err(|_| Error::persistence(format!("account {} has age {}", self.id, a)))
            })
            .transpose()?;

        Ok(Account {
            id: AccountId(self.id),
            name: self.name,
            age,
            email: self.email,
            balance: parse_decimal(&self.balance)?,
            credential_hash: self.credential_hash,
            status: self.status.parse::<AccountStatus>().map_err(Error::Persistence)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

struct TransactionRow {
    id: i64,
    kind: String,
    sender_id: Option<i64>,
    receiver_id: Option<i64>,
    amount: String,
    sender_old_balance: Option<String>,
    sender_new_balance: Option<String>,
    receiver_old_balance: Option<String>,
    receiver_new_balance: Option<String>,
    created_at: String,
}

impl TransactionRow {
    fn from_row(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            kind: row.get(1)?,
            sender_id: row.get(2)?,
            receiver_id: row.get(3)?,
            amount: row.get(4)?,
            sender_old_balance: row.get(5)?,
            sender_new_balance: row.get(6)?,
            receiver_old_balance: row.get(7)?,
            receiver_new_balance: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_record(self) -> Result<TransactionRecord> {
        Ok(TransactionRecord {
            id: self.id,
            kind: self.kind.parse::<TransactionKind>().map_err(Error::Persistence)?,
            sender_id: self.sender_id.map(AccountId),
            receiver_id: self.receiver_id.map(AccountId),
            amount: parse_decimal(&self.amount)?,
            sender_old_balance: parse_optional_decimal(self.sender_old_balance)?,
            sender_new_balance: parse_optional_decimal(self.sender_new_balance)?,
            receiver_old_balance: parse_optional_decimal(self.receiver_old_balance)?,
            receiver_new_balance: parse_optional_decimal(self.receiver_new_balance)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

// Helper functions

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str_exact(s.trim())
        .map_err(|e| Error::persistence(format!("invalid stored decimal '{}': {}", s, e)))
}

fn parse_optional_decimal(s: Option<String>) -> Result<Option<Decimal>> {
    s.as_deref().map(parse_decimal).transpose()
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    // DuckDB renders TIMESTAMP as "2024-01-01 12:00:00" with an optional fraction
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::persistence(format!("invalid stored timestamp '{}': {}", s, e)))
}
