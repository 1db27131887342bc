//! Ledger Core - per-account balances with an immutable transaction log
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Account, TransactionRecord, Amount, etc.)
//! - **ports**: Trait definitions for the account store and transaction log
//! - **services**: Business logic orchestration (the ledger engine and friends)
//! - **adapters**: Concrete implementations (DuckDB, in-memory, account locks)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::duckdb::DuckDbStore;
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, ErrorKind, OperationResult};
pub use domain::{
    Account, AccountBalance, AccountId, AccountStatus, Amount, CreateAccountRequest,
    DepositRequest, SignUpRequest, TransactionKind, TransactionRecord, TransferRequest,
    WithdrawRequest,
};
pub use services::{EntryPoint, LogEvent, LoggingService};

/// Main context for ledger operations
///
/// Owns the store handle and every service built on it. There is no global
/// state; gateways create one context and pass it where it is needed.
pub struct LedgerContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub store: Arc<DuckDbStore>,
    pub ledger_service: LedgerService<DuckDbStore>,
    pub account_service: AccountService<DuckDbStore>,
    pub status_service: StatusService<DuckDbStore>,
    pub export_service: ExportService<DuckDbStore>,
}

impl LedgerContext {
    /// Open the ledger in a data directory, creating it if needed
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
        let config = Config::load(data_dir)?;

        let db_path = config.db_path(data_dir);
        let store = Arc::new(
            DuckDbStore::open(&db_path)
                .with_context(|| format!("failed to open ledger {}", db_path.display()))?,
        );

        let hasher = CredentialHasher::new(config.credentials.clone());
        let ledger_service = LedgerService::new(Arc::clone(&store));
        let account_service = AccountService::new(Arc::clone(&store), hasher);
        let status_service = StatusService::new(Arc::clone(&store));
        let export_service = ExportService::new(Arc::clone(&store));

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            store,
            ledger_service,
            account_service,
            status_service,
            export_service,
        })
    }
}
