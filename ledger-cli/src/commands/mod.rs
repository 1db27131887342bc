//! CLI command implementations

pub mod account;
pub mod balance;
pub mod export;
pub mod logs;
pub mod money;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use dialoguer::Password;
use ledger_core::config::Config;
use ledger_core::{AccountId, Amount, EntryPoint, Error, LedgerContext, LoggingService};
use rust_decimal::Decimal;
use tracing::debug;

const DATA_DIR_ENV: &str = "LEDGER_DIR";
const DEFAULT_DIR_NAME: &str = ".ledger";

/// Get the logging service for CLI operations
///
/// Returns None when the event log is disabled or fails to open; logging
/// never blocks a command.
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    let enabled = Config::load(&data_dir)
        .map(|config| config.logging.enabled)
        .unwrap_or(true);
    if !enabled {
        return None;
    }
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Data directory from `LEDGER_DIR`, or `~/.ledger`
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = dirs::home_dir().context("could not find home directory; set LEDGER_DIR")?;
    Ok(home.join(DEFAULT_DIR_NAME))
}

/// Open the ledger in the data directory
pub fn get_context() -> Result<LedgerContext> {
    let data_dir = get_data_dir()?;
    debug!(data_dir = %data_dir.display(), "opening ledger");
    LedgerContext::new(&data_dir).context("failed to open ledger")
}

/// Parse a user-supplied amount without rounding
///
/// Text that is not a positive decimal with at most two places is rejected
/// before the ledger is opened.
pub fn parse_amount(input: &str) -> Result<Decimal, Error> {
    input.parse::<Amount>().map(|amount| amount.value())
}

/// Ask for the account's password when it has one and none was given
///
/// Accounts created without a credential are not password-checked.
pub fn authorize(ctx: &LedgerContext, account_id: AccountId, password: Option<String>) -> Result<()> {
    let account = ctx.account_service.get_account(account_id)?;
    if account.credential_hash.is_none() {
        return Ok(());
    }

    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt(format!("Password for account {}", account_id))
            .interact()?,
    };
    ctx.account_service.verify_password(account_id, &password)?;
    Ok(())
}
