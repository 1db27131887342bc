//! Ledger store port - account store and transaction log abstraction

use rust_decimal::Decimal;

use crate::domain::result::Result;
use crate::domain::{
    Account, AccountBalance, AccountId, NewAccount, NewTransactionRecord, TransactionRecord,
};

/// Writes available inside one atomic unit
///
/// Everything staged through a unit becomes visible together when the unit
/// commits, or not at all.
pub trait LedgerUnit {
    /// Read an account as seen by this unit, including its own staged writes
    fn load_account(&mut self, id: AccountId) -> Result<Option<Account>>;

    /// Stage a new balance for an account
    fn update_balance(&mut self, id: AccountId, balance: Decimal) -> Result<()>;

    /// Stage one transaction record; the store assigns its id
    fn append_transaction(&mut self, record: &NewTransactionRecord) -> Result<TransactionRecord>;
}

/// Account store and append-only transaction log
///
/// Implementations (adapters) own persistence and the per-account locking
/// that serialises atomic units touching the same account.
pub trait LedgerStore: Send + Sync {
    // === Accounts ===

    /// Get an account by id, whatever its status
    fn get_account(&self, id: AccountId) -> Result<Option<Account>>;

    /// Get the active account registered under an email
    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Insert a new account with a zero balance
    ///
    /// Fails with `EmailTaken` when an active account already uses the email.
    fn insert_account(&self, account: &NewAccount) -> Result<Account>;

    /// Mark an active account deleted; returns false if there was nothing to delete
    fn soft_delete_account(&self, id: AccountId) -> Result<bool>;

    /// Balances of all active accounts
    fn list_balances(&self) -> Result<Vec<AccountBalance>>;

    /// All accounts, including deleted ones
    fn list_accounts(&self) -> Result<Vec<Account>>;

    // === Transaction log ===

    /// Records in ascending id order, optionally restricted to one account
    fn list_transactions(&self, account: Option<AccountId>) -> Result<Vec<TransactionRecord>>;

    fn transaction_count(&self) -> Result<i64>;

    // === Atomic units ===

    /// Run `work` as one atomic unit over the given accounts
    ///
    /// Locks for `accounts` are taken in ascending id order before the unit
    /// starts and held until it commits (on `Ok`) or rolls back (on `Err`).
    /// `work` must only touch accounts it declared.
    fn atomically<T, F>(&self, accounts: &[AccountId], work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn LedgerUnit) -> Result<T>;
}
