//! Ledger service - the balance mutation engine
//!
//! Every mutation follows the same shape: validate the amount, open an atomic
//! unit over the touched accounts, re-read them inside the unit, check the
//! business rules, stage the balance updates and append exactly one
//! transaction record. Rule violations abort the unit before anything is
//! staged; failures after staging roll the whole unit back.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, AccountBalance, AccountId, Amount, DepositRequest, NewTransactionRecord,
    TransactionRecord, TransferRequest, WithdrawRequest,
};
use crate::ports::{LedgerStore, LedgerUnit};

/// Balances after a committed transfer
#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    pub sender_balance: Decimal,
    pub receiver_balance: Decimal,
    pub record: TransactionRecord,
}

/// Balance ledger engine
///
/// Holds no mutable state of its own; all shared state lives in the store.
pub struct LedgerService<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> LedgerService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Credit an account, returning its new balance
    pub fn deposit(&self, request: &DepositRequest) -> Result<Decimal> {
        let account_id = request.account_id;
        let result = Amount::new(request.amount).and_then(|amount| {
            self.store.atomically(&[account_id], |unit| {
                let account = load_active(unit, account_id)?;
                let new_balance = amount.credit(account.balance)?;

                unit.update_balance(account_id, new_balance)?;
                unit.append_transaction(&NewTransactionRecord::deposit(
                    account_id,
                    amount.value(),
                    account.balance,
                    new_balance,
                ))?;
                Ok(new_balance)
            })
        });
        log_outcome("deposit", &[account_id], &result);
        result
    }

    /// Debit an account, returning its new balance
    pub fn withdraw(&self, request: &WithdrawRequest) -> Result<Decimal> {
        let account_id = request.account_id;
        let result = Amount::new(request.amount).and_then(|amount| {
            self.store.atomically(&[account_id], |unit| {
                let account = load_active(unit, account_id)?;
                let new_balance = debit(&account, amount)?;

                unit.update_balance(account_id, new_balance)?;
                unit.append_transaction(&NewTransactionRecord::withdraw(
                    account_id,
                    amount.value(),
                    account.balance,
                    new_balance,
                ))?;
                Ok(new_balance)
            })
        });
        log_outcome("withdraw", &[account_id], &result);
        result
    }

    /// Move an amount from one account to another
    ///
    /// The sender is validated and staged before the receiver. Both balance
    /// updates and the single transfer record commit together.
    pub fn transfer(&self, request: &TransferRequest) -> Result<TransferOutcome> {
        let (sender_id, receiver_id) = (request.sender_id, request.receiver_id);
        let result = self.validate_transfer(request).and_then(|amount| {
            self.store.atomically(&[sender_id, receiver_id], |unit| {
                let sender = load_active(unit, sender_id)?;
                let receiver = load_active(unit, receiver_id)?;

                let sender_balance = debit(&sender, amount)?;
                let receiver_balance = amount.credit(receiver.balance)?;

                unit.update_balance(sender_id, sender_balance)?;
                unit.update_balance(receiver_id, receiver_balance)?;
                let record = unit.append_transaction(&NewTransactionRecord::transfer(
                    sender_id,
                    receiver_id,
                    amount.value(),
                    (sender.balance, sender_balance),
                    (receiver.balance, receiver_balance),
                ))?;

                Ok(TransferOutcome {
                    sender_balance,
                    receiver_balance,
                    record,
                })
            })
        });
        log_outcome("transfer", &[sender_id, receiver_id], &result);
        result
    }

    fn validate_transfer(&self, request: &TransferRequest) -> Result<Amount> {
        let amount = Amount::new(request.amount)?;
        if request.sender_id == request.receiver_id {
            return Err(Error::SelfTransfer(request.sender_id));
        }
        Ok(amount)
    }

    /// Current balance of an active account
    pub fn balance(&self, account_id: AccountId) -> Result<Decimal> {
        match self.store.get_account(account_id)? {
            Some(account) if account.is_active() => Ok(account.balance),
            _ => Err(Error::AccountNotFound(account_id)),
        }
    }

    /// Balances of every active account
    pub fn balances(&self) -> Result<Vec<AccountBalance>> {
        self.store.list_balances()
    }

    /// Transaction records involving an account, oldest first
    ///
    /// Deleted accounts keep their history, so only unknown ids are rejected.
    pub fn history(&self, account_id: AccountId) -> Result<Vec<TransactionRecord>> {
        if self.store.get_account(account_id)?.is_none() {
            return Err(Error::AccountNotFound(account_id));
        }
        self.store.list_transactions(Some(account_id))
    }
}

/// Load an account inside a unit, treating deleted accounts as missing
fn load_active(unit: &mut dyn LedgerUnit, account_id: AccountId) -> Result<Account> {
    match unit.load_account(account_id)? {
        Some(account) if account.is_active() => Ok(account),
        _ => Err(Error::AccountNotFound(account_id)),
    }
}

fn debit(account: &Account, amount: Amount) -> Result<Decimal> {
    if account.balance < amount.value() {
        return Err(Error::InsufficientBalance {
            account_id: account.id,
            available: account.balance,
            requested: amount.value(),
        });
    }
    Ok(account.balance - amount.value())
}

fn log_outcome<T>(operation: &str, accounts: &[AccountId], result: &Result<T>) {
    let accounts: Vec<i64> = accounts.iter().map(AccountId::as_i64).collect();
    match result {
        Ok(_) => info!(operation, ?accounts, "committed"),
        Err(e) if e.is_rejection() => {
            warn!(operation, ?accounts, kind = e.kind().as_str(), "rejected")
        }
        Err(e) => error!(operation, ?accounts, error = %e, "rolled back"),
    }
}
