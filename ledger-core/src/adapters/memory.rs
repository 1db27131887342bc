//! In-process ledger store
//!
//! Keeps accounts and the transaction log behind a mutex. Atomic units stage
//! their writes locally and apply them in one step on commit. A one-shot
//! failure can be armed to exercise rollback paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;

use crate::adapters::locks::AccountLocks;
use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, AccountBalance, AccountId, AccountStatus, NewAccount, NewTransactionRecord,
    TransactionRecord,
};
use crate::ports::{LedgerStore, LedgerUnit};

/// Point inside an atomic unit where an armed failure fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// Staging a balance update for this account
    UpdateBalance(AccountId),
    /// Appending a transaction record
    Append,
    /// Committing the unit
    Commit,
}

#[derive(Debug, Default)]
struct State {
    accounts: BTreeMap<AccountId, Account>,
    transactions: Vec<TransactionRecord>,
    next_account_id: i64,
    next_transaction_id: i64,
}

impl State {
    fn next_transaction_id(&mut self) -> i64 {
        self.next_transaction_id += 1;
        self.next_transaction_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    locks: AccountLocks,
    armed: Mutex<Option<FailurePoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next unit that reaches `point` fail with a persistence error
    pub fn fail_next(&self, point: FailurePoint) {
        *self.armed.lock().unwrap_or_else(PoisonError::into_inner) = Some(point);
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn trip(&self, point: FailurePoint) -> Result<()> {
        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        if *armed == Some(point) {
            *armed = None;
            return Err(Error::persistence(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }
}

struct MemoryUnit<'a> {
    store: &'a MemoryStore,
    balances: HashMap<AccountId, Decimal>,
    records: Vec<TransactionRecord>,
}

impl LedgerUnit for MemoryUnit<'_> {
    fn load_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        let account = self.store.state().accounts.get(&id).cloned();
        Ok(account.map(|mut account| {
            if let Some(balance) = self.balances.get(&id) {
                account.balance = *balance;
            }
            account
        }))
    }

    fn update_balance(&mut self, id: AccountId, balance: Decimal) -> Result<()> {
        self.store.trip(FailurePoint::UpdateBalance(id))?;
        if balance < Decimal::ZERO {
            return Err(Error::persistence(format!(
                "balance of account {} would become negative",
                id
            )));
        }
        if !self.store.state().accounts.contains_key(&id) {
            return Err(Error::AccountNotFound(id));
        }
        self.balances.insert(id, balance);
        Ok(())
    }

    fn append_transaction(&mut self, record: &NewTransactionRecord) -> Result<TransactionRecord> {
        self.store.trip(FailurePoint::Append)?;
        let id = self.store.state().next_transaction_id();
        let record = record.clone().into_record(id);
        self.records.push(record.clone());
        Ok(record)
    }
}

impl LedgerStore for MemoryStore {
    fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        Ok(self.state().accounts.get(&id).cloned())
    }

    fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let email = Account::normalize_email(email);
        Ok(self
            .state()
            .accounts
            .values()
            .find(|a| a.is_active() && a.email == email)
            .cloned())
    }

    fn insert_account(&self, account: &NewAccount) -> Result<Account> {
        let mut state = self.state();
        let email = Account::normalize_email(&account.email);
        if state
            .accounts
            .values()
            .any(|a| a.is_active() && a.email == email)
        {
            return Err(Error::EmailTaken(email));
        }

        state.next_account_id += 1;
        let now = Utc::now();
        let created = Account {
            id: AccountId(state.next_account_id),
            name: account.name.clone(),
            age: account.age,
            email,
            balance: Decimal::new(0, 2),
            credential_hash: account.credential_hash.clone(),
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(created.id, created.clone());
        Ok(created)
    }

    fn soft_delete_account(&self, id: AccountId) -> Result<bool> {
        self.locks.hold(&[id], || {
            let mut state = self.state();
            match state.accounts.get_mut(&id) {
                Some(account) if account.is_active() => {
                    account.status = AccountStatus::Deleted;
                    account.updated_at = Utc::now();
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn list_balances(&self) -> Result<Vec<AccountBalance>> {
        Ok(self
            .state()
            .accounts
            .values()
            .filter(|a| a.is_active())
            .map(|a| AccountBalance {
                id: a.id,
                balance: a.balance,
            })
            .collect())
    }

    fn list_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.state().accounts.values().cloned().collect())
    }

    fn list_transactions(&self, account: Option<AccountId>) -> Result<Vec<TransactionRecord>> {
        let mut records: Vec<TransactionRecord> = self
            .state()
            .transactions
            .iter()
            .filter(|r| account.map_or(true, |id| r.involves(id)))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    fn transaction_count(&self) -> Result<i64> {
        Ok(self.state().transactions.len() as i64)
    }

    fn atomically<T, F>(&self, accounts: &[AccountId], work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn LedgerUnit) -> Result<T>,
    {
        self.locks.hold(accounts, || {
            let mut unit = MemoryUnit {
                store: self,
                balances: HashMap::new(),
                records: Vec::new(),
            };
            let value = work(&mut unit)?;
            self.trip(FailurePoint::Commit)?;

            let MemoryUnit {
                balances, records, ..
            } = unit;
            let mut state = self.state();
            let now = Utc::now();
            for (id, balance) in balances {
                if let Some(account) = state.accounts.get_mut(&id) {
                    account.balance = balance;
                    account.updated_at = now;
                }
            }
            state.transactions.extend(records);
            Ok(value)
        })
    }
}
