//! Status service - account and transaction summaries

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{AccountId, AccountStatus};
use crate::ports::LedgerStore;

/// Status service for ledger summaries
pub struct StatusService<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> StatusService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Get overall status summary
    ///
    /// Totals cover active accounts; deleted ones are listed but not counted.
    pub fn get_status(&self) -> Result<StatusSummary> {
        let accounts = self.store.list_accounts()?;
        let total_transactions = self.store.transaction_count()?;

        let active = accounts.iter().filter(|a| a.is_active());
        let total_accounts = active.clone().count() as i64;
        let total_balance = active.map(|a| a.balance).sum();

        Ok(StatusSummary {
            total_accounts,
            deleted_accounts: accounts.len() as i64 - total_accounts,
            total_balance,
            total_transactions,
            accounts: accounts
                .into_iter()
                .map(|a| AccountSummary {
                    id: a.id,
                    name: a.name,
                    balance: a.balance,
                    status: a.status,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_accounts: i64,
    pub deleted_accounts: i64,
    pub total_balance: Decimal,
    pub total_transactions: i64,
    pub accounts: Vec<AccountSummary>,
}

#[derive(Debug, Serialize)]
pub struct AccountSummary {
    pub id: AccountId,
    pub name: String,
    pub balance: Decimal,
    pub status: AccountStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::{DepositRequest, NewAccount};
    use crate::services::LedgerService;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_totals_skip_deleted_accounts() {
        let store = Arc::new(MemoryStore::new());
        let ledger = LedgerService::new(Arc::clone(&store));
        let status = StatusService::new(Arc::clone(&store));

        let mut ids = Vec::new();
        for (i, amount) in [dec!(10.00), dec!(2.50), dec!(7.25)].into_iter().enumerate() {
            let id = store
                .insert_account(&NewAccount::new("User", &format!("u{}@example.com", i)))
                .unwrap()
                .id;
            ledger
                .deposit(&DepositRequest {
                    account_id: id,
                    amount,
                })
                .unwrap();
            ids.push(id);
        }
        store.soft_delete_account(ids[2]).unwrap();

        let summary = status.get_status().unwrap();
        assert_eq!(summary.total_accounts, 2);
        assert_eq!(summary.deleted_accounts, 1);
        assert_eq!(summary.total_balance, dec!(12.50));
        assert_eq!(summary.total_transactions, 3);
        assert_eq!(summary.accounts.len(), 3);
    }

    #[test]
    fn test_empty_ledger() {
        let status = StatusService::new(Arc::new(MemoryStore::new()));
        let summary = status.get_status().unwrap();
        assert_eq!(summary.total_accounts, 0);
        assert_eq!(summary.total_balance, Decimal::ZERO);
    }
}
