//! Transaction record domain model
//!
//! A record is the immutable audit entry for one committed balance-affecting
//! operation. Deposits reference only a receiver, withdrawals only a sender,
//! and transfers both, each with a before/after balance snapshot.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AccountId;

/// Kind of balance-affecting operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
            TransactionKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdraw" => Ok(TransactionKind::Withdraw),
            "transfer" => Ok(TransactionKind::Transfer),
            other => Err(format!("unknown transaction kind '{}'", other)),
        }
    }
}

/// A committed transaction as read back from the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub kind: TransactionKind,
    pub sender_id: Option<AccountId>,
    pub receiver_id: Option<AccountId>,
    pub amount: Decimal,
    pub sender_old_balance: Option<Decimal>,
    pub sender_new_balance: Option<Decimal>,
    pub receiver_old_balance: Option<Decimal>,
    pub receiver_new_balance: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Whether the account took part in this transaction on either side
    pub fn involves(&self, account_id: AccountId) -> bool {
        self.sender_id == Some(account_id) || self.receiver_id == Some(account_id)
    }

    /// Signed effect of this transaction on the given account's balance
    pub fn net_effect(&self, account_id: AccountId) -> Decimal {
        let mut effect = Decimal::ZERO;
        if self.receiver_id == Some(account_id) {
            effect += self.amount;
        }
        if self.sender_id == Some(account_id) {
            effect -= self.amount;
        }
        effect
    }
}

/// A record waiting to be appended inside an atomic unit
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransactionRecord {
    pub kind: TransactionKind,
    pub sender_id: Option<AccountId>,
    pub receiver_id: Option<AccountId>,
    pub amount: Decimal,
    pub sender_old_balance: Option<Decimal>,
    pub sender_new_balance: Option<Decimal>,
    pub receiver_old_balance: Option<Decimal>,
    pub receiver_new_balance: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl NewTransactionRecord {
    /// Credit to a single account
    pub fn deposit(account_id: AccountId, amount: Decimal, old: Decimal, new: Decimal) -> Self {
        Self {
            kind: TransactionKind::Deposit,
            sender_id: None,
            receiver_id: Some(account_id),
            amount,
            sender_old_balance: None,
            sender_new_balance: None,
            receiver_old_balance: Some(old),
            receiver_new_balance: Some(new),
            created_at: Utc::now(),
        }
    }

    /// Debit from a single account
    pub fn withdraw(account_id: AccountId, amount: Decimal, old: Decimal, new: Decimal) -> Self {
        Self {
            kind: TransactionKind::Withdraw,
            sender_id: Some(account_id),
            receiver_id: None,
            amount,
            sender_old_balance: Some(old),
            sender_new_balance: Some(new),
            receiver_old_balance: None,
            receiver_new_balance: None,
            created_at: Utc::now(),
        }
    }

    /// Movement between two accounts; balances are (old, new) pairs
    pub fn transfer(
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Decimal,
        sender: (Decimal, Decimal),
        receiver: (Decimal, Decimal),
    ) -> Self {
        Self {
            kind: TransactionKind::Transfer,
            sender_id: Some(sender_id),
            receiver_id: Some(receiver_id),
            amount,
            sender_old_balance: Some(sender.0),
            sender_new_balance: Some(sender.1),
            receiver_old_balance: Some(receiver.0),
            receiver_new_balance: Some(receiver.1),
            created_at: Utc::now(),
        }
    }

    /// Attach the store-assigned sequence number
    pub fn into_record(self, id: i64) -> TransactionRecord {
        TransactionRecord {
            id,
            kind: self.kind,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            amount: self.amount,
            sender_old_balance: self.sender_old_balance,
            sender_new_balance: self.sender_new_balance,
            receiver_old_balance: self.receiver_old_balance,
            receiver_new_balance: self.receiver_new_balance,
            created_at: self.created_at,
        }
    }
}
