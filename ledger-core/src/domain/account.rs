//! Account domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Store-assigned account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl AccountId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for AccountId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an account
///
/// Deleted accounts keep their row for audit but are invisible to every
/// balance operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Deleted,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Deleted => "deleted",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "deleted" => Ok(AccountStatus::Deleted),
            other => Err(format!("unknown account status '{}'", other)),
        }
    }
}

/// An account holding a non-negative balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub age: Option<u32>,
    pub email: String,
    pub balance: Decimal,
    /// Argon2id credential, absent for accounts created without sign-up
    #[serde(skip_serializing)]
    pub credential_hash: Option<String>,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Normalize an email for storage and lookup
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

/// Account attributes supplied on creation; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub age: Option<u32>,
    pub email: String,
    pub credential_hash: Option<String>,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, email: &str) -> Self {
        Self {
            name: name.into().trim().to_string(),
            age: None,
            email: Account::normalize_email(email),
            credential_hash: None,
        }
    }

    pub fn with_age(mut self, age: Option<u32>) -> Self {
        self.age = age;
        self
    }

    pub fn with_credential(mut self, hash: impl Into<String>) -> Self {
        self.credential_hash = Some(hash.into());
        self
    }

    /// Validate account data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("account name cannot be empty");
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err("email cannot be empty");
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => return Err("email is not a valid address"),
        }
        if matches!(self.age, Some(age) if age > 150) {
            return Err("age is out of range");
        }
        Ok(())
    }
}

/// Account identifier paired with its current balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub id: AccountId,
    pub balance: Decimal,
}
