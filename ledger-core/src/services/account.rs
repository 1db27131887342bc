//! Account service - registration, lookup and soft delete

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, AccountId, CreateAccountRequest, NewAccount, SignUpRequest, MIN_PASSWORD_LEN,
};
use crate::ports::LedgerStore;
use crate::services::CredentialHasher;

pub struct AccountService<S: LedgerStore> {
    store: Arc<S>,
    hasher: CredentialHasher,
}

impl<S: LedgerStore> AccountService<S> {
    pub fn new(store: Arc<S>, hasher: CredentialHasher) -> Self {
        Self { store, hasher }
    }

    /// Create an account with a zero balance and no credential
    pub fn create_account(&self, request: &CreateAccountRequest) -> Result<Account> {
        let account = NewAccount::new(&request.name, &request.email).with_age(request.age);
        self.register(account)
    }

    /// Create an account protected by a password
    pub fn sign_up(&self, request: &SignUpRequest) -> Result<Account> {
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let account = NewAccount::new(&request.name, &request.email).with_age(request.age);
        // Validate before paying for the hash
        account.validate().map_err(Error::validation)?;
        let credential = self.hasher.hash(&request.password)?;
        self.register(account.with_credential(credential))
    }

    fn register(&self, account: NewAccount) -> Result<Account> {
        account.validate().map_err(Error::validation)?;
        let created = self.store.insert_account(&account)?;
        info!(account_id = created.id.as_i64(), "account created");
        Ok(created)
    }

    /// Resolve the active account for an email and password
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Account> {
        let Some(account) = self.store.get_account_by_email(email)? else {
            return Err(Error::InvalidCredentials);
        };
        self.check_password(account, password)
    }

    /// Confirm a password for a known account
    ///
    /// Accounts created without a credential accept no password.
    pub fn verify_password(&self, account_id: AccountId, password: &str) -> Result<Account> {
        let account = self.get_account(account_id)?;
        self.check_password(account, password)
    }

    fn check_password(&self, account: Account, password: &str) -> Result<Account> {
        let verified = match account.credential_hash.as_deref() {
            Some(stored) => self.hasher.verify(password, stored)?,
            None => false,
        };
        if !verified {
            warn!(account_id = account.id.as_i64(), "credential check failed");
            return Err(Error::InvalidCredentials);
        }
        Ok(account)
    }

    /// Get an active account
    pub fn get_account(&self, account_id: AccountId) -> Result<Account> {
        match self.store.get_account(account_id)? {
            Some(account) if account.is_active() => Ok(account),
            _ => Err(Error::AccountNotFound(account_id)),
        }
    }

    /// Soft-delete an account; its row and history are retained
    ///
    /// Any remaining balance stays on the deleted row and is no longer part
    /// of `balances()` or the status totals. Callers that must not drop funds
    /// withdraw or transfer them out first.
    pub fn delete_account(&self, account_id: AccountId) -> Result<()> {
        if !self.store.soft_delete_account(account_id)? {
            return Err(Error::AccountNotFound(account_id));
        }
        info!(account_id = account_id.as_i64(), "account deleted");
        Ok(())
    }
}
