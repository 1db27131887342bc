//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod amount;
mod credential;
mod request;
mod transaction;
pub mod result;

pub use account::{Account, AccountBalance, AccountId, AccountStatus, NewAccount};
pub use amount::{Amount, MINOR_UNIT_SCALE};
pub use credential::{CredentialParams, MIN_PASSWORD_LEN};
pub use request::{
    CreateAccountRequest, DepositRequest, SignUpRequest, TransferRequest, WithdrawRequest,
};
pub use transaction::{NewTransactionRecord, TransactionKind, TransactionRecord};
