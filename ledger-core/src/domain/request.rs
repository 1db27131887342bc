//! Typed requests accepted by the services
//!
//! Gateways decode their input into these records; services never see raw
//! strings for ids or amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AccountId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub account_id: AccountId,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub account_id: AccountId,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub amount: Decimal,
}

/// Account creation without a credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    pub email: String,
}

/// Account creation with a password that is hashed before storage
#[derive(Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("name", &self.name)
            .field("age", &self.age)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transfer_request_from_json() {
        let request: TransferRequest =
            serde_json::from_str(r#"{"senderId": 1, "receiverId": 2, "amount": "40.00"}"#).unwrap();
        assert_eq!(request.sender_id, AccountId(1));
        assert_eq!(request.receiver_id, AccountId(2));
        assert_eq!(request.amount, dec!(40.00));
    }

    #[test]
    fn test_create_account_age_is_optional() {
        let request: CreateAccountRequest =
            serde_json::from_str(r#"{"name": "Alice", "email": "alice@example.com"}"#).unwrap();
        assert_eq!(request.age, None);
    }

    #[test]
    fn test_sign_up_debug_hides_password() {
        let request = SignUpRequest {
            name: "Alice".to_string(),
            age: None,
            email: "alice@example.com".to_string(),
            password: "hunter2hunter2".to_string(),
        };
        let debug = format!("{:?}", request);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
