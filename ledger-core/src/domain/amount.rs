//! Monetary amount with the ledger's precision rule
//!
//! The minor currency unit is one hundredth. Every amount entering the
//! engine must be strictly positive and carry at most two fractional digits
//! once trailing zeros are removed, so `10.00` and `10.000` are accepted
//! while `10.005` is rejected.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use super::result::{Error, Result};

/// Number of fractional digits in the minor unit
pub const MINOR_UNIT_SCALE: u32 = 2;

/// A validated, strictly positive amount of at most two decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Largest value a balance column can hold (`DECIMAL(18, 2)`)
    pub const MAX: Decimal = Decimal::from_parts(2_808_348_671, 232_830_643, 0, false, 2);

    /// Validate a raw decimal against the precision and sign rules
    pub fn new(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(Error::invalid_amount(format!(
                "amount must be greater than zero, got {}",
                value
            )));
        }
        let normalized = value.normalize();
        if normalized.scale() > MINOR_UNIT_SCALE {
            return Err(Error::invalid_amount(format!(
                "amount must be a multiple of 0.01, got {}",
                value
            )));
        }
        if normalized > Self::MAX {
            return Err(Error::invalid_amount(format!(
                "amount exceeds the maximum of {}",
                Self::MAX
            )));
        }
        let mut value = normalized;
        value.rescale(MINOR_UNIT_SCALE);
        Ok(Self(value))
    }

    /// The amount as a two-decimal-place value
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Add this amount to a balance, rejecting results the store cannot hold
    pub fn credit(&self, balance: Decimal) -> Result<Decimal> {
        let credited = balance
            .checked_add(self.0)
            .filter(|b| *b <= Self::MAX)
            .ok_or_else(|| {
                Error::invalid_amount(format!(
                    "resulting balance would exceed the maximum of {}",
                    Self::MAX
                ))
            })?;
        Ok(credited)
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let value = Decimal::from_str_exact(trimmed)
            .map_err(|_| Error::invalid_amount(format!("not a decimal number: '{}'", trimmed)))?;
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_two_decimal_places_accepted() {
        let amount = Amount::new(dec!(10.00)).unwrap();
        assert_eq!(amount.value(), dec!(10.00));
        assert_eq!(amount.value().scale(), 2);
    }

    #[test]
    fn test_three_decimal_places_rejected() {
        let err = Amount::new(dec!(10.005)).unwrap_err();
        assert!(matches!(err, Error::InvalidAmount(_)));
    }

    #[test]
    fn test_trailing_zeros_do_not_count_as_precision() {
        assert_eq!(Amount::new(dec!(10.000)).unwrap().value(), dec!(10));
        assert_eq!(Amount::new(dec!(0.1000)).unwrap().value(), dec!(0.10));
    }

    #[test]
    fn test_whole_amounts_are_rescaled() {
        let amount = Amount::new(dec!(7)).unwrap();
        assert_eq!(amount.to_string(), "7.00");
    }

    #[test]
    fn test_zero_and_negative_rejected() {
        assert!(matches!(Amount::new(dec!(0)), Err(Error::InvalidAmount(_))));
        assert!(matches!(Amount::new(dec!(0.00)), Err(Error::InvalidAmount(_))));
        assert!(matches!(Amount::new(dec!(-5.00)), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn test_smallest_unit_accepted() {
        assert_eq!(Amount::new(dec!(0.01)).unwrap().value(), dec!(0.01));
        assert!(Amount::new(dec!(0.009)).is_err());
    }

    #[test]
    fn test_max_is_decimal_18_2_limit() {
        assert_eq!(Amount::MAX, dec!(9999999999999999.99));
        assert!(Amount::new(dec!(9999999999999999.99)).is_ok());
        assert!(Amount::new(dec!(10000000000000000.00)).is_err());
    }

    #[test]
    fn test_credit_rejects_overflowing_balance() {
        let amount = Amount::new(dec!(0.02)).unwrap();
        assert_eq!(amount.credit(dec!(1.00)).unwrap(), dec!(1.02));
        assert!(matches!(
            amount.credit(dec!(9999999999999999.98)),
            Err(Error::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_parse_from_str() {
        assert_eq!("40.00".parse::<Amount>().unwrap().value(), dec!(40));
        assert_eq!(" 1.5 ".parse::<Amount>().unwrap().value(), dec!(1.50));
        assert!("abc".parse::<Amount>().is_err());
        assert!("10.005".parse::<Amount>().is_err());
        assert!("1e3".parse::<Amount>().is_err());
    }
}
