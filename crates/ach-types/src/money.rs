//! Currency amounts. Only `USD` is supported, matching the source
//! specification's explicit non-goal of multi-currency support; the type
//! still carries a currency code so a future currency is additive, not a
//! breaking change to every call site.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount must be positive, got {0}")]
    NotPositive(i64),
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),
}

/// An amount in integer minor units (cents, for USD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    currency: Currency,
    minor_units: i64,
}

impl Money {
    pub fn usd_cents(minor_units: i64) -> Result<Self, MoneyError> {
        if minor_units <= 0 {
            return Err(MoneyError::NotPositive(minor_units));
        }
        Ok(Self { currency: Currency::Usd, minor_units })
    }

    pub fn currency(&self) -> Currency { self.currency }
    pub fn minor_units(&self) -> i64 { self.minor_units }

    /// NACHA entry amounts are always rendered as an unsigned, zero-padded
    /// decimal string of cents (10 digits in a `EntryDetail.Amount` field).
    pub fn nacha_amount_field(&self) -> String {
        format!("{:010}", self.minor_units)
    }
}
