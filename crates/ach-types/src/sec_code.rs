//! Standard Entry Class codes.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecEntryClass {
    /// Prearranged Payment and Deposit (consumer).
    Ppd,
    /// Corporate Credit or Debit.
    Ccd,
    /// International ACH Transaction.
    Iat,
    /// Telephone-authorized.
    Tel,
    /// Internet-authorized.
    Web,
}

impl SecEntryClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecEntryClass::Ppd => "PPD",
            SecEntryClass::Ccd => "CCD",
            SecEntryClass::Iat => "IAT",
            SecEntryClass::Tel => "TEL",
            SecEntryClass::Web => "WEB",
        }
    }
}

impl fmt::Display for SecEntryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str()) }
}

impl std::str::FromStr for SecEntryClass {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PPD" => Ok(SecEntryClass::Ppd),
            "CCD" => Ok(SecEntryClass::Ccd),
            "IAT" => Ok(SecEntryClass::Iat),
            "TEL" => Ok(SecEntryClass::Tel),
            "WEB" => Ok(SecEntryClass::Web),
            other => Err(format!("unknown SEC code: {other}")),
        }
    }
}
