//! ABA routing number: 9 digits, checksum-valid per the ABA routing transit
//! number algorithm.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingNumberError {
    #[error("routing number must be exactly 9 digits, got {0:?}")]
    WrongLength(String),
    #[error("routing number {0:?} is not numeric")]
    NotNumeric(String),
    #[error("routing number {0:?} fails the ABA checksum")]
    BadChecksum(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutingNumber([u8; 9]);

impl RoutingNumber {
    pub fn parse(s: &str) -> Result<Self, RoutingNumberError> {
        if s.len() != 9 {
            return Err(RoutingNumberError::WrongLength(s.to_string()));
        }
        let mut digits = [0u8; 9];
        for (i, c) in s.chars().enumerate() {
            digits[i] = c.to_digit(10).ok_or_else(|| RoutingNumberError::NotNumeric(s.to_string()))? as u8;
        }
        if !Self::checksum_valid(&digits) {
            return Err(RoutingNumberError::BadChecksum(s.to_string()));
        }
        Ok(Self(digits))
    }

    /// ABA checksum: `3*(d1+d4+d7) + 7*(d2+d5+d8) + 1*(d3+d6+d9) ≡ 0 (mod 10)`.
    fn checksum_valid(d: &[u8; 9]) -> bool {
        let sum = 3 * (d[0] as u32 + d[3] as u32 + d[6] as u32)
            + 7 * (d[1] as u32 + d[4] as u32 + d[7] as u32)
            + 1 * (d[2] as u32 + d[5] as u32 + d[8] as u32);
        sum % 10 == 0
    }

    pub fn as_str(&self) -> String {
        self.0.iter().map(|d| (b'0' + d) as char).collect()
    }
}

impl fmt::Display for RoutingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str()) }
}

impl std::str::FromStr for RoutingNumber {
    type Err = RoutingNumberError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_routing_number() {
        // 091400606 is a well-known valid test ABA number (Wells Fargo).
        assert!(RoutingNumber::parse("091400606").is_ok());
    }

    #[test]
    fn rejects_bad_checksum() {
        assert_eq!(
            RoutingNumber::parse("091400607").unwrap_err(),
            RoutingNumberError::BadChecksum("091400607".to_string())
        );
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            RoutingNumber::parse("12345"),
            Err(RoutingNumberError::WrongLength(_))
        ));
    }

    #[test]
    fn display_roundtrips() {
        let r = RoutingNumber::parse("091400606").unwrap();
        assert_eq!(r.to_string(), "091400606");
    }
}
