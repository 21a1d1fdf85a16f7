//! Depository: a bank account belonging to a user, and its status state
//! machine.
//!
//! `DepositoryStatus` is a closed sum type with an exhaustive transition
//! table: every legal move is a named method, illegal moves are compile
//! errors or `Err(IllegalTransition)`, there is no `set_status(&str)` escape
//! hatch.

use crate::ids::{DepositoryId, UserId};
use crate::routing::RoutingNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HolderType {
    Individual,
    Business,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Checking,
    Savings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositoryStatus {
    Unverified,
    Verified,
    Rejected,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal depository transition: {from:?} -> {attempted}")]
pub struct IllegalTransition {
    pub from: DepositoryStatus,
    pub attempted: &'static str,
}

impl DepositoryStatus {
    /// Unverified -> Verified, only via micro-deposit confirmation.
    pub fn verify(self) -> Result<Self, IllegalTransition> {
        match self {
            DepositoryStatus::Unverified => Ok(DepositoryStatus::Verified),
            from => Err(IllegalTransition { from, attempted: "verify" }),
        }
    }

    /// Unverified|Verified -> Rejected, driven by a return code. Rejected is
    /// terminal for this transition (idempotent: re-rejecting is a no-op,
    /// not an error, since a second bad return for the same account is
    /// expected, not exceptional).
    pub fn reject(self) -> Self {
        DepositoryStatus::Rejected
    }

    /// Administrative override: always allowed, any state to any state.
    /// Distinct from the pipeline-driven transitions above — see
    /// DESIGN.md for the Open Question this resolves.
    pub fn admin_override(_from: Self, to: Self) -> Self {
        to
    }
}

#[derive(Debug, Error)]
pub enum DepositoryError {
    #[error("account number cannot be empty")]
    EmptyAccountNumber,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Depository {
    pub id: DepositoryId,
    pub user_id: UserId,
    pub bank_name: String,
    pub holder_name: String,
    pub holder_type: HolderType,
    pub account_type: AccountType,
    pub routing_number: RoutingNumber,
    /// Ciphertext only; cleartext account numbers never reach this struct.
    pub encrypted_account_number: Vec<u8>,
    /// Deterministic hash used for lookup from return files without
    /// decrypting. See `ach_codec::verify::hash_account_number`.
    pub hashed_account_number: [u8; 32],
    pub status: DepositoryStatus,
    pub metadata: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Depository {
    /// Changing the account number always reverts status to unverified —
    /// the old micro-deposit confirmation no longer attests to the new
    /// number.
    pub fn set_account_number(&mut self, encrypted: Vec<u8>, hashed: [u8; 32], now: DateTime<Utc>) {
        self.encrypted_account_number = encrypted;
        self.hashed_account_number = hashed;
        self.status = DepositoryStatus::Unverified;
        self.updated_at = now;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unverified_can_verify() {
        assert_eq!(DepositoryStatus::Unverified.verify(), Ok(DepositoryStatus::Verified));
    }

    #[test]
    fn verified_cannot_verify_again() {
        assert!(DepositoryStatus::Verified.verify().is_err());
    }

    #[test]
    fn reject_is_terminal_but_idempotent() {
        assert_eq!(DepositoryStatus::Rejected.reject(), DepositoryStatus::Rejected);
        assert_eq!(DepositoryStatus::Verified.reject(), DepositoryStatus::Rejected);
    }

    /// The admin facade renders this status straight into an HTTP response
    /// body, so its JSON shape is part of the public contract.
    #[test]
    fn status_serializes_to_the_expected_json_tag() {
        assert_eq!(serde_json::to_string(&DepositoryStatus::Verified).unwrap(), "\"Verified\"");
    }
}
