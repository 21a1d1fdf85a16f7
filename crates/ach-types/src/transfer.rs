//! Transfer and micro-deposit entities, and the transfer status state
//! machine.

use crate::ids::{DepositoryId, MicroDepositId, OriginatorId, ReceiverId, TransferId, UserId};
use crate::money::Money;
use crate::sec_code::SecEntryClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferType {
    Push,
    Pull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    Pending,
    Reviewable,
    Processed,
    Failed,
    Reclaimed,
    Canceled,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal transfer transition: {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: TransferStatus,
    pub to: TransferStatus,
}

impl TransferStatus {
    /// Exhaustive transition table. Every arrow the pipeline or an operator
    /// can legally take; everything else is `Err`.
    pub fn transition(self, to: TransferStatus) -> Result<TransferStatus, IllegalTransition> {
        use TransferStatus::*;
        let legal = match (self, to) {
            (Pending, Reviewable) => true,
            (Pending, Processed) => true,
            (Pending, Failed) => true,
            (Pending, Canceled) => true,
            (Reviewable, Pending) => true,
            (Reviewable, Canceled) => true,
            (Processed, Reclaimed) => true,
            (Processed, Failed) => true,
            (same_from, same_to) if same_from == same_to => true,
            _ => false,
        };
        if legal {
            Ok(to)
        } else {
            Err(IllegalTransition { from: self, to })
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TransferStatus::Failed | TransferStatus::Reclaimed | TransferStatus::Canceled)
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("amount must be positive")]
    NonPositiveAmount,
    #[error("description must not be empty")]
    EmptyDescription,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub user_id: UserId,
    pub transfer_type: TransferType,
    pub amount: Money,
    pub originator_id: OriginatorId,
    pub originator_depository_id: DepositoryId,
    pub receiver_id: ReceiverId,
    pub receiver_depository_id: DepositoryId,
    pub description: String,
    pub sec_code: SecEntryClass,
    pub status: TransferStatus,
    pub same_day: bool,
    /// Set exactly once, on first merge into a [`crate::MergableFile`].
    pub merged_filename: Option<String>,
    /// Set exactly once, on first merge; globally unique per NACHA.
    pub trace_number: Option<String>,
    pub return_code: Option<String>,
    /// The backing ACH file id created at transfer-creation time, consumed
    /// by the merger. Opaque to everything except
    /// `ach-codec`/`ach-store`.
    pub source_file_id: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Transfer {
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.amount.minor_units() <= 0 {
            return Err(TransferError::NonPositiveAmount);
        }
        if self.description.trim().is_empty() {
            return Err(TransferError::EmptyDescription);
        }
        Ok(())
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Records the outcome of a merge. Best-effort by design: callers
    /// log-and-continue on repository write failure rather than fail the
    /// whole merge — the resulting double-upload hazard is accepted rather
    /// than guarded against here.
    pub fn record_merge(&mut self, filename: String, trace_number: String) {
        if self.merged_filename.is_none() {
            self.merged_filename = Some(filename);
        }
        if self.trace_number.is_none() {
            self.trace_number = Some(trace_number);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicroDepositCredit {
    pub id: MicroDepositId,
    pub depository_id: DepositoryId,
    pub user_id: UserId,
    pub amount: Money,
    /// References a pre-built ACH file in the codec store.
    pub source_file_id: String,
    pub merged_filename: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MicroDepositCredit {
    pub fn is_merged(&self) -> bool {
        self.merged_filename.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_to_processed_is_legal() {
        assert_eq!(
            TransferStatus::Pending.transition(TransferStatus::Processed),
            Ok(TransferStatus::Processed)
        );
    }

    #[test]
    fn processed_to_pending_is_illegal() {
        assert!(TransferStatus::Processed.transition(TransferStatus::Pending).is_err());
    }

    #[test]
    fn canceled_is_terminal() {
        assert!(TransferStatus::Canceled.is_terminal());
        assert!(TransferStatus::Processed.transition(TransferStatus::Canceled).is_err());
    }

    #[test]
    fn processed_can_reclaim_on_return() {
        assert_eq!(
            TransferStatus::Processed.transition(TransferStatus::Reclaimed),
            Ok(TransferStatus::Reclaimed)
        );
    }
}
