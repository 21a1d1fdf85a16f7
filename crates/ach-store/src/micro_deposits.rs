//! Repository for [`MicroDepositCredit`] rows and the confirmation flow
//! that transitions a depository from `unverified` to `verified`.

use crate::codec::{decode, encode, time_ordered_key};
use crate::cursor::PagedCursor;
use crate::error::{Result, StoreError};
use ach_types::{DepositoryId, MicroDepositCredit, MicroDepositId, Money};
use thiserror::Error;

#[derive(Clone)]
pub struct MicroDepositRepo {
    by_id: sled::Tree,
    unmerged_idx: sled::Tree,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfirmationError {
    #[error("no outstanding micro-deposits for depository")]
    NoneOutstanding,
    #[error("confirmation amounts do not match the outstanding set")]
    AmountMismatch,
}

impl MicroDepositRepo {
    pub fn open(db: &sled::Db) -> Result<Self> {
        Ok(Self {
            by_id: db.open_tree("micro_deposits")?,
            unmerged_idx: db.open_tree("micro_deposits_unmerged_idx")?,
        })
    }

    pub fn upsert(&self, credit: &MicroDepositCredit) -> Result<()> {
        self.by_id.insert(credit.id.as_uuid().as_bytes(), encode(credit)?)?;
        let key = time_ordered_key(credit.created_at, credit.id.as_uuid());
        if credit.is_merged() {
            self.unmerged_idx.remove(key)?;
        } else {
            self.unmerged_idx.insert(key, encode(&credit.id.as_uuid().as_bytes().to_vec())?)?;
        }
        Ok(())
    }

    pub fn get(&self, id: MicroDepositId) -> Result<Option<MicroDepositCredit>> {
        match self.by_id.get(id.as_uuid().as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Eligible-for-merge cursor: `merged_filename is null`, creation-time
    /// ascending.
    pub fn cursor(&self, batch_size: usize) -> PagedCursor {
        PagedCursor::new(self.unmerged_idx.clone(), batch_size)
    }

    pub fn resolve(&self, ids: Vec<Vec<u8>>) -> Result<Vec<MicroDepositCredit>> {
        let mut out = Vec::with_capacity(ids.len());
        for id_bytes in ids {
            if let Some(bytes) = self.by_id.get(&id_bytes)? {
                out.push(decode(&bytes)?);
            }
        }
        Ok(out)
    }

    pub fn mark_merged(&self, id: MicroDepositId, filename: String) -> Result<()> {
        let mut credit = self.get(id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if credit.merged_filename.is_none() {
            credit.merged_filename = Some(filename);
        }
        self.upsert(&credit)
    }

    pub fn outstanding_for_depository(&self, depository_id: DepositoryId) -> Result<Vec<MicroDepositCredit>> {
        let mut out = Vec::new();
        for item in self.by_id.iter() {
            let (_, bytes) = item?;
            let credit: MicroDepositCredit = decode(&bytes)?;
            if credit.depository_id == depository_id {
                out.push(credit);
            }
        }
        out.sort_by_key(|c| c.created_at);
        Ok(out)
    }

    /// Validates a confirmation atomically by matching all outstanding
    /// amounts back, in any order. Returns the matched set on success so
    /// the caller can transition the depository to verified.
    pub fn confirm(
        &self,
        depository_id: DepositoryId,
        reported: &[Money],
    ) -> std::result::Result<Vec<MicroDepositCredit>, ConfirmationError> {
        let outstanding = self
            .outstanding_for_depository(depository_id)
            .map_err(|_| ConfirmationError::NoneOutstanding)?;
        if outstanding.is_empty() {
            return Err(ConfirmationError::NoneOutstanding);
        }
        if outstanding.len() != reported.len() {
            return Err(ConfirmationError::AmountMismatch);
        }
        let mut remaining: Vec<Money> = outstanding.iter().map(|c| c.amount).collect();
        for amount in reported {
            match remaining.iter().position(|r| r == amount) {
                Some(idx) => {
                    remaining.remove(idx);
                }
                None => return Err(ConfirmationError::AmountMismatch),
            }
        }
        Ok(outstanding)
    }
}
