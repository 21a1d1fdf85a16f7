//! Repository for [`Transfer`] rows: the eligible-for-merge cursor (spec
//! §4.6), the merge/upload bookkeeping writes (§4.2 step 5, §4.3 step 4),
//! and the return-file lookup tuple (§4.4 step 2).

use crate::codec::{decode, encode, time_ordered_key};
use crate::cursor::PagedCursor;
use crate::error::{Result, StoreError};
use ach_types::{SecEntryClass, Transfer, TransferId, TransferStatus};
use chrono::{DateTime, Utc};

#[derive(Clone)]
pub struct TransferRepo {
    by_id: sled::Tree,
    pending_idx: sled::Tree,
}

impl TransferRepo {
    pub fn open(db: &sled::Db) -> Result<Self> {
        Ok(Self {
            by_id: db.open_tree("transfers")?,
            pending_idx: db.open_tree("transfers_pending_idx")?,
        })
    }

    /// Insert-or-replace: the id is the unique key, so a second insert for
    /// the same id is just a later write.
    pub fn upsert(&self, transfer: &Transfer) -> Result<()> {
        self.by_id.insert(transfer.id.as_uuid().as_bytes(), encode(transfer)?)?;
        self.sync_pending_index(transfer)?;
        Ok(())
    }

    fn sync_pending_index(&self, transfer: &Transfer) -> Result<()> {
        let key = time_ordered_key(transfer.created_at, transfer.id.as_uuid());
        if transfer.status == TransferStatus::Pending && !transfer.is_deleted() {
            self.pending_idx.insert(key, encode(&transfer.id.as_uuid().as_bytes().to_vec())?)?;
        } else {
            self.pending_idx.remove(key)?;
        }
        Ok(())
    }

    pub fn get(&self, id: TransferId) -> Result<Option<Transfer>> {
        match self.by_id.get(id.as_uuid().as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Paged cursor over `status = pending`, ordered by creation time
    /// ascending.
    pub fn cursor(&self, batch_size: usize) -> PagedCursor {
        PagedCursor::new(self.pending_idx.clone(), batch_size)
    }

    /// Resolves a cursor page of ids back into full `Transfer` rows (the
    /// index tree stores only the id, to keep it small and avoid a second
    /// copy of the full row going stale independently).
    pub fn resolve(&self, ids: Vec<Vec<u8>>) -> Result<Vec<Transfer>> {
        let mut out = Vec::with_capacity(ids.len());
        for id_bytes in ids {
            if let Some(bytes) = self.by_id.get(&id_bytes)? {
                out.push(decode(&bytes)?);
            }
        }
        Ok(out)
    }

    pub fn transition(&self, id: TransferId, to: TransferStatus) -> Result<Transfer> {
        let mut transfer = self.get(id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        transfer.status = transfer.status.transition(to)?;
        self.upsert(&transfer)?;
        Ok(transfer)
    }

    /// Records the outcome of a merge: best-effort — callers log-and-continue
    /// on failure rather than abort the whole merge.
    pub fn record_merge(&self, id: TransferId, filename: String, trace_number: String) -> Result<()> {
        let mut transfer = self.get(id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        transfer.record_merge(filename, trace_number);
        self.upsert(&transfer)
    }

    /// Marks every transfer in `merged_filename` as `processed`, keyed by
    /// `(merged_filename, trace_number)`. Runs only after the remote upload
    /// has been accepted.
    pub fn mark_file_processed(&self, merged_filename: &str) -> Result<Vec<Transfer>> {
        let mut updated = Vec::new();
        for item in self.by_id.iter() {
            let (_, bytes) = item?;
            let transfer: Transfer = decode(&bytes)?;
            if transfer.merged_filename.as_deref() == Some(merged_filename) && transfer.status == TransferStatus::Pending {
                let marked = self.transition(transfer.id, TransferStatus::Processed)?;
                updated.push(marked);
            }
        }
        Ok(updated)
    }

    /// Records a return or correction outcome against the originating
    /// transfer: sets `return_code` and applies the status transition the
    /// return's disposition calls for.
    pub fn apply_return(&self, id: TransferId, return_code: &str, to: TransferStatus) -> Result<Transfer> {
        let mut transfer = self.get(id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        transfer.return_code = Some(return_code.to_string());
        transfer.status = transfer.status.transition(to)?;
        self.upsert(&transfer)?;
        Ok(transfer)
    }

    /// Resolves the originating transfer for a return entry by
    /// `(SEC code, amount, trace number, effective-entry-date ± 5 days)`
    /// against non-deleted, `processed` transfers. The transfer entity
    /// carries no independent effective-date field, so the window is
    /// measured against `created_at` (see DESIGN.md).
    pub fn find_for_return(
        &self,
        sec_code: SecEntryClass,
        amount_cents: i64,
        trace_number: &str,
        effective_date: DateTime<Utc>,
        window_days: i64,
    ) -> Result<Option<Transfer>> {
        for item in self.by_id.iter() {
            let (_, bytes) = item?;
            let transfer: Transfer = decode(&bytes)?;
            if transfer.is_deleted() || transfer.status != TransferStatus::Processed {
                continue;
            }
            if transfer.sec_code != sec_code || transfer.amount.minor_units() != amount_cents {
                continue;
            }
            if transfer.trace_number.as_deref() != Some(trace_number) {
                continue;
            }
            let delta = (transfer.created_at - effective_date).num_days().abs();
            if delta <= window_days {
                return Ok(Some(transfer));
            }
        }
        Ok(None)
    }

    pub fn soft_delete(&self, id: TransferId, at: DateTime<Utc>) -> Result<()> {
        let mut transfer = self.get(id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        transfer.deleted_at = Some(at);
        self.upsert(&transfer)
    }
}
