//! The `Validate` primitive: structural checks beyond what `parse` already
//! enforces per-record — the correctness of computed control totals and
//! the per-file-per-destination invariant the merger relies on.

use crate::error::{CodecError, Result};
use crate::file::AchFile;

pub fn validate(file: &AchFile) -> Result<()> {
    for batch in &file.batches {
        if batch.header.originating_dfi != file.header.immediate_origin {
            return Err(CodecError::DestinationMismatch {
                a: batch.header.originating_dfi.as_str(),
                b: file.header.immediate_origin.as_str(),
            });
        }
        let computed = batch.control();
        let recorded_count = computed.entry_addenda_count;
        let actual_count: u32 = batch.entries.iter().map(|e| 1 + e.addenda.len() as u32).sum();
        if recorded_count != actual_count {
            return Err(CodecError::BatchControlMismatch { recorded: recorded_count, computed: actual_count });
        }
    }

    let computed_batches = file.batches.len() as u32;
    if computed_batches != file.control().batch_count {
        return Err(CodecError::FileControlMismatch {
            recorded: file.control().batch_count,
            computed: computed_batches,
        });
    }
    Ok(())
}
