//! The `MergeFiles` primitive: folds every batch of `src` into `dest`,
//! skipping batches `dest` already carries (spec §4.2 step 3). Returns the
//! batches that were actually appended, in source order, so the caller
//! (the pipeline's merger) can roll back a partial merge if the line cap
//! is exceeded.

use crate::error::{CodecError, Result};
use crate::file::AchFile;

pub fn merge_files(dest: &mut AchFile, src: &AchFile) -> Result<Vec<usize>> {
    if dest.destination() != src.destination() {
        return Err(CodecError::DestinationMismatch {
            a: dest.destination().as_str(),
            b: src.destination().as_str(),
        });
    }
    let mut added = Vec::new();
    for batch in &src.batches {
        if dest.add_batch(batch.clone()) {
            added.push(dest.batches.len() - 1);
        }
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{Batch, Entry};
    use crate::batch_header::{BatchHeader, ServiceClassCode};
    use crate::entry_detail::{EntryDetail, TransactionCode};
    use crate::file_header::FileHeader;
    use ach_types::{AccountType, RoutingNumber, SecEntryClass, TransferType};
    use chrono::NaiveDate;

    fn file_with_one_batch(trace: &str) -> AchFile {
        let routing = RoutingNumber::parse("091400606").unwrap();
        let header = FileHeader {
            immediate_destination: routing,
            immediate_origin: routing,
            file_creation_date: NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
            file_creation_time: (0, 0),
            file_id_modifier: 'A',
            immediate_destination_name: String::new(),
            immediate_origin_name: String::new(),
            reference_code: String::new(),
        };
        let mut file = AchFile::new(header);
        file.add_batch(Batch {
            header: BatchHeader {
                service_class_code: ServiceClassCode::CreditsOnly,
                company_name: "ACME".to_string(),
                company_discretionary_data: String::new(),
                company_identification: "1091400606".to_string(),
                sec_code: SecEntryClass::Ppd,
                company_entry_description: "PAYROLL".to_string(),
                effective_entry_date: NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
                originating_dfi: routing,
                batch_number: 1,
            },
            entries: vec![Entry {
                detail: EntryDetail {
                    transaction_code: TransactionCode {
                        account_type: AccountType::Checking,
                        direction: TransferType::Push,
                        is_prenote: false,
                    },
                    receiving_dfi: routing,
                    dfi_account_number: "1".to_string(),
                    amount_cents: 100,
                    individual_identification_number: String::new(),
                    individual_name: "A B".to_string(),
                    discretionary_data: String::new(),
                    addenda_record_indicator: false,
                    trace_number: trace.to_string(),
                },
                addenda: vec![],
            }],
        });
        file
    }

    #[test]
    fn merges_new_batches_and_reports_indices() {
        let mut dest = file_with_one_batch("091400600000001");
        dest.pop_batch();
        let src = file_with_one_batch("091400600000002");
        let added = merge_files(&mut dest, &src).unwrap();
        assert_eq!(added, vec![0]);
        assert_eq!(dest.batches.len(), 1);
    }

    #[test]
    fn skips_batches_already_present() {
        let mut dest = file_with_one_batch("091400600000001");
        let src = file_with_one_batch("091400600000001");
        let added = merge_files(&mut dest, &src).unwrap();
        assert!(added.is_empty());
        assert_eq!(dest.batches.len(), 1);
    }

    #[test]
    fn rejects_mismatched_destinations() {
        let mut dest = file_with_one_batch("091400600000001");
        dest.header.immediate_destination = RoutingNumber::parse("231302313").unwrap();
        let src = file_with_one_batch("091400600000002");
        assert!(matches!(merge_files(&mut dest, &src), Err(CodecError::DestinationMismatch { .. })));
    }
}
