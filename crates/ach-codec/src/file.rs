//! The top-level NACHA file: a [`FileHeader`], zero or more [`Batch`]es, and
//! a computed [`FileControl`]. This is the unit the merger reads, appends
//! batches to, and the uploader ships to the ODFI.

use crate::batch::Batch;
use crate::control::FileControl;
use crate::error::{CodecError, Result};
use crate::file_header::FileHeader;
use crate::fields::RECORD_LENGTH;
use ach_types::RoutingNumber;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchFile {
    pub header: FileHeader,
    pub batches: Vec<Batch>,
}

impl AchFile {
    pub fn new(header: FileHeader) -> Self {
        Self { header, batches: Vec::new() }
    }

    pub fn destination(&self) -> RoutingNumber {
        self.header.immediate_destination
    }

    /// Total lines the file would occupy on disk: header + every batch's
    /// lines + the file control record. The 10-line block-padding records
    /// NACHA mandates are not counted — `ACH_FILE_MAX_LINES` budgets logical
    /// records only.
    pub fn line_count(&self) -> usize {
        2 + self.batches.iter().map(Batch::line_count).sum::<usize>()
    }

    pub fn control(&self) -> FileControl {
        let batch_count = self.batches.len() as u32;
        let entry_addenda_count: u32 = self.batches.iter().map(|b| b.control().entry_addenda_count).sum();
        let total_debit: i64 = self.batches.iter().map(|b| b.control().total_debit_cents).sum();
        let total_credit: i64 = self.batches.iter().map(|b| b.control().total_credit_cents).sum();
        let entry_hash: u64 = self.batches.iter().map(|b| b.control().entry_hash).sum::<u64>() % 10_000_000_000;
        let total_lines = self.line_count() as u32;
        let block_count = total_lines.div_ceil(10);
        FileControl {
            batch_count,
            block_count,
            entry_addenda_count,
            entry_hash,
            total_debit_cents: total_debit,
            total_credit_cents: total_credit,
        }
    }

    /// Appends `batch` unless an equal batch (per [`crate::batch::batches_equal`])
    /// is already present. Returns whether the batch was actually added.
    pub fn add_batch(&mut self, mut batch: Batch) -> bool {
        if self.batches.iter().any(|existing| crate::batch::batches_equal(existing, &batch)) {
            return false;
        }
        batch.header.batch_number = self.batches.len() as u32 + 1;
        self.batches.push(batch);
        true
    }

    /// Removes the last-added batch; used by the merger to roll back a
    /// merge that pushed the file over the line cap.
    pub fn pop_batch(&mut self) -> Option<Batch> {
        self.batches.pop()
    }

    /// Removes the batch containing `trace_number`, for pipeline-controller
    /// driven removal via the `removal` channel. Returns whether a batch
    /// was removed.
    pub fn remove_batch_by_trace(&mut self, trace_number: &str) -> bool {
        let before = self.batches.len();
        self.batches.retain(|b| !b.entries.iter().any(|e| e.detail.trace_number == trace_number));
        for (i, b) in self.batches.iter_mut().enumerate() {
            b.header.batch_number = i as u32 + 1;
        }
        self.batches.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn first_trace_number(&self) -> Option<&str> {
        self.batches.first()?.entries.first().map(|e| e.detail.trace_number.as_str())
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let mut all: std::iter::Peekable<std::vec::IntoIter<&str>> = contents
            .lines()
            .filter(|l| l.len() >= RECORD_LENGTH)
            .collect::<Vec<_>>()
            .into_iter()
            .peekable();

        let first = all.peek().copied();
        let header = match first {
            Some(line) if line.starts_with('1') => {
                all.next();
                Some(FileHeader::parse(line)?)
            }
            // Some banks omit the file header on return files; the caller
            // must supply a synthetic header in that case.
            _ => None,
        };

        let mut batches = Vec::new();
        while let Some(&line) = all.peek() {
            match line.chars().next() {
                Some('5') => {
                    all.next();
                    batches.push(Batch::parse(line, &mut all)?);
                }
                Some('9') => {
                    all.next();
                }
                _ => {
                    all.next();
                }
            }
        }

        let header = header.ok_or(CodecError::EmptyFile)?;
        Ok(Self { header, batches })
    }

    /// Like [`Self::parse`] but tolerates a missing file header, synthesizing
    /// one from the first batch's originating DFI. Used by the
    /// return/correction processor, which must accept headerless files.
    pub fn parse_tolerant(contents: &str, synthesize_destination: RoutingNumber) -> Result<Self> {
        match Self::parse(contents) {
            Ok(f) => Ok(f),
            Err(CodecError::EmptyFile) => Err(CodecError::EmptyFile),
            Err(_) => {
                let mut batches = Vec::new();
                let lines_vec: Vec<&str> = contents.lines().filter(|l| l.len() >= RECORD_LENGTH).collect();
                let mut it = lines_vec.into_iter().peekable();
                while let Some(&line) = it.peek() {
                    match line.chars().next() {
                        Some('5') => {
                            it.next();
                            batches.push(Batch::parse(line, &mut it)?);
                        }
                        _ => {
                            it.next();
                        }
                    }
                }
                let origin = batches
                    .first()
                    .map(|b| b.header.originating_dfi)
                    .unwrap_or(synthesize_destination);
                let header = FileHeader {
                    immediate_destination: synthesize_destination,
                    immediate_origin: origin,
                    file_creation_date: chrono::Utc::now().date_naive(),
                    file_creation_time: (0, 0),
                    file_id_modifier: 'A',
                    immediate_destination_name: String::new(),
                    immediate_origin_name: String::new(),
                    reference_code: String::new(),
                };
                Ok(Self { header, batches })
            }
        }
    }

    pub fn write(&self) -> String {
        let mut lines = vec![self.header.write()];
        for b in &self.batches {
            lines.extend(b.write());
        }
        lines.push(self.control().write());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch_header::{BatchHeader, ServiceClassCode};
    use crate::entry_detail::{EntryDetail, TransactionCode};
    use crate::batch::Entry;
    use ach_types::{AccountType, SecEntryClass, TransferType};
    use chrono::NaiveDate;

    fn sample_file() -> AchFile {
        let header = FileHeader {
            immediate_destination: RoutingNumber::parse("091400606").unwrap(),
            immediate_origin: RoutingNumber::parse("091400606").unwrap(),
            file_creation_date: NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
            file_creation_time: (14, 30),
            file_id_modifier: 'A',
            immediate_destination_name: "FIRST BANK".to_string(),
            immediate_origin_name: "ACH GATEWAY".to_string(),
            reference_code: String::new(),
        };
        let mut file = AchFile::new(header);
        let batch = Batch {
            header: BatchHeader {
                service_class_code: ServiceClassCode::CreditsOnly,
                company_name: "ACME CORP".to_string(),
                company_discretionary_data: String::new(),
                company_identification: "1091400606".to_string(),
                sec_code: SecEntryClass::Ppd,
                company_entry_description: "PAYROLL".to_string(),
                effective_entry_date: NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
                originating_dfi: RoutingNumber::parse("091400606").unwrap(),
                batch_number: 1,
            },
            entries: vec![Entry {
                detail: EntryDetail {
                    transaction_code: TransactionCode {
                        account_type: AccountType::Checking,
                        direction: TransferType::Push,
                        is_prenote: false,
                    },
                    receiving_dfi: RoutingNumber::parse("091400606").unwrap(),
                    dfi_account_number: "123456789".to_string(),
                    amount_cents: 15000,
                    individual_identification_number: "EMP001".to_string(),
                    individual_name: "JANE DOE".to_string(),
                    discretionary_data: String::new(),
                    addenda_record_indicator: false,
                    trace_number: "091400600000001".to_string(),
                },
                addenda: vec![],
            }],
        };
        file.add_batch(batch);
        file
    }

    #[test]
    fn roundtrips_through_write_and_parse() {
        let file = sample_file();
        let serialized = file.write();
        let parsed = AchFile::parse(&serialized).unwrap();
        assert_eq!(parsed, file);
    }

    #[test]
    fn add_batch_dedups_identical_content() {
        let mut file = sample_file();
        let dup = file.batches[0].clone();
        assert!(!file.add_batch(dup));
        assert_eq!(file.batches.len(), 1);
    }

    #[test]
    fn pop_batch_undoes_last_add() {
        let mut file = sample_file();
        let before = file.line_count();
        file.pop_batch();
        assert!(file.is_empty());
        assert!(file.line_count() < before);
    }

    #[test]
    fn remove_batch_by_trace_renumbers_remaining() {
        let mut file = sample_file();
        assert!(file.remove_batch_by_trace("091400600000001"));
        assert!(file.is_empty());
    }
}
