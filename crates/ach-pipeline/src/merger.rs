//! Groups outgoing transfers and micro-deposits into as few files as
//! possible per destination routing number, respecting the line cap
//! (spec.md §4.2).
//!
//! Follows a stage / transform / activate / commit / rollback structure:
//! "stage" is loading the incoming transfer's backing file, "transform" is
//! batch-dedup-and-append, "activate" is the atomic write of the mergable
//! file, and "commit" is the best-effort transfer-row bookkeeping update. A
//! merge that exceeds the line cap rolls the open file back to its
//! pre-merge content, finalizes it, and opens the next sequence — it never
//! leaves a half-written file in place.

use crate::error::{PipelineError, Result};
use ach_codec::AchFile;
use ach_core::Clock;
use ach_fs::{atomic_write, AtomicWriteOptions, MergeLock};
use ach_store::Store;
use ach_types::mergable_file::FileSequence;
use ach_types::{MergableFile, RoutingNumber};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A mergable file that hit the line cap mid-merge and is ready to upload
/// regardless of cutoff proximity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedFile {
    pub path: PathBuf,
    pub filename: String,
}

#[derive(Clone)]
pub struct Merger {
    store: Store,
    merged_dir: PathBuf,
    max_lines: usize,
    clock: Arc<dyn Clock>,
}

struct OpenFile {
    mergable: MergableFile,
    file: AchFile,
}

impl OpenFile {
    fn path(&self, dir: &Path) -> PathBuf {
        self.mergable.filename(dir)
    }

    fn filename(&self, dir: &Path) -> String {
        self.path(dir).file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string()
    }
}

impl Merger {
    pub fn new(store: Store, merged_dir: PathBuf, max_lines: usize, clock: Arc<dyn Clock>) -> Self {
        Self { store, merged_dir, max_lines, clock }
    }

    pub fn merged_dir(&self) -> &Path {
        &self.merged_dir
    }

    /// Drains the pending-transfer and unmerged-micro-deposit cursors,
    /// merging every eligible row, and returns every file that was
    /// finalized by a rollover along the way (spec §4.3 step 1).
    pub fn drain(&self, batch_size: usize) -> Result<Vec<FinalizedFile>> {
        let mut finalized = Vec::new();

        let mut transfer_cursor = self.store.transfers.cursor(batch_size);
        loop {
            let ids = transfer_cursor.next_page::<Vec<u8>>()?;
            if ids.is_empty() {
                break;
            }
            for transfer in self.store.transfers.resolve(ids)? {
                if let Some(f) = self.merge_groupable_transfer(&transfer)? {
                    finalized.push(f);
                }
            }
        }

        let mut credit_cursor = self.store.micro_deposits.cursor(batch_size);
        loop {
            let ids = credit_cursor.next_page::<Vec<u8>>()?;
            if ids.is_empty() {
                break;
            }
            for credit in self.store.micro_deposits.resolve(ids)? {
                if let Some(f) = self.merge_micro_deposit(&credit)? {
                    finalized.push(f);
                }
            }
        }

        Ok(finalized)
    }

    /// spec §4.2 `mergeGroupableTransfer`.
    pub fn merge_groupable_transfer(&self, transfer: &ach_types::Transfer) -> Result<Option<FinalizedFile>> {
        let contents = self.store.source_files.get(&transfer.source_file_id)?;
        let incoming = AchFile::parse(&contents)?;

        let outcome = self.merge_into(&incoming)?;

        if let Some(trace) = incoming.first_trace_number() {
            if let Err(e) = self.store.transfers.record_merge(transfer.id, outcome.current_filename.clone(), trace.to_string()) {
                tracing::warn!(transfer_id = %transfer.id, error = %e, "best-effort merge bookkeeping update failed");
            }
        }

        Ok(outcome.finalized)
    }

    /// spec §4.2 `mergeMicroDeposit`.
    pub fn merge_micro_deposit(&self, credit: &ach_types::MicroDepositCredit) -> Result<Option<FinalizedFile>> {
        let contents = self.store.source_files.get(&credit.source_file_id)?;
        let incoming = AchFile::parse(&contents)?;

        let outcome = self.merge_into(&incoming)?;

        if let Err(e) = self.store.micro_deposits.mark_merged(credit.id, outcome.current_filename.clone()) {
            tracing::warn!(micro_deposit_id = %credit.id, error = %e, "best-effort merge bookkeeping update failed");
        }

        Ok(outcome.finalized)
    }

    /// Removes the batch carrying `trace_number` from whichever open
    /// mergable file currently holds it (the controller's `removal`
    /// channel, spec §4.1).
    pub fn remove_entry(&self, trace_number: &str) -> Result<bool> {
        std::fs::create_dir_all(&self.merged_dir)?;
        for entry in std::fs::read_dir(&self.merged_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(mergable) = parse_mergable_filename(name) else { continue };
            if mergable.uploaded {
                continue;
            }
            let path = entry.path();
            let _lock = MergeLock::acquire(self.lock_path(mergable.destination))?;
            let contents = std::fs::read_to_string(&path)?;
            let mut file = AchFile::parse(&contents)?;
            if file.remove_batch_by_trace(trace_number) {
                atomic_write(&path, file.write().as_bytes(), AtomicWriteOptions::new())?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Renames a finalized mergable file to its `.uploaded` form and marks
    /// every transfer it carries as processed (spec §4.3 step 4), once the
    /// remote upload has been accepted. The destination is recovered from
    /// the filename rather than threaded through by the caller, since the
    /// uploader only ever has a path on disk at this point.
    pub fn mark_uploaded(&self, filename: &str) -> Result<()> {
        let Some(mergable) = parse_mergable_filename(filename) else {
            return Err(PipelineError::EntryNotFound(filename.to_string()));
        };
        let _lock = MergeLock::acquire(self.lock_path(mergable.destination))?;

        let from = self.merged_dir.join(filename);
        let mut uploaded = mergable.clone();
        uploaded.uploaded = true;
        let to = uploaded.filename(&self.merged_dir);
        std::fs::rename(&from, &to)?;

        self.store.transfers.mark_file_processed(filename)?;
        Ok(())
    }

    fn lock_path(&self, destination: RoutingNumber) -> PathBuf {
        self.merged_dir.join(format!("{destination}.lock"))
    }

    fn merge_into(&self, incoming: &AchFile) -> Result<MergeOutcome> {
        let destination = incoming.destination();
        std::fs::create_dir_all(&self.merged_dir)?;
        let _lock = MergeLock::acquire(self.lock_path(destination))?;

        let mut current = self.load_or_create_current(destination)?;
        let mut finalized = None;

        for batch in &incoming.batches {
            let mut single_batch_file = AchFile::new(incoming.header.clone());
            single_batch_file.batches.push(batch.clone());
            if ach_codec::merge_files(&mut current.file, &single_batch_file)?.is_empty() {
                continue;
            }
            if current.file.line_count() > self.max_lines {
                current.file.pop_batch();
                self.write_current(&current)?;
                finalized = Some(FinalizedFile {
                    path: current.path(&self.merged_dir),
                    filename: current.filename(&self.merged_dir),
                });
                current = self.open_next_sequence(&current.mergable)?;
                current.file.add_batch(batch.clone());
            }
        }

        self.write_current(&current)?;
        Ok(MergeOutcome { current_filename: current.filename(&self.merged_dir), finalized })
    }

    fn write_current(&self, current: &OpenFile) -> Result<()> {
        let path = current.path(&self.merged_dir);
        atomic_write(&path, current.file.write().as_bytes(), AtomicWriteOptions::new())?;
        Ok(())
    }

    /// Locates the latest (highest-sequence) non-uploaded mergable file for
    /// `destination`; creates a fresh sequence-1 file if none exists.
    fn load_or_create_current(&self, destination: RoutingNumber) -> Result<OpenFile> {
        let mut latest: Option<MergableFile> = None;
        if self.merged_dir.exists() {
            for entry in std::fs::read_dir(&self.merged_dir)? {
                let entry = entry?;
                let Some(name) = entry.file_name().to_str().map(str::to_string) else { continue };
                let Some(m) = parse_mergable_filename(&name) else { continue };
                if m.uploaded || m.destination != destination {
                    continue;
                }
                let replace = match &latest {
                    Some(l) => m.sequence > l.sequence,
                    None => true,
                };
                if replace {
                    latest = Some(m);
                }
            }
        }

        match latest {
            Some(mergable) => {
                let path = mergable.filename(&self.merged_dir);
                let contents = std::fs::read_to_string(&path)?;
                let file = AchFile::parse(&contents)?;
                Ok(OpenFile { mergable, file })
            }
            None => self.new_sequence(destination, FileSequence::FIRST),
        }
    }

    fn open_next_sequence(&self, previous: &MergableFile) -> Result<OpenFile> {
        let next = previous.sequence.next().expect("sequence space exhausted (1-9, A-Z) for one destination in one day");
        self.new_sequence(previous.destination, next)
    }

    fn new_sequence(&self, destination: RoutingNumber, sequence: FileSequence) -> Result<OpenFile> {
        let header = ach_codec::FileHeader {
            immediate_destination: destination,
            immediate_origin: destination,
            file_creation_date: self.clock.now().date_naive(),
            file_creation_time: {
                let now = self.clock.now();
                use chrono::Timelike;
                (now.hour(), now.minute())
            },
            file_id_modifier: 'A',
            immediate_destination_name: String::new(),
            immediate_origin_name: String::new(),
            reference_code: String::new(),
        };
        let mergable = MergableFile {
            destination,
            date: self.clock.now().date_naive(),
            sequence,
            uploaded: false,
        };
        Ok(OpenFile { mergable, file: AchFile::new(header) })
    }
}

struct MergeOutcome {
    current_filename: String,
    finalized: Option<FinalizedFile>,
}

/// Parses a filename of the shape `{date:YYYYMMDD}-{routing:9}-{seq}.ach`,
/// optionally suffixed `.uploaded`. There is no writer for this — the
/// mergable file's own [`MergableFile::filename`] is the writer; this is
/// strictly the merger's own directory-listing inverse of it.
fn parse_mergable_filename(name: &str) -> Option<MergableFile> {
    let (stem, uploaded) = if let Some(s) = name.strip_suffix(".ach.uploaded") {
        (s, true)
    } else if let Some(s) = name.strip_suffix(".ach") {
        (s, false)
    } else {
        return None;
    };
    let mut parts = stem.splitn(3, '-');
    let date_str = parts.next()?;
    let dest_str = parts.next()?;
    let seq_str = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let date = chrono::NaiveDate::parse_from_str(date_str, "%Y%m%d").ok()?;
    let destination = RoutingNumber::parse(dest_str).ok()?;
    let sequence = FileSequence::from_char(seq_str.chars().next()?)?;
    Some(MergableFile { destination, date, sequence, uploaded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ach_codec::batch::{Batch, Entry};
    use ach_codec::batch_header::{BatchHeader, ServiceClassCode};
    use ach_codec::entry_detail::{EntryDetail, TransactionCode};
    use ach_core::FixedClock;
    use ach_types::{AccountType, DepositoryId, Money, OriginatorId, ReceiverId, SecEntryClass, TransferId, TransferStatus, TransferType, UserId};
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempfile::tempdir;

    fn fixed_clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 7, 28, 14, 30, 0).unwrap()))
    }

    fn routing() -> RoutingNumber {
        RoutingNumber::parse("091400606").unwrap()
    }

    fn single_batch_file(trace: &str) -> AchFile {
        let r = routing();
        let header = ach_codec::FileHeader {
            immediate_destination: r,
            immediate_origin: r,
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
                originating_dfi: r,
                batch_number: 1,
            },
            entries: vec![Entry {
                detail: EntryDetail {
                    transaction_code: TransactionCode { account_type: AccountType::Checking, direction: TransferType::Push, is_prenote: false },
                    receiving_dfi: r,
                    dfi_account_number: "123456789".to_string(),
                    amount_cents: 1500,
                    individual_identification_number: "EMP1".to_string(),
                    individual_name: "JANE DOE".to_string(),
                    discretionary_data: String::new(),
                    addenda_record_indicator: false,
                    trace_number: trace.to_string(),
                },
                addenda: vec![],
            }],
        });
        file
    }

    fn sample_transfer(source_file_id: &str) -> ach_types::Transfer {
        ach_types::Transfer {
            id: TransferId::new(),
            user_id: UserId::new(),
            transfer_type: TransferType::Push,
            amount: Money::usd_cents(1500).unwrap(),
            originator_id: OriginatorId::new(),
            originator_depository_id: DepositoryId::new(),
            receiver_id: ReceiverId::new(),
            receiver_depository_id: DepositoryId::new(),
            description: "payroll".to_string(),
            sec_code: SecEntryClass::Ppd,
            status: TransferStatus::Pending,
            same_day: false,
            merged_filename: None,
            trace_number: None,
            return_code: None,
            source_file_id: source_file_id.to_string(),
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn first_merge_creates_sequence_one_file() {
        let dir = tempdir().unwrap();
        let store = Store::temporary().unwrap();
        store.source_files.put("f1", &single_batch_file("091400600000001").write()).unwrap();
        let transfer = sample_transfer("f1");
        store.transfers.upsert(&transfer).unwrap();

        let merger = Merger::new(store.clone(), dir.path().join("merged"), 10_000, fixed_clock());
        let finalized = merger.merge_groupable_transfer(&transfer).unwrap();
        assert!(finalized.is_none());

        let updated = store.transfers.get(transfer.id).unwrap().unwrap();
        assert_eq!(updated.merged_filename.as_deref(), Some("20260728-091400606-1.ach"));
        assert_eq!(updated.trace_number.as_deref(), Some("091400600000001"));
    }

    #[test]
    fn second_transfer_for_same_destination_joins_existing_file() {
        let dir = tempdir().unwrap();
        let store = Store::temporary().unwrap();
        store.source_files.put("f1", &single_batch_file("091400600000001").write()).unwrap();
        store.source_files.put("f2", &single_batch_file("091400600000002").write()).unwrap();
        let t1 = sample_transfer("f1");
        let t2 = sample_transfer("f2");
        store.transfers.upsert(&t1).unwrap();
        store.transfers.upsert(&t2).unwrap();

        let merger = Merger::new(store.clone(), dir.path().join("merged"), 10_000, fixed_clock());
        merger.merge_groupable_transfer(&t1).unwrap();
        merger.merge_groupable_transfer(&t2).unwrap();

        let path = dir.path().join("merged").join("20260728-091400606-1.ach");
        let contents = std::fs::read_to_string(&path).unwrap();
        let file = AchFile::parse(&contents).unwrap();
        assert_eq!(file.batches.len(), 2);
    }

    #[test]
    fn exceeding_the_line_cap_rolls_over_to_a_new_sequence() {
        let dir = tempdir().unwrap();
        let store = Store::temporary().unwrap();
        store.source_files.put("f1", &single_batch_file("091400600000001").write()).unwrap();
        store.source_files.put("f2", &single_batch_file("091400600000002").write()).unwrap();
        let t1 = sample_transfer("f1");
        let t2 = sample_transfer("f2");
        store.transfers.upsert(&t1).unwrap();
        store.transfers.upsert(&t2).unwrap();

        // A single-batch file occupies exactly 5 lines; capping at 5 lets the
        // first merge through untouched and forces the second to roll over.
        let merger = Merger::new(store.clone(), dir.path().join("merged"), 5, fixed_clock());
        merger.merge_groupable_transfer(&t1).unwrap();
        let finalized = merger.merge_groupable_transfer(&t2).unwrap();

        assert!(finalized.is_some());
        let finalized = finalized.unwrap();
        assert_eq!(finalized.filename, "20260728-091400606-1.ach");

        let new_current = dir.path().join("merged").join("20260728-091400606-2.ach");
        assert!(new_current.exists());
    }

    #[test]
    fn remove_entry_excises_batch_from_open_file() {
        let dir = tempdir().unwrap();
        let store = Store::temporary().unwrap();
        store.source_files.put("f1", &single_batch_file("091400600000001").write()).unwrap();
        let t1 = sample_transfer("f1");
        store.transfers.upsert(&t1).unwrap();

        let merger = Merger::new(store.clone(), dir.path().join("merged"), 10_000, fixed_clock());
        merger.merge_groupable_transfer(&t1).unwrap();

        assert!(merger.remove_entry("091400600000001").unwrap());
        let path = dir.path().join("merged").join("20260728-091400606-1.ach");
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(AchFile::parse(&contents).unwrap().is_empty());
    }

    #[test]
    fn remove_entry_is_false_when_trace_number_unknown() {
        let dir = tempdir().unwrap();
        let store = Store::temporary().unwrap();
        let merger = Merger::new(store, dir.path().join("merged"), 10_000, fixed_clock());
        assert!(!merger.remove_entry("091400600000099").unwrap());
    }
}
