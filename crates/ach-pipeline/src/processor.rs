//! Polls every configured ODFI for inbound and return files, classifies
//! each entry's addenda, and applies the resulting transfer/depository
//! state changes (spec.md §4.4).
//!
//! Follows the same resolve-then-dispatch shape the uploader uses, run in
//! the opposite direction: download, classify, mutate store state, then
//! acknowledge by deleting the remote file.

use crate::error::Result;
use ach_codec::{hash_account_number, hash_account_number_hex, Addenda, AchFile, Entry};
use ach_core::{Clock, Metrics};
use ach_store::{ConfigRepository, Store};
use ach_transport::{check_hostname_allowed, make_agent, Agent, RemoteFile};
use ach_types::return_code::{ChangeDisposition, ReturnDisposition};
use ach_types::{Addenda98, Addenda99, FileTransferConfig, RoutingNumber, SecEntryClass, TransferStatus};
use chrono::NaiveDate;
use std::sync::Arc;

#[derive(Clone)]
pub struct Processor {
    store: Store,
    metrics: Arc<dyn Metrics>,
    clock: Arc<dyn Clock>,
    /// Whether `C01`/`C02`/`C03`/`C06`/`C07` corrections are allowed to
    /// mutate a depository's routing/account-number fields. Off by default:
    /// an operator opts in once they trust the upstream RDFI feed (spec.md
    /// §9 Open Question, resolved in DESIGN.md).
    update_depositories_from_nocs: bool,
}

impl Processor {
    pub fn new(store: Store, metrics: Arc<dyn Metrics>, clock: Arc<dyn Clock>, update_depositories_from_nocs: bool) -> Self {
        Self { store, metrics, clock, update_depositories_from_nocs }
    }

    /// spec §4.4 step 1: poll every configured routing number. One
    /// destination's transport or parse failure must not stop the rest
    /// from being processed this tick.
    pub async fn process_all(&self, config: &ConfigRepository) -> Result<()> {
        for transfer_config in config.all_transfer_configs() {
            if let Err(e) = self.process_one(transfer_config).await {
                tracing::error!(routing_number = %transfer_config.routing_number, error = %e, "failed to process inbound/return files for destination");
            }
        }
        Ok(())
    }

    async fn process_one(&self, config: &FileTransferConfig) -> Result<()> {
        let agent = make_agent(config);
        check_hostname_allowed(agent.hostname(), config.port, &config.allowed_ips).await?;

        let inbound = agent.get_inbound_files().await?;
        for file in inbound {
            self.process_file(agent.as_ref(), config, &config.inbound_path, file).await;
        }

        let returns = agent.get_return_files().await?;
        for file in returns {
            self.process_file(agent.as_ref(), config, &config.return_path, file).await;
        }

        Ok(())
    }

    /// Parses one downloaded file and applies every entry's addenda effect.
    /// A single bad entry is logged and skipped rather than aborting the
    /// rest of the file; the remote file is deleted once every entry has
    /// been attempted, whether or not all of them succeeded.
    async fn process_file(&self, agent: &dyn Agent, config: &FileTransferConfig, remote_dir: &str, file: RemoteFile) {
        let contents = String::from_utf8_lossy(&file.contents).into_owned();
        match AchFile::parse_tolerant(&contents, config.routing_number) {
            Ok(parsed) => {
                for batch in &parsed.batches {
                    for entry in &batch.entries {
                        for addenda in &entry.addenda {
                            match addenda {
                                Addenda::Return(return_addenda) => {
                                    if let Err(e) =
                                        self.handle_return(batch.header.sec_code, batch.header.effective_entry_date, entry, return_addenda)
                                    {
                                        tracing::error!(trace_number = %entry.detail.trace_number, error = %e, "failed to apply return");
                                    }
                                }
                                Addenda::Change(change_addenda) => {
                                    if self.update_depositories_from_nocs {
                                        if let Err(e) = self.handle_change(entry, change_addenda) {
                                            tracing::error!(trace_number = %entry.detail.trace_number, error = %e, "failed to apply notification of change");
                                        }
                                    } else {
                                        tracing::info!(trace_number = %entry.detail.trace_number, "notification of change received, depository updates disabled");
                                    }
                                }
                                Addenda::Payment(_) => {}
                            }
                        }

                        if entry.detail.transaction_code.is_prenote {
                            if let Err(e) = self.handle_prenote(entry) {
                                tracing::error!(trace_number = %entry.detail.trace_number, error = %e, "failed to reconcile prenote");
                            }
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(filename = %file.filename, error = %e, "could not parse downloaded file, leaving on remote for inspection");
                return;
            }
        }

        let remote_path = format!("{}/{}", remote_dir.trim_end_matches('/'), file.filename);
        if let Err(e) = agent.delete(&remote_path).await {
            tracing::warn!(path = %remote_path, error = %e, "downloaded file processed but remote delete failed, may be reprocessed next tick");
        }
    }

    /// spec §4.4 step 2: resolve the originating transfer by
    /// `(SEC code, amount, trace number, effective date window)` and apply
    /// the return code's disposition. `effective_entry_date` is the
    /// returned batch's own header field, not the time this file happens to
    /// be processed — a return can arrive well after its effective date.
    fn handle_return(&self, sec_code: SecEntryClass, effective_entry_date: NaiveDate, entry: &Entry, addenda: &Addenda99) -> Result<()> {
        let effective_date = effective_entry_date.and_hms_opt(0, 0, 0).expect("midnight is always valid").and_utc();
        let disposition = addenda.return_code.disposition();
        let target_status = match disposition {
            ReturnDisposition::RejectDepository => TransferStatus::Reclaimed,
            ReturnDisposition::FailTransfer | ReturnDisposition::FormatErrorFailTransfer => TransferStatus::Failed,
        };

        let found = self.store.transfers.find_for_return(
            sec_code,
            entry.detail.amount_cents,
            &addenda.original_entry_trace_number,
            effective_date,
            5,
        )?;

        let Some(transfer) = found else {
            self.metrics.incr("missing_return_transfers", &[]);
            tracing::warn!(trace_number = %addenda.original_entry_trace_number, "no transfer found matching returned entry");
            return Ok(());
        };

        self.store.transfers.apply_return(transfer.id, addenda.return_code.as_str(), target_status)?;

        if disposition == ReturnDisposition::RejectDepository {
            self.store.depositories.reject(transfer.receiver_depository_id)?;
        }

        Ok(())
    }

    /// spec §4.4 step 3: folds every disposition a change code carries.
    /// Account/routing-number corrections only ever touch the lookup hash
    /// or the plaintext routing field — this crate holds no encryption key
    /// for `encrypted_account_number`, so a corrected account number cannot
    /// be re-sealed here (see DESIGN.md).
    fn handle_change(&self, entry: &Entry, addenda: &Addenda98) -> Result<()> {
        let hashed = hash_account_number(&entry.detail.receiving_dfi, &entry.detail.dfi_account_number);
        let Some(depository) = self.store.depositories.lookup_from_return(entry.detail.receiving_dfi, &hashed)? else {
            self.metrics.incr("missing_change_depositories", &[]);
            tracing::warn!(
                trace_number = %addenda.trace_number,
                hashed_account_number = %hash_account_number_hex(&hashed),
                "no depository found matching notification of change"
            );
            return Ok(());
        };

        for disposition in addenda.change_code.dispositions() {
            match disposition {
                ChangeDisposition::UpdateAccountNumber => {
                    let new_hashed = hash_account_number(&depository.routing_number, &addenda.corrected_data);
                    self.store.depositories.update_hashed_account_number(depository.id, new_hashed, self.clock.now())?;
                }
                ChangeDisposition::UpdateRoutingNumber => match RoutingNumber::parse(addenda.corrected_data.trim()) {
                    Ok(new_routing) => {
                        self.store.depositories.update_routing_number(depository.id, new_routing, self.clock.now())?;
                    }
                    Err(e) => {
                        tracing::warn!(change_code = %addenda.change_code.as_str(), error = %e, "corrected routing number did not parse");
                    }
                },
                ChangeDisposition::RejectDepository => {
                    self.store.depositories.reject(depository.id)?;
                }
                ChangeDisposition::UpdateIndividualName | ChangeDisposition::UpdateOriginatorIdentification => {
                    tracing::info!(
                        change_code = %addenda.change_code.as_str(),
                        depository_id = %depository.id,
                        "notification of change requires operator follow-up, no depository field models this correction"
                    );
                }
                ChangeDisposition::FormatError => {
                    tracing::warn!(change_code = %addenda.change_code.as_str(), "notification of change carried a format error, no state mutated");
                }
            }
        }

        Ok(())
    }

    /// spec §4.4 step 4: a returned prenote (zero-dollar test entry)
    /// means the RDFI accepted the account, so its depository is
    /// verified. Already-verified depositories are left alone.
    fn handle_prenote(&self, entry: &Entry) -> Result<()> {
        let hashed = hash_account_number(&entry.detail.receiving_dfi, &entry.detail.dfi_account_number);
        let Some(depository) = self.store.depositories.lookup_from_return(entry.detail.receiving_dfi, &hashed)? else {
            return Ok(());
        };

        match self.store.depositories.verify(depository.id) {
            Ok(_) => Ok(()),
            Err(ach_store::StoreError::IllegalDepository(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ach_codec::{EntryDetail, TransactionCode};
    use ach_core::{FixedClock, InMemoryMetrics};
    use ach_types::{AccountType, DepositoryId, Money, OriginatorId, ReceiverId, Transfer, TransferType, UserId};
    use chrono::{TimeZone, Utc};

    fn routing() -> RoutingNumber {
        RoutingNumber::parse("091400606").unwrap()
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 7, 28, 9, 0, 0).unwrap()))
    }

    fn sample_entry(trace: &str, account: &str) -> Entry {
        Entry {
            detail: EntryDetail {
                transaction_code: TransactionCode { account_type: AccountType::Checking, direction: TransferType::Push, is_prenote: false },
                receiving_dfi: routing(),
                dfi_account_number: account.to_string(),
                amount_cents: 1500,
                individual_identification_number: "EMP001".to_string(),
                individual_name: "JANE DOE".to_string(),
                discretionary_data: String::new(),
                addenda_record_indicator: true,
                trace_number: trace.to_string(),
            },
            addenda: Vec::new(),
        }
    }

    fn sample_transfer(trace: &str) -> Transfer {
        Transfer {
            id: ach_types::TransferId::new(),
            user_id: UserId::new(),
            transfer_type: TransferType::Push,
            amount: Money::usd_cents(1500).unwrap(),
            originator_id: OriginatorId::new(),
            originator_depository_id: DepositoryId::new(),
            receiver_id: ReceiverId::new(),
            receiver_depository_id: DepositoryId::new(),
            description: "payroll".to_string(),
            sec_code: SecEntryClass::Ppd,
            status: TransferStatus::Processed,
            same_day: false,
            merged_filename: Some("20260728-091400606-1.ach".to_string()),
            trace_number: Some(trace.to_string()),
            return_code: None,
            source_file_id: "file-1".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 7, 28, 9, 0, 0).unwrap(),
            deleted_at: None,
        }
    }

    fn processor() -> Processor {
        Processor::new(Store::temporary().unwrap(), Arc::new(InMemoryMetrics::new()), clock(), true)
    }

    #[test]
    fn handle_return_rejects_depository_and_reclaims_transfer() {
        let processor = processor();
        let transfer = sample_transfer("091400600000001");
        processor.store.transfers.upsert(&transfer).unwrap();

        let entry = sample_entry("091400600000099", "123456789");
        let addenda = Addenda99 {
            return_code: ach_types::ReturnCode::R02,
            original_entry_trace_number: "091400600000001".to_string(),
            original_receiving_dfi: "09140060".to_string(),
            addenda_information: String::new(),
            trace_number: "091400600000099".to_string(),
        };

        let effective_entry_date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        processor.handle_return(SecEntryClass::Ppd, effective_entry_date, &entry, &addenda).unwrap();

        let updated = processor.store.transfers.get(transfer.id).unwrap().unwrap();
        assert_eq!(updated.status, TransferStatus::Reclaimed);
        assert_eq!(updated.return_code.as_deref(), Some("R02"));
    }

    #[test]
    fn handle_return_matches_on_the_batch_effective_date_not_processing_time() {
        // The processor is invoked well after the return's effective date
        // (simulating a delayed RDFI return file); the match must still
        // succeed because it keys off the batch header, not the clock.
        let processor = Processor::new(
            Store::temporary().unwrap(),
            Arc::new(InMemoryMetrics::new()),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap())),
            true,
        );
        let transfer = sample_transfer("091400600000001");
        processor.store.transfers.upsert(&transfer).unwrap();

        let entry = sample_entry("091400600000099", "123456789");
        let addenda = Addenda99 {
            return_code: ach_types::ReturnCode::R02,
            original_entry_trace_number: "091400600000001".to_string(),
            original_receiving_dfi: "09140060".to_string(),
            addenda_information: String::new(),
            trace_number: "091400600000099".to_string(),
        };

        let effective_entry_date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        processor.handle_return(SecEntryClass::Ppd, effective_entry_date, &entry, &addenda).unwrap();

        let updated = processor.store.transfers.get(transfer.id).unwrap().unwrap();
        assert_eq!(updated.status, TransferStatus::Reclaimed);
    }

    #[test]
    fn handle_return_with_no_match_records_metric_and_does_not_error() {
        let processor = processor();
        let entry = sample_entry("091400600000099", "123456789");
        let addenda = Addenda99 {
            return_code: ach_types::ReturnCode::R01,
            original_entry_trace_number: "unknown-trace".to_string(),
            original_receiving_dfi: "09140060".to_string(),
            addenda_information: String::new(),
            trace_number: "091400600000099".to_string(),
        };

        let effective_entry_date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        processor.handle_return(SecEntryClass::Ppd, effective_entry_date, &entry, &addenda).unwrap();
    }

    #[test]
    fn handle_change_updates_hashed_account_number() {
        let processor = processor();
        let routing = routing();
        let hashed = hash_account_number(&routing, "123456789");
        let depository = ach_types::Depository {
            id: DepositoryId::new(),
            user_id: UserId::new(),
            bank_name: "First Bank".to_string(),
            holder_name: "Jane Doe".to_string(),
            holder_type: ach_types::HolderType::Individual,
            account_type: AccountType::Checking,
            routing_number: routing,
            encrypted_account_number: vec![0xde, 0xad],
            hashed_account_number: hashed,
            status: ach_types::DepositoryStatus::Verified,
            metadata: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        processor.store.depositories.upsert(&depository).unwrap();

        let entry = sample_entry("091400600000099", "123456789");
        let addenda = Addenda98 {
            change_code: ach_types::ChangeCode::C01,
            original_entry_trace_number: "091400600000001".to_string(),
            original_receiving_dfi: "091".to_string(),
            corrected_data: "987654321".to_string(),
            trace_number: "091400600000099".to_string(),
        };

        processor.handle_change(&entry, &addenda).unwrap();

        let updated = processor.store.depositories.get(depository.id).unwrap().unwrap();
        assert_eq!(updated.hashed_account_number, hash_account_number(&routing, "987654321"));
        assert_eq!(updated.status, ach_types::DepositoryStatus::Unverified);
    }

    #[test]
    fn handle_prenote_verifies_unverified_depository() {
        let processor = processor();
        let routing = routing();
        let hashed = hash_account_number(&routing, "123456789");
        let depository = ach_types::Depository {
            id: DepositoryId::new(),
            user_id: UserId::new(),
            bank_name: "First Bank".to_string(),
            holder_name: "Jane Doe".to_string(),
            holder_type: ach_types::HolderType::Individual,
            account_type: AccountType::Checking,
            routing_number: routing,
            encrypted_account_number: vec![0xde, 0xad],
            hashed_account_number: hashed,
            status: ach_types::DepositoryStatus::Unverified,
            metadata: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        processor.store.depositories.upsert(&depository).unwrap();

        let mut entry = sample_entry("091400600000099", "123456789");
        entry.detail.transaction_code.is_prenote = true;

        processor.handle_prenote(&entry).unwrap();

        let updated = processor.store.depositories.get(depository.id).unwrap().unwrap();
        assert_eq!(updated.status, ach_types::DepositoryStatus::Verified);
    }

    #[test]
    fn handle_prenote_on_already_verified_depository_is_not_an_error() {
        let processor = processor();
        let routing = routing();
        let hashed = hash_account_number(&routing, "123456789");
        let depository = ach_types::Depository {
            id: DepositoryId::new(),
            user_id: UserId::new(),
            bank_name: "First Bank".to_string(),
            holder_name: "Jane Doe".to_string(),
            holder_type: ach_types::HolderType::Individual,
            account_type: AccountType::Checking,
            routing_number: routing,
            encrypted_account_number: vec![0xde, 0xad],
            hashed_account_number: hashed,
            status: ach_types::DepositoryStatus::Verified,
            metadata: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        processor.store.depositories.upsert(&depository).unwrap();

        let mut entry = sample_entry("091400600000099", "123456789");
        entry.detail.transaction_code.is_prenote = true;

        processor.handle_prenote(&entry).unwrap();
    }
}
