//! A batch: one [`BatchHeader`], its [`Entry`] records, and a computed
//! [`BatchControl`]. Batch equality (used by the merger to dedup) is
//! structural, not by position in the source file.

use crate::addenda::{Addenda05, Addenda98, Addenda99};
use crate::batch_header::BatchHeader;
use crate::control::BatchControl;
use crate::entry_detail::EntryDetail;
use crate::error::{CodecError, Result};
use crate::fields::RECORD_LENGTH;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addenda {
    Payment(Addenda05),
    Change(Addenda98),
    Return(Addenda99),
}

impl Addenda {
    fn write(&self) -> String {
        match self {
            Addenda::Payment(a) => a.write(),
            Addenda::Change(a) => a.write(),
            Addenda::Return(a) => a.write(),
        }
    }

    /// Dispatches on the addenda type code (bytes 1..3) without assuming
    /// which kind a batch carries; return files mix 98s and 99s.
    fn parse(line: &str) -> Result<Self> {
        let type_code = line.get(1..3).ok_or(CodecError::InvalidField {
            field: "addenda_type_code",
            value: line.to_string(),
        })?;
        match type_code {
            "05" => Ok(Addenda::Payment(Addenda05::parse(line)?)),
            "98" => Ok(Addenda::Change(Addenda98::parse(line)?)),
            "99" => Ok(Addenda::Return(Addenda99::parse(line)?)),
            other => Err(CodecError::InvalidField { field: "addenda_type_code", value: other.to_string() }),
        }
    }

    pub fn as_return(&self) -> Option<&Addenda99> {
        match self {
            Addenda::Return(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_change(&self) -> Option<&Addenda98> {
        match self {
            Addenda::Change(a) => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub detail: EntryDetail,
    pub addenda: Vec<Addenda>,
}

impl Entry {
    pub fn line_count(&self) -> usize {
        1 + self.addenda.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub header: BatchHeader,
    pub entries: Vec<Entry>,
}

impl Batch {
    pub fn line_count(&self) -> usize {
        // header + entries (+ their addenda) + control
        2 + self.entries.iter().map(Entry::line_count).sum::<usize>()
    }

    pub fn control(&self) -> BatchControl {
        let mut debit = 0i64;
        let mut credit = 0i64;
        let mut hash: u64 = 0;
        let mut addenda_count = 0u32;
        for e in &self.entries {
            addenda_count += 1 + e.addenda.len() as u32;
            let eight: u64 = e.detail.receiving_dfi.as_str()[0..8].parse().unwrap_or(0);
            hash += eight;
            use ach_types::TransferType;
            match e.detail.transaction_code.direction {
                TransferType::Push => credit += e.detail.amount_cents,
                TransferType::Pull => debit += e.detail.amount_cents,
            }
        }
        BatchControl {
            service_class_code: match self.header.service_class_code {
                crate::batch_header::ServiceClassCode::MixedDebitsAndCredits => 200,
                crate::batch_header::ServiceClassCode::CreditsOnly => 220,
                crate::batch_header::ServiceClassCode::DebitsOnly => 225,
            },
            entry_addenda_count: addenda_count,
            entry_hash: hash % 10_000_000_000,
            total_debit_cents: debit,
            total_credit_cents: credit,
            company_identification: self.header.company_identification.clone(),
            originating_dfi: self.header.originating_dfi.as_str()[0..8].to_string(),
            batch_number: self.header.batch_number,
        }
    }

    /// Parses the batch opened by `header_line` by consuming lines from
    /// `lines` up to and including its `BatchControl` (record type 8).
    pub fn parse<'a, I: Iterator<Item = &'a str>>(header_line: &str, lines: &mut std::iter::Peekable<I>) -> Result<Self> {
        let header = BatchHeader::parse(header_line)?;
        let mut entries = Vec::new();
        while let Some(&line) = lines.peek() {
            if line.len() < RECORD_LENGTH {
                lines.next();
                continue;
            }
            match line.chars().next() {
                Some('6') => {
                    lines.next();
                    let detail = EntryDetail::parse(line)?;
                    let mut addenda = Vec::new();
                    while detail.addenda_record_indicator {
                        let Some(&next) = lines.peek() else { break };
                        if next.starts_with('7') {
                            lines.next();
                            addenda.push(Addenda::parse(next)?);
                        } else {
                            break;
                        }
                    }
                    entries.push(Entry { detail, addenda });
                }
                Some('8') => {
                    lines.next();
                    break;
                }
                _ => break,
            }
        }
        Ok(Batch { header, entries })
    }

    pub fn write(&self) -> Vec<String> {
        let mut out = vec![self.header.write()];
        for e in &self.entries {
            out.push(e.detail.write());
            for a in &e.addenda {
                out.push(a.write());
            }
        }
        out.push(self.control().write());
        out
    }
}

/// Two batches are considered identical by NACHA field content, ignoring
/// `batch_number` (reassigned positionally when merged into a file).
pub fn batches_equal(a: &Batch, b: &Batch) -> bool {
    a.header.company_identification == b.header.company_identification
        && a.header.sec_code == b.header.sec_code
        && a.header.effective_entry_date == b.header.effective_entry_date
        && a.header.originating_dfi == b.header.originating_dfi
        && a.entries == b.entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch_header::ServiceClassCode;
    use crate::entry_detail::TransactionCode;
    use ach_types::{AccountType, RoutingNumber, SecEntryClass, TransferType};
    use chrono::NaiveDate;

    fn sample_batch(batch_number: u32) -> Batch {
        Batch {
            header: BatchHeader {
                service_class_code: ServiceClassCode::CreditsOnly,
                company_name: "ACME CORP".to_string(),
                company_discretionary_data: String::new(),
                company_identification: "1091400606".to_string(),
                sec_code: SecEntryClass::Ppd,
                company_entry_description: "PAYROLL".to_string(),
                effective_entry_date: NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
                originating_dfi: RoutingNumber::parse("091400606").unwrap(),
                batch_number,
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
        }
    }

    #[test]
    fn roundtrips_through_write_and_parse() {
        let batch = sample_batch(1);
        let lines = batch.write();
        assert_eq!(lines.len(), batch.line_count());
        let mut it = lines[1..].iter().map(|s| s.as_str()).peekable();
        let parsed = Batch::parse(&lines[0], &mut it).unwrap();
        assert_eq!(parsed.header, batch.header);
        assert_eq!(parsed.entries, batch.entries);
    }

    #[test]
    fn identical_content_is_equal_regardless_of_batch_number() {
        assert!(batches_equal(&sample_batch(1), &sample_batch(2)));
    }

    #[test]
    fn control_sums_credits() {
        let control = sample_batch(1).control();
        assert_eq!(control.total_credit_cents, 15000);
        assert_eq!(control.total_debit_cents, 0);
    }
}
