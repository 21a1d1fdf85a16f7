use crate::error::{CodecError, Result};
use crate::fields::{alpha, numeric, parse_i64, parse_numeric, slice, RECORD_LENGTH};
use ach_types::{AccountType, RoutingNumber, TransferType};

/// The combination of account type and push/pull direction a NACHA
/// transaction code encodes. Prenotes (zero-dollar test entries, codes
/// 23/28/33/38) are represented by `is_prenote` rather than separate
/// variants, since every other field is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionCode {
    pub account_type: AccountType,
    pub direction: TransferType,
    pub is_prenote: bool,
}

impl TransactionCode {
    pub fn code(self) -> u64 {
        match (self.account_type, self.direction, self.is_prenote) {
            (AccountType::Checking, TransferType::Push, false) => 22,
            (AccountType::Checking, TransferType::Push, true) => 23,
            (AccountType::Checking, TransferType::Pull, false) => 27,
            (AccountType::Checking, TransferType::Pull, true) => 28,
            (AccountType::Savings, TransferType::Push, false) => 32,
            (AccountType::Savings, TransferType::Push, true) => 33,
            (AccountType::Savings, TransferType::Pull, false) => 37,
            (AccountType::Savings, TransferType::Pull, true) => 38,
        }
    }

    pub fn parse(code: u64) -> Result<Self> {
        let (account_type, direction, is_prenote) = match code {
            22 => (AccountType::Checking, TransferType::Push, false),
            23 => (AccountType::Checking, TransferType::Push, true),
            27 => (AccountType::Checking, TransferType::Pull, false),
            28 => (AccountType::Checking, TransferType::Pull, true),
            32 => (AccountType::Savings, TransferType::Push, false),
            33 => (AccountType::Savings, TransferType::Push, true),
            37 => (AccountType::Savings, TransferType::Pull, false),
            38 => (AccountType::Savings, TransferType::Pull, true),
            other => {
                return Err(CodecError::InvalidField {
                    field: "transaction_code",
                    value: other.to_string(),
                })
            }
        };
        Ok(Self {
            account_type,
            direction,
            is_prenote,
        })
    }
}

/// Record type 6: one per transfer leg. `addenda_record_indicator` must be
/// `1` whenever this entry is followed by an addenda (05/98/99) record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDetail {
    pub transaction_code: TransactionCode,
    pub receiving_dfi: RoutingNumber,
    pub dfi_account_number: String,
    pub amount_cents: i64,
    pub individual_identification_number: String,
    pub individual_name: String,
    pub discretionary_data: String,
    pub addenda_record_indicator: bool,
    pub trace_number: String,
}

impl EntryDetail {
    pub fn parse(line: &str) -> Result<Self> {
        if line.len() < RECORD_LENGTH {
            return Err(CodecError::RecordTooShort {
                expected: RECORD_LENGTH,
                actual: line.len(),
            });
        }
        let record_type = line.chars().next().unwrap();
        if record_type != '6' {
            return Err(CodecError::WrongRecordType {
                expected: '6',
                found: record_type,
            });
        }

        let transaction_code = parse_numeric("transaction_code", slice(line, "transaction_code", 1, 3)?)?;
        let receiving_dfi_digits = slice(line, "receiving_dfi", 3, 11)?;
        let check_digit = slice(line, "check_digit", 11, 12)?;
        let account_number = slice(line, "dfi_account_number", 12, 29)?;
        let amount = slice(line, "amount", 29, 39)?;
        let individual_id = slice(line, "individual_identification_number", 39, 54)?;
        let individual_name = slice(line, "individual_name", 54, 76)?;
        let discretionary = slice(line, "discretionary_data", 76, 78)?;
        let addenda_indicator = slice(line, "addenda_record_indicator", 78, 79)?;
        let trace_number = slice(line, "trace_number", 79, 94)?;

        let routing = RoutingNumber::parse(&format!("{receiving_dfi_digits}{check_digit}"))?;

        Ok(Self {
            transaction_code: TransactionCode::parse(transaction_code)?,
            receiving_dfi: routing,
            dfi_account_number: account_number.trim_end().to_string(),
            amount_cents: parse_i64("amount", amount)?,
            individual_identification_number: individual_id.trim_end().to_string(),
            individual_name: individual_name.trim_end().to_string(),
            discretionary_data: discretionary.trim_end().to_string(),
            addenda_record_indicator: addenda_indicator == "1",
            trace_number: trace_number.trim().to_string(),
        })
    }

    pub fn write(&self) -> String {
        let routing_str = self.receiving_dfi.as_str();
        format!(
            "6{tc}{dfi}{check}{account}{amount}{indiv_id}{indiv_name}{disc}{addenda}{trace}",
            tc = numeric(self.transaction_code.code(), 2),
            dfi = &routing_str[0..8],
            check = &routing_str[8..9],
            account = alpha(&self.dfi_account_number, 17),
            amount = numeric(self.amount_cents.unsigned_abs(), 10),
            indiv_id = alpha(&self.individual_identification_number, 15),
            indiv_name = alpha(&self.individual_name, 22),
            disc = alpha(&self.discretionary_data, 2),
            addenda = if self.addenda_record_indicator { "1" } else { "0" },
            trace = alpha(&self.trace_number, 15),
        )
    }
}
