use crate::error::{CodecError, Result};
use crate::fields::{alpha, numeric, parse_numeric, slice, RECORD_LENGTH};
use crate::file_header::parse_yymmdd;
use ach_types::{RoutingNumber, SecEntryClass};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceClassCode {
    MixedDebitsAndCredits,
    CreditsOnly,
    DebitsOnly,
}

impl ServiceClassCode {
    fn code(self) -> u64 {
        match self {
            Self::MixedDebitsAndCredits => 200,
            Self::CreditsOnly => 220,
            Self::DebitsOnly => 225,
        }
    }

    fn parse(value: u64) -> Result<Self> {
        match value {
            200 => Ok(Self::MixedDebitsAndCredits),
            220 => Ok(Self::CreditsOnly),
            225 => Ok(Self::DebitsOnly),
            other => Err(CodecError::InvalidField {
                field: "service_class_code",
                value: other.to_string(),
            }),
        }
    }
}

/// Record type 5: opens a batch of entries sharing an SEC code and effective date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchHeader {
    pub service_class_code: ServiceClassCode,
    pub company_name: String,
    pub company_discretionary_data: String,
    pub company_identification: String,
    pub sec_code: SecEntryClass,
    pub company_entry_description: String,
    pub effective_entry_date: NaiveDate,
    pub originating_dfi: RoutingNumber,
    pub batch_number: u32,
}

impl BatchHeader {
    pub fn parse(line: &str) -> Result<Self> {
        if line.len() < RECORD_LENGTH {
            return Err(CodecError::RecordTooShort {
                expected: RECORD_LENGTH,
                actual: line.len(),
            });
        }
        let record_type = line.chars().next().unwrap();
        if record_type != '5' {
            return Err(CodecError::WrongRecordType {
                expected: '5',
                found: record_type,
            });
        }

        let service_class = parse_numeric("service_class_code", slice(line, "service_class_code", 1, 4)?)?;
        let company_name = slice(line, "company_name", 4, 20)?;
        let discretionary = slice(line, "company_discretionary_data", 20, 40)?;
        let company_id = slice(line, "company_identification", 40, 50)?;
        let sec_code = slice(line, "sec_code", 50, 53)?;
        let description = slice(line, "company_entry_description", 53, 63)?;
        let effective_date = slice(line, "effective_entry_date", 69, 75)?;
        let originating_dfi = slice(line, "originating_dfi", 79, 87)?;
        let batch_number = slice(line, "batch_number", 87, 94)?;

        Ok(Self {
            service_class_code: ServiceClassCode::parse(service_class)?,
            company_name: company_name.trim_end().to_string(),
            company_discretionary_data: discretionary.trim_end().to_string(),
            company_identification: company_id.trim_end().to_string(),
            sec_code: sec_code
                .trim()
                .parse()
                .map_err(|_| CodecError::InvalidField {
                    field: "sec_code",
                    value: sec_code.to_string(),
                })?,
            company_entry_description: description.trim_end().to_string(),
            effective_entry_date: parse_yymmdd("effective_entry_date", effective_date)?,
            originating_dfi: eight_digit_routing(originating_dfi)?,
            batch_number: parse_numeric("batch_number", batch_number)? as u32,
        })
    }

    pub fn write(&self) -> String {
        let originating_dfi = self.originating_dfi.as_str();
        format!(
            "5{service}{name}{disc}{company_id}{sec}{desc}{date_blank}{effective}{settlement}{status}{odfi}{batch}",
            service = numeric(self.service_class_code.code(), 3),
            name = alpha(&self.company_name, 16),
            disc = alpha(&self.company_discretionary_data, 20),
            company_id = alpha(&self.company_identification, 10),
            sec = self.sec_code.as_str(),
            desc = alpha(&self.company_entry_description, 10),
            date_blank = alpha("", 6),
            effective = self.effective_entry_date.format("%y%m%d"),
            settlement = alpha("", 3),
            status = "1",
            odfi = &originating_dfi[0..8],
            batch = numeric(self.batch_number as u64, 7),
        )
    }
}

/// The originating DFI field in batch/entry records is the first 8 digits
/// of the routing number (the check digit is dropped). We reconstruct the
/// full 9-digit routing number by recomputing the ABA check digit.
fn eight_digit_routing(eight_digits: &str) -> Result<RoutingNumber> {
    if eight_digits.len() != 8 || !eight_digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::InvalidField {
            field: "originating_dfi",
            value: eight_digits.to_string(),
        });
    }
    let digits: Vec<u32> = eight_digits.bytes().map(|b| (b - b'0') as u32).collect();
    let weights = [3, 7, 1, 3, 7, 1, 3, 7];
    let sum: u32 = digits.iter().zip(weights.iter()).map(|(d, w)| d * w).sum();
    let check = (10 - (sum % 10)) % 10;
    RoutingNumber::parse(&format!("{eight_digits}{check}")).map_err(CodecError::Routing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BatchHeader {
        BatchHeader {
            service_class_code: ServiceClassCode::CreditsOnly,
            company_name: "ACME CORP".to_string(),
            company_discretionary_data: String::new(),
            company_identification: "1091400606".to_string(),
            sec_code: SecEntryClass::Ppd,
            company_entry_description: "PAYROLL".to_string(),
            effective_entry_date: NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
            originating_dfi: RoutingNumber::parse("091400606").unwrap(),
            batch_number: 1,
        }
    }

    #[test]
    fn roundtrips_through_write_and_parse() {
        let header = sample();
        let line = header.write();
        assert_eq!(line.len(), RECORD_LENGTH);
        let parsed = BatchHeader::parse(&line).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn eight_digit_routing_recomputes_check_digit() {
        let full = RoutingNumber::parse("091400606").unwrap();
        assert_eq!(eight_digit_routing(&full.as_str()[0..8]).unwrap(), full);
    }
}
