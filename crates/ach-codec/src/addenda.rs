use crate::error::{CodecError, Result};
use crate::fields::{alpha, numeric, parse_numeric, slice, RECORD_LENGTH};
use ach_types::{ChangeCode, ReturnCode};

/// Record type 7, addenda type code 05: free-form payment-related info
/// attached to a PPD/CCD/WEB entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addenda05 {
    pub payment_related_information: String,
    pub addenda_sequence_number: u32,
    pub entry_detail_sequence_number: u32,
}

impl Addenda05 {
    pub fn parse(line: &str) -> Result<Self> {
        expect_addenda_type(line, "05")?;
        let info = slice(line, "payment_related_information", 3, 83)?;
        let seq = slice(line, "addenda_sequence_number", 83, 87)?;
        let entry_seq = slice(line, "entry_detail_sequence_number", 87, 94)?;
        Ok(Self {
            payment_related_information: info.trim_end().to_string(),
            addenda_sequence_number: parse_numeric("addenda_sequence_number", seq)? as u32,
            entry_detail_sequence_number: parse_numeric("entry_detail_sequence_number", entry_seq)? as u32,
        })
    }

    pub fn write(&self) -> String {
        format!(
            "705{info}{seq}{entry_seq}",
            info = alpha(&self.payment_related_information, 80),
            seq = numeric(self.addenda_sequence_number as u64, 4),
            entry_seq = numeric(self.entry_detail_sequence_number as u64, 7),
        )
    }
}

/// Record type 7, addenda type code 98: a Notification of Change, carrying
/// the corrected field value the RDFI is telling us to use going forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addenda98 {
    pub change_code: ChangeCode,
    pub original_entry_trace_number: String,
    pub original_receiving_dfi: String,
    pub corrected_data: String,
    pub trace_number: String,
}

impl Addenda98 {
    pub fn parse(line: &str) -> Result<Self> {
        expect_addenda_type(line, "98")?;
        let change_code = slice(line, "change_code", 3, 6)?;
        let original_trace = slice(line, "original_entry_trace_number", 6, 21)?;
        let original_dfi = slice(line, "original_receiving_dfi", 21, 24)?;
        let corrected = slice(line, "corrected_data", 24, 58)?;
        let own_trace = slice(line, "trace_number", 79, 94)?;

        Ok(Self {
            change_code: ChangeCode::parse(change_code.trim()),
            original_entry_trace_number: original_trace.trim().to_string(),
            original_receiving_dfi: original_dfi.trim().to_string(),
            corrected_data: corrected.trim_end().to_string(),
            trace_number: own_trace.trim().to_string(),
        })
    }

    pub fn write(&self) -> String {
        format!(
            "798{code}{orig_trace}{orig_dfi}{corrected}{filler}{trace}",
            code = self.change_code.as_str(),
            orig_trace = alpha(&self.original_entry_trace_number, 15),
            orig_dfi = alpha(&self.original_receiving_dfi, 3),
            corrected = alpha(&self.corrected_data, 34),
            filler = alpha("", 21),
            trace = alpha(&self.trace_number, 15),
        )
    }
}

/// Record type 7, addenda type code 99: a Return, carrying the reason the
/// RDFI is handing the entry back unprocessed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addenda99 {
    pub return_code: ReturnCode,
    pub original_entry_trace_number: String,
    pub original_receiving_dfi: String,
    pub addenda_information: String,
    pub trace_number: String,
}

impl Addenda99 {
    pub fn parse(line: &str) -> Result<Self> {
        expect_addenda_type(line, "99")?;
        let code = slice(line, "return_reason_code", 3, 6)?;
        let original_trace = slice(line, "original_entry_trace_number", 6, 21)?;
        let original_dfi = slice(line, "original_receiving_dfi", 27, 35)?;
        let info = slice(line, "addenda_information", 35, 79)?;
        let own_trace = slice(line, "trace_number", 79, 94)?;

        Ok(Self {
            return_code: ReturnCode::parse(code.trim()),
            original_entry_trace_number: original_trace.trim().to_string(),
            original_receiving_dfi: original_dfi.trim().to_string(),
            addenda_information: info.trim_end().to_string(),
            trace_number: own_trace.trim().to_string(),
        })
    }

    pub fn write(&self) -> String {
        format!(
            "799{code}{orig_trace}{date_of_death}{orig_dfi}{info}{trace}",
            code = self.return_code.as_str(),
            orig_trace = alpha(&self.original_entry_trace_number, 15),
            date_of_death = alpha("", 6),
            orig_dfi = alpha(&self.original_receiving_dfi, 8),
            info = alpha(&self.addenda_information, 44),
            trace = alpha(&self.trace_number, 15),
        )
    }
}

fn expect_addenda_type(line: &str, expected: &'static str) -> Result<()> {
    if line.len() < RECORD_LENGTH {
        return Err(CodecError::RecordTooShort {
            expected: RECORD_LENGTH,
            actual: line.len(),
        });
    }
    let record_type = line.chars().next().unwrap();
    if record_type != '7' {
        return Err(CodecError::WrongRecordType {
            expected: '7',
            found: record_type,
        });
    }
    let addenda_type = slice(line, "addenda_type_code", 1, 3)?;
    if addenda_type != expected {
        return Err(CodecError::InvalidField {
            field: "addenda_type_code",
            value: addenda_type.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addenda05_roundtrips() {
        let a = Addenda05 {
            payment_related_information: "INVOICE 42".to_string(),
            addenda_sequence_number: 1,
            entry_detail_sequence_number: 1,
        };
        let line = a.write();
        assert_eq!(line.len(), RECORD_LENGTH);
        assert_eq!(Addenda05::parse(&line).unwrap(), a);
    }

    #[test]
    fn addenda98_roundtrips() {
        let a = Addenda98 {
            change_code: ChangeCode::C01,
            original_entry_trace_number: "091400600000001".to_string(),
            original_receiving_dfi: "091".to_string(),
            corrected_data: "123456789".to_string(),
            trace_number: "091400600000099".to_string(),
        };
        let line = a.write();
        assert_eq!(line.len(), RECORD_LENGTH);
        assert_eq!(Addenda98::parse(&line).unwrap(), a);
    }

    #[test]
    fn addenda99_roundtrips() {
        let a = Addenda99 {
            return_code: ReturnCode::R01,
            original_entry_trace_number: "091400600000001".to_string(),
            original_receiving_dfi: "09140060".to_string(),
            addenda_information: String::new(),
            trace_number: "091400600000099".to_string(),
        };
        let line = a.write();
        assert_eq!(line.len(), RECORD_LENGTH);
        assert_eq!(Addenda99::parse(&line).unwrap(), a);
    }
}
