use crate::error::{CodecError, Result};
use crate::fields::{numeric, parse_i64, parse_numeric, slice, RECORD_LENGTH};

/// Record type 8: closes a batch with entry/addenda counts, a hash of the
/// receiving DFI digits, and debit/credit totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchControl {
    pub service_class_code: u64,
    pub entry_addenda_count: u32,
    pub entry_hash: u64,
    pub total_debit_cents: i64,
    pub total_credit_cents: i64,
    pub company_identification: String,
    pub originating_dfi: String,
    pub batch_number: u32,
}

impl BatchControl {
    pub fn parse(line: &str) -> Result<Self> {
        if line.len() < RECORD_LENGTH {
            return Err(CodecError::RecordTooShort { expected: RECORD_LENGTH, actual: line.len() });
        }
        let record_type = line.chars().next().unwrap();
        if record_type != '8' {
            return Err(CodecError::WrongRecordType { expected: '8', found: record_type });
        }
        Ok(Self {
            service_class_code: parse_numeric("service_class_code", slice(line, "service_class_code", 1, 4)?)?,
            entry_addenda_count: parse_numeric("entry_addenda_count", slice(line, "entry_addenda_count", 4, 10)?)? as u32,
            entry_hash: parse_numeric("entry_hash", slice(line, "entry_hash", 10, 20)?)?,
            total_debit_cents: parse_i64("total_debit", slice(line, "total_debit", 20, 32)?)?,
            total_credit_cents: parse_i64("total_credit", slice(line, "total_credit", 32, 44)?)?,
            company_identification: slice(line, "company_identification", 44, 54)?.trim_end().to_string(),
            originating_dfi: slice(line, "originating_dfi", 79, 87)?.trim().to_string(),
            batch_number: parse_numeric("batch_number", slice(line, "batch_number", 87, 94)?)? as u32,
        })
    }

    pub fn write(&self) -> String {
        format!(
            "8{service}{count}{hash}{debit}{credit}{company}{filler}{odfi}{batch}",
            service = numeric(self.service_class_code, 3),
            count = numeric(self.entry_addenda_count as u64, 6),
            hash = numeric(self.entry_hash, 10),
            debit = numeric(self.total_debit_cents.unsigned_abs(), 12),
            credit = numeric(self.total_credit_cents.unsigned_abs(), 12),
            company = crate::fields::alpha(&self.company_identification, 10),
            filler = crate::fields::alpha("", 25),
            odfi = crate::fields::alpha(&self.originating_dfi, 8),
            batch = numeric(self.batch_number as u64, 7),
        )
    }
}

/// Record type 9: closes the file with batch/block/entry counts and a hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileControl {
    pub batch_count: u32,
    pub block_count: u32,
    pub entry_addenda_count: u32,
    pub entry_hash: u64,
    pub total_debit_cents: i64,
    pub total_credit_cents: i64,
}

impl FileControl {
    pub fn parse(line: &str) -> Result<Self> {
        if line.len() < RECORD_LENGTH {
            return Err(CodecError::RecordTooShort { expected: RECORD_LENGTH, actual: line.len() });
        }
        let record_type = line.chars().next().unwrap();
        if record_type != '9' {
            return Err(CodecError::WrongRecordType { expected: '9', found: record_type });
        }
        Ok(Self {
            batch_count: parse_numeric("batch_count", slice(line, "batch_count", 1, 7)?)? as u32,
            block_count: parse_numeric("block_count", slice(line, "block_count", 7, 13)?)? as u32,
            entry_addenda_count: parse_numeric("entry_addenda_count", slice(line, "entry_addenda_count", 13, 21)?)? as u32,
            entry_hash: parse_numeric("entry_hash", slice(line, "entry_hash", 21, 31)?)?,
            total_debit_cents: parse_i64("total_debit", slice(line, "total_debit", 31, 43)?)?,
            total_credit_cents: parse_i64("total_credit", slice(line, "total_credit", 43, 55)?)?,
        })
    }

    pub fn write(&self) -> String {
        format!(
            "9{batches}{blocks}{count}{hash}{debit}{credit}{filler}",
            batches = numeric(self.batch_count as u64, 6),
            blocks = numeric(self.block_count as u64, 6),
            count = numeric(self.entry_addenda_count as u64, 8),
            hash = numeric(self.entry_hash, 10),
            debit = numeric(self.total_debit_cents.unsigned_abs(), 12),
            credit = numeric(self.total_credit_cents.unsigned_abs(), 12),
            filler = crate::fields::alpha("", 39),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_control_roundtrips() {
        let c = BatchControl {
            service_class_code: 220,
            entry_addenda_count: 2,
            entry_hash: 91400606,
            total_debit_cents: 0,
            total_credit_cents: 15000,
            company_identification: "1091400606".to_string(),
            originating_dfi: "09140060".to_string(),
            batch_number: 1,
        };
        let line = c.write();
        assert_eq!(line.len(), RECORD_LENGTH);
        assert_eq!(BatchControl::parse(&line).unwrap(), c);
    }

    #[test]
    fn file_control_roundtrips() {
        let c = FileControl {
            batch_count: 1,
            block_count: 1,
            entry_addenda_count: 2,
            entry_hash: 91400606,
            total_debit_cents: 0,
            total_credit_cents: 15000,
        };
        let line = c.write();
        assert_eq!(line.len(), RECORD_LENGTH);
        assert_eq!(FileControl::parse(&line).unwrap(), c);
    }
}
