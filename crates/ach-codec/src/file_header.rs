use crate::error::{CodecError, Result};
use crate::fields::{alpha, parse_numeric, slice, RECORD_LENGTH};
use ach_types::RoutingNumber;
use chrono::NaiveDate;

/// Record type 1: one per file, identifies sender/receiver and file layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub immediate_destination: RoutingNumber,
    pub immediate_origin: RoutingNumber,
    pub file_creation_date: NaiveDate,
    pub file_creation_time: (u8, u8),
    pub file_id_modifier: char,
    pub immediate_destination_name: String,
    pub immediate_origin_name: String,
    pub reference_code: String,
}

impl FileHeader {
    pub fn parse(line: &str) -> Result<Self> {
        if line.len() < RECORD_LENGTH {
            return Err(CodecError::RecordTooShort {
                expected: RECORD_LENGTH,
                actual: line.len(),
            });
        }
        let record_type = line.chars().next().unwrap();
        if record_type != '1' {
            return Err(CodecError::WrongRecordType {
                expected: '1',
                found: record_type,
            });
        }

        let destination = slice(line, "immediate_destination", 3, 13)?.trim_start();
        let origin = slice(line, "immediate_origin", 13, 23)?.trim_start();
        let date_raw = slice(line, "file_creation_date", 23, 29)?;
        let time_raw = slice(line, "file_creation_time", 29, 33)?;
        let modifier = slice(line, "file_id_modifier", 33, 34)?;
        let dest_name = slice(line, "immediate_destination_name", 40, 63)?;
        let origin_name = slice(line, "immediate_origin_name", 63, 86)?;
        let reference_code = slice(line, "reference_code", 86, 94)?;

        Ok(Self {
            immediate_destination: RoutingNumber::parse(destination)?,
            immediate_origin: RoutingNumber::parse(origin)?,
            file_creation_date: parse_yymmdd("file_creation_date", date_raw)?,
            file_creation_time: parse_hhmm("file_creation_time", time_raw)?,
            file_id_modifier: modifier.chars().next().unwrap_or('A'),
            immediate_destination_name: dest_name.trim_end().to_string(),
            immediate_origin_name: origin_name.trim_end().to_string(),
            reference_code: reference_code.trim_end().to_string(),
        })
    }

    pub fn write(&self) -> String {
        let (hh, mm) = self.file_creation_time;
        format!(
            "1{priority}{dest:>10}{origin:>10}{date}{time}{modifier}{size}{blocking}{format}{dest_name}{origin_name}{reference}",
            priority = "01",
            dest = format!(" {}", self.immediate_destination),
            origin = format!(" {}", self.immediate_origin),
            date = self.file_creation_date.format("%y%m%d"),
            time = format!("{hh:02}{mm:02}"),
            modifier = self.file_id_modifier,
            size = "094",
            blocking = "10",
            format = "1",
            dest_name = alpha(&self.immediate_destination_name, 23),
            origin_name = alpha(&self.immediate_origin_name, 23),
            reference = alpha(&self.reference_code, 8),
        )
    }
}

pub(crate) fn parse_yymmdd(field: &'static str, raw: &str) -> Result<NaiveDate> {
    if raw.len() != 6 {
        return Err(CodecError::InvalidField {
            field,
            value: raw.to_string(),
        });
    }
    let yy: i32 = parse_numeric(field, &raw[0..2])? as i32;
    let mm: u32 = parse_numeric(field, &raw[2..4])? as u32;
    let dd: u32 = parse_numeric(field, &raw[4..6])? as u32;
    // NACHA dates are two-digit years; 00-68 => 2000-2068, 69-99 => 1969-1999.
    let year = if yy <= 68 { 2000 + yy } else { 1900 + yy };
    NaiveDate::from_ymd_opt(year, mm, dd).ok_or(CodecError::InvalidField {
        field,
        value: raw.to_string(),
    })
}

pub(crate) fn parse_hhmm(field: &'static str, raw: &str) -> Result<(u8, u8)> {
    if raw.len() != 4 {
        return Err(CodecError::InvalidField {
            field,
            value: raw.to_string(),
        });
    }
    let hh = parse_numeric(field, &raw[0..2])? as u8;
    let mm = parse_numeric(field, &raw[2..4])? as u8;
    if hh > 23 || mm > 59 {
        return Err(CodecError::InvalidField {
            field,
            value: raw.to_string(),
        });
    }
    Ok((hh, mm))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileHeader {
        FileHeader {
            immediate_destination: RoutingNumber::parse("091400606").unwrap(),
            immediate_origin: RoutingNumber::parse("091400606").unwrap(),
            file_creation_date: NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
            file_creation_time: (14, 30),
            file_id_modifier: 'A',
            immediate_destination_name: "FIRST BANK".to_string(),
            immediate_origin_name: "ACH GATEWAY".to_string(),
            reference_code: String::new(),
        }
    }

    #[test]
    fn roundtrips_through_write_and_parse() {
        let header = sample();
        let line = header.write();
        assert_eq!(line.len(), RECORD_LENGTH);
        let parsed = FileHeader::parse(&line).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn rejects_wrong_record_type() {
        let mut line = sample().write();
        line.replace_range(0..1, "5");
        assert!(matches!(
            FileHeader::parse(&line),
            Err(CodecError::WrongRecordType { .. })
        ));
    }
}
