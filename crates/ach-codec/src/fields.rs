//! Fixed-width field readers/writers shared by every record type. NACHA
//! records are exactly 94 characters; numeric fields are zero-padded and
//! right-justified, alphanumeric fields are space-padded and left-justified.

use crate::error::{CodecError, Result};

pub const RECORD_LENGTH: usize = 94;

pub fn slice(line: &str, field: &'static str, start: usize, end: usize) -> Result<&str> {
    line.get(start..end).ok_or(CodecError::InvalidField {
        field,
        value: line.to_string(),
    })
}

pub fn alpha(value: &str, width: usize) -> String {
    let mut s: String = value.chars().take(width).collect();
    while s.len() < width {
        s.push(' ');
    }
    s
}

pub fn numeric(value: u64, width: usize) -> String {
    format!("{value:0width$}", width = width)
}

pub fn parse_numeric(field: &'static str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| CodecError::InvalidField {
            field,
            value: raw.to_string(),
        })
}

pub fn parse_i64(field: &'static str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| CodecError::InvalidField {
            field,
            value: raw.to_string(),
        })
}
