use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("record too short: expected {expected} chars, got {actual}")]
    RecordTooShort { expected: usize, actual: usize },

    #[error("unexpected record type code {found:?}, expected {expected:?}")]
    WrongRecordType { expected: char, found: char },

    #[error("field {field} is not valid ASCII/numeric: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("file is empty")]
    EmptyFile,

    #[error(transparent)]
    Routing(#[from] ach_types::RoutingNumberError),

    #[error("batch control entry/addenda count {recorded} does not match computed {computed}")]
    BatchControlMismatch { recorded: u32, computed: u32 },

    #[error("file control batch count {recorded} does not match computed {computed}")]
    FileControlMismatch { recorded: u32, computed: u32 },

    #[error("attempted to merge files for different destinations: {a} and {b}")]
    DestinationMismatch { a: String, b: String },
}

pub type Result<T> = std::result::Result<T, CodecError>;
