//! NACHA return codes (Addenda99) and notification-of-change codes
//! (Addenda98), plus the disposition each code carries for the return and
//! correction processor.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnCode {
    R01, R02, R03, R04, R07, R10, R14, R16, R25, R26, R27,
    /// Any other transient return code not singled out for special handling.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnDisposition {
    /// Receiver depository should be marked rejected.
    RejectDepository,
    /// Originating transfer should be marked failed.
    FailTransfer,
    /// Format error: fail the transfer and flag for operator attention.
    FormatErrorFailTransfer,
}

impl ReturnCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "R01" => ReturnCode::R01,
            "R02" => ReturnCode::R02,
            "R03" => ReturnCode::R03,
            "R04" => ReturnCode::R04,
            "R07" => ReturnCode::R07,
            "R10" => ReturnCode::R10,
            "R14" => ReturnCode::R14,
            "R16" => ReturnCode::R16,
            "R25" => ReturnCode::R25,
            "R26" => ReturnCode::R26,
            "R27" => ReturnCode::R27,
            _ => ReturnCode::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnCode::R01 => "R01",
            ReturnCode::R02 => "R02",
            ReturnCode::R03 => "R03",
            ReturnCode::R04 => "R04",
            ReturnCode::R07 => "R07",
            ReturnCode::R10 => "R10",
            ReturnCode::R14 => "R14",
            ReturnCode::R16 => "R16",
            ReturnCode::R25 => "R25",
            ReturnCode::R26 => "R26",
            ReturnCode::R27 => "R27",
            ReturnCode::Other => "R99",
        }
    }

    /// The pipeline action this return code triggers.
    pub fn disposition(&self) -> ReturnDisposition {
        match self {
            ReturnCode::R02
            | ReturnCode::R03
            | ReturnCode::R04
            | ReturnCode::R07
            | ReturnCode::R10
            | ReturnCode::R14
            | ReturnCode::R16 => ReturnDisposition::RejectDepository,
            ReturnCode::R25 | ReturnCode::R26 | ReturnCode::R27 => {
                ReturnDisposition::FormatErrorFailTransfer
            }
            ReturnCode::R01 | ReturnCode::Other => ReturnDisposition::FailTransfer,
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeCode {
    C01, C02, C03, C04, C05, C06, C07, C08, C09, C13, C14,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDisposition {
    UpdateAccountNumber,
    UpdateRoutingNumber,
    RejectDepository,
    /// Update individual name. No depository field currently models this;
    /// the processor logs it for operator follow-up.
    UpdateIndividualName,
    /// Update originator identification. No depository field currently
    /// models this; the processor logs it for operator follow-up.
    UpdateOriginatorIdentification,
    /// Format error: no state mutation.
    FormatError,
}

impl ChangeCode {
    pub fn parse(code: &str) -> Self {
        match code {
            "C01" => ChangeCode::C01,
            "C02" => ChangeCode::C02,
            "C03" => ChangeCode::C03,
            "C04" => ChangeCode::C04,
            "C05" => ChangeCode::C05,
            "C06" => ChangeCode::C06,
            "C07" => ChangeCode::C07,
            "C08" => ChangeCode::C08,
            "C09" => ChangeCode::C09,
            "C13" => ChangeCode::C13,
            "C14" => ChangeCode::C14,
            _ => ChangeCode::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeCode::C01 => "C01",
            ChangeCode::C02 => "C02",
            ChangeCode::C03 => "C03",
            ChangeCode::C04 => "C04",
            ChangeCode::C05 => "C05",
            ChangeCode::C06 => "C06",
            ChangeCode::C07 => "C07",
            ChangeCode::C08 => "C08",
            ChangeCode::C09 => "C09",
            ChangeCode::C13 => "C13",
            ChangeCode::C14 => "C14",
            ChangeCode::Other => "C99",
        }
    }

    /// A change code can carry more than one disposition (e.g. C03, C06, C07
    /// each combine account/routing/reject effects); callers fold over
    /// [`dispositions`] rather than switching on a single one.
    pub fn dispositions(&self) -> &'static [ChangeDisposition] {
        match self {
            ChangeCode::C01 => &[ChangeDisposition::UpdateAccountNumber],
            ChangeCode::C02 => &[ChangeDisposition::UpdateRoutingNumber],
            ChangeCode::C03 => &[
                ChangeDisposition::UpdateAccountNumber,
                ChangeDisposition::UpdateRoutingNumber,
            ],
            ChangeCode::C04 => &[ChangeDisposition::UpdateIndividualName],
            ChangeCode::C05 => &[ChangeDisposition::RejectDepository],
            ChangeCode::C06 => &[
                ChangeDisposition::UpdateAccountNumber,
                ChangeDisposition::RejectDepository,
            ],
            ChangeCode::C07 => &[
                ChangeDisposition::UpdateAccountNumber,
                ChangeDisposition::UpdateRoutingNumber,
                ChangeDisposition::RejectDepository,
            ],
            ChangeCode::C08 => &[ChangeDisposition::RejectDepository],
            ChangeCode::C09 => &[ChangeDisposition::UpdateOriginatorIdentification],
            ChangeCode::C13 | ChangeCode::C14 => &[ChangeDisposition::FormatError],
            ChangeCode::Other => &[ChangeDisposition::FormatError],
        }
    }
}
