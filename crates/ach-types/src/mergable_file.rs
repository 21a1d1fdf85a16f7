//! The filesystem-facing shape of a mergable ACH file under `merged/`.

use crate::routing::RoutingNumber;
use chrono::NaiveDate;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergableFile {
    pub destination: RoutingNumber,
    pub date: NaiveDate,
    pub sequence: FileSequence,
    pub uploaded: bool,
}

/// Sequence rolls `1` through `9`, then `A`-`Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileSequence(u8);

impl FileSequence {
    pub const FIRST: FileSequence = FileSequence(0);

    pub fn next(self) -> Option<FileSequence> {
        if self.0 >= 35 { None } else { Some(FileSequence(self.0 + 1)) }
    }

    pub fn as_char(self) -> char {
        if self.0 < 9 {
            (b'1' + self.0) as char
        } else {
            (b'A' + (self.0 - 9)) as char
        }
    }

    /// Inverse of [`Self::as_char`], for reconstructing a sequence from a
    /// filename found on disk.
    pub fn from_char(c: char) -> Option<FileSequence> {
        match c {
            '1'..='9' => Some(FileSequence(c as u8 - b'1')),
            'A'..='Z' => Some(FileSequence(9 + (c as u8 - b'A'))),
            _ => None,
        }
    }
}

impl MergableFile {
    pub fn filename(&self, dir: &std::path::Path) -> PathBuf {
        let mut name = format!(
            "{}-{}-{}.ach",
            self.date.format("%Y%m%d"),
            self.destination,
            self.sequence.as_char()
        );
        if self.uploaded {
            name.push_str(".uploaded");
        }
        dir.join(name)
    }
}
