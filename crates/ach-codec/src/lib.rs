//! A NACHA-ACH fixed-width file codec: `Parse`, `Write`, `Validate`, and
//! `MergeFiles` primitives over [`file::AchFile`]. Mechanism-only: this
//! crate knows the wire format, not pipeline policy (cutoffs, line caps,
//! rollover) — that lives in `ach-pipeline`.

pub mod addenda;
pub mod batch;
pub mod batch_header;
pub mod control;
pub mod entry_detail;
pub mod error;
pub mod fields;
pub mod file;
pub mod file_header;
pub mod merge;
pub mod validate;
pub mod verify;

pub use addenda::{Addenda05, Addenda98, Addenda99};
pub use batch::{batches_equal, Addenda, Batch, Entry};
pub use batch_header::{BatchHeader, ServiceClassCode};
pub use control::{BatchControl, FileControl};
pub use entry_detail::{EntryDetail, TransactionCode};
pub use error::{CodecError, Result};
pub use file::AchFile;
pub use file_header::FileHeader;
pub use merge::merge_files;
pub use validate::validate;
pub use verify::{hash_account_number, hash_account_number_hex};
