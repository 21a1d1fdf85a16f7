//! Domain entities for the ACH file-pipeline gateway: depositories, parties,
//! transfers, micro-deposits, and the filesystem/config shapes the pipeline
//! reasons about (`MergableFile`, `CutoffTime`).
//!
//! Status fields are closed sum types with an exhaustive transition table
//! (see [`transfer::TransferStatus`] and [`depository::DepositoryStatus`])
//! rather than stringly-typed columns, so illegal transitions are compile
//! errors or `Err(IllegalTransition)` instead of a `set_status(&str)` escape
//! hatch.

pub mod config;
pub mod depository;
pub mod ids;
pub mod mergable_file;
pub mod money;
pub mod return_code;
pub mod routing;
pub mod sec_code;
pub mod transfer;

pub use config::{CutoffTime, FileTransferConfig, OdfiAccount, Protocol};
pub use depository::{AccountType, Depository, DepositoryStatus, HolderType};
pub use ids::{DepositoryId, MicroDepositId, OriginatorId, ReceiverId, TransferId, UserId};
pub use mergable_file::MergableFile;
pub use money::Money;
pub use return_code::{ChangeCode, ReturnCode};
pub use routing::{RoutingNumber, RoutingNumberError};
pub use sec_code::SecEntryClass;
pub use transfer::{MicroDepositCredit, Transfer, TransferStatus, TransferType};
