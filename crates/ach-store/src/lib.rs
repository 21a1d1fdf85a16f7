//! Embedded persistence for the file-pipeline gateway: an embedded `sled`
//! keyspace with `postcard`-encoded rows, behind repository types the
//! pipeline consumes without ever seeing the storage engine directly.

pub mod codec;
pub mod config;
pub mod cursor;
pub mod depositories;
pub mod error;
pub mod micro_deposits;
pub mod source_files;
pub mod transfers;

pub use config::ConfigRepository;
pub use cursor::PagedCursor;
pub use depositories::DepositoryRepo;
pub use error::{Result, StoreError};
pub use micro_deposits::{ConfirmationError, MicroDepositRepo};
pub use source_files::SourceFileRepo;
pub use transfers::TransferRepo;

/// Opens every repository against one `sled` database. One `Store` per
/// process, guarded by the controller's single-writer discipline.
#[derive(Clone)]
pub struct Store {
    pub transfers: TransferRepo,
    pub micro_deposits: MicroDepositRepo,
    pub depositories: DepositoryRepo,
    pub source_files: SourceFileRepo,
    db: sled::Db,
}

impl Store {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        Ok(Self {
            transfers: TransferRepo::open(&db)?,
            micro_deposits: MicroDepositRepo::open(&db)?,
            depositories: DepositoryRepo::open(&db)?,
            source_files: SourceFileRepo::open(&db)?,
            db,
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}
