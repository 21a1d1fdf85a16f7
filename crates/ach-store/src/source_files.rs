//! Repository for the pre-built, single-batch ACH files that back each
//! transfer and micro-deposit at creation time. Stands in for an external
//! codec service's file store; the merger never constructs a `Batch`
//! itself, it only ever merges a file this repository hands it.

use crate::error::{Result, StoreError};
use sled::Tree;

#[derive(Clone)]
pub struct SourceFileRepo {
    by_id: Tree,
}

impl SourceFileRepo {
    pub fn open(db: &sled::Db) -> Result<Self> {
        Ok(Self { by_id: db.open_tree("source_files")? })
    }

    /// Stores the NACHA wire text (as `ach_codec::AchFile::write` produces
    /// it) a transfer or micro-deposit was created against.
    pub fn put(&self, id: &str, contents: &str) -> Result<()> {
        self.by_id.insert(id.as_bytes(), contents.as_bytes())?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<String> {
        let bytes = self
            .by_id
            .get(id.as_bytes())?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        String::from_utf8(bytes.to_vec()).map_err(|_| StoreError::NotFound(id.to_string()))
    }
}
