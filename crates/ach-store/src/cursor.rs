//! Paged, non-transactional iteration over entities eligible for merging.
//! A cursor holds a batch size and a resume position; it relies on the
//! caller applying the status transition that removes an entity from the
//! eligible set to avoid re-processing — there is no claim/lease
//! mechanism, a documented hazard for a multi-process deployment (see
//! DESIGN.md).

use crate::codec::decode;
use crate::error::Result;
use serde::de::DeserializeOwned;

pub struct PagedCursor {
    tree: sled::Tree,
    batch_size: usize,
    resume_after: Option<Vec<u8>>,
    exhausted: bool,
}

impl PagedCursor {
    pub fn new(tree: sled::Tree, batch_size: usize) -> Self {
        Self { tree, batch_size, resume_after: None, exhausted: false }
    }

    /// Yields the next page in ascending key order (creation-time ascending,
    /// since callers key their index trees with [`crate::codec::time_ordered_key`]).
    /// An empty page means the cursor is exhausted for this pass; calling
    /// again starts a fresh pass from the beginning, so a long-lived
    /// scheduler loop naturally re-scans newly eligible rows on the next tick.
    pub fn next_page<T: DeserializeOwned>(&mut self) -> Result<Vec<T>> {
        let range = match &self.resume_after {
            Some(key) => self.tree.range((std::ops::Bound::Excluded(key.clone()), std::ops::Bound::Unbounded)),
            None => self.tree.range(..),
        };

        let mut out = Vec::with_capacity(self.batch_size);
        let mut last_key = None;
        for item in range.take(self.batch_size) {
            let (key, value) = item?;
            last_key = Some(key.to_vec());
            out.push(decode(&value)?);
        }

        match last_key {
            Some(key) => {
                self.resume_after = Some(key);
                self.exhausted = false;
            }
            None => {
                self.resume_after = None;
                self.exhausted = true;
            }
        }
        Ok(out)
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn reset(&mut self) {
        self.resume_after = None;
        self.exhausted = false;
    }
}
