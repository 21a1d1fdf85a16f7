//! `postcard` (de)serialization helpers shared by every repository. Values
//! are stored as raw `postcard` bytes under `sled`'s own sorted byte-string
//! keyspace, keeping the storage engine itself schema-agnostic.

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(postcard::to_stdvec(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(postcard::from_bytes(bytes)?)
}

/// A sortable key: big-endian millis timestamp followed by the entity's
/// 16-byte UUID, so `sled`'s native byte-order iteration yields
/// creation-time ascending order directly, with no secondary sort step.
pub fn time_ordered_key(created_at: chrono::DateTime<chrono::Utc>, id: uuid::Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(&created_at.timestamp_millis().to_be_bytes());
    key.extend_from_slice(id.as_bytes());
    key
}
