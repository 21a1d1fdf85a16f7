//! The uniform transport contract spec.md §4.5 names, over FTP and SFTP.
//!
//! Files are returned as owned bytes rather than a `reader` the caller must
//! close — ACH files are at most a few megabytes (the line cap bounds
//! them), so buffering the whole file avoids a lifetime-entangled streaming
//! API for no real benefit here.

use crate::error::Result;
use async_trait::async_trait;

pub struct RemoteFile {
    pub filename: String,
    pub contents: Vec<u8>,
}

#[async_trait]
pub trait Agent: Send + Sync {
    /// All files in the agent's configured inbound directory.
    async fn get_inbound_files(&self) -> Result<Vec<RemoteFile>>;

    /// All files in the agent's configured return directory.
    async fn get_return_files(&self) -> Result<Vec<RemoteFile>>;

    /// Writes to the outbound directory. Must be safe to retry: callers may
    /// call this again after a failure without first confirming whether
    /// the previous attempt landed.
    async fn upload_file(&self, filename: &str, contents: &[u8]) -> Result<()>;

    /// Removes a file by its full remote path. Absent file is not an error.
    async fn delete(&self, path: &str) -> Result<()>;

    /// DNS hostname used for allowed-IP checks (spec.md §4.3 step 4).
    fn hostname(&self) -> &str;
}
