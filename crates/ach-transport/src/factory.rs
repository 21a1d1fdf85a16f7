//! Resolves a [`FileTransferConfig`] into the [`Agent`] implementation for
//! its configured protocol (spec.md §4.3 step 4: "Resolve an Agent via the
//! config's protocol").

use crate::agent::Agent;
use crate::ftp::FtpAgent;
use crate::sftp::SftpAgent;
use ach_types::{FileTransferConfig, Protocol};
use std::sync::Arc;

pub fn make_agent(config: &FileTransferConfig) -> Arc<dyn Agent> {
    match config.protocol {
        Protocol::Ftp => Arc::new(FtpAgent::new(config.clone())),
        Protocol::Sftp => Arc::new(SftpAgent::new(config.clone())),
    }
}
