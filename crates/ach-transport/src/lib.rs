//! Uniform transport over FTP and SFTP for delivering outgoing ACH files to
//! an ODFI and retrieving inbound/return files from it (spec.md §4.5).
//!
//! Mechanism-only: this crate knows how to move bytes to and from a
//! configured remote directory. Cutoff timing, merge/upload bookkeeping,
//! and return classification live in `ach-pipeline`.

mod agent;
mod allowed_ips;
mod error;
mod factory;
mod ftp;
mod sftp;

pub use agent::{Agent, RemoteFile};
pub use allowed_ips::check_hostname_allowed;
pub use error::{Result, TransportError};
pub use factory::make_agent;
