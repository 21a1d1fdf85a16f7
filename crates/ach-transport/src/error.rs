use thiserror::Error;

/// Spec §7's transport taxonomy: transient (retry next tick) vs. permanent
/// (a human must intervene). The pipeline decides retry policy; this crate
/// only distinguishes the two so the uploader can log at the right
/// severity.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("ftp error: {0}")]
    Ftp(#[from] suppaftp::FtpError),

    #[error("sftp session error: {0}")]
    Ssh(#[from] ssh2::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blocking task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("resolved hostname {hostname} has no address matching the allowed-IP list")]
    HostnameNotAllowed { hostname: String },

    #[error("dns resolution for {hostname} failed: {source}")]
    DnsResolution { hostname: String, source: std::io::Error },

    #[error("invalid CIDR block {0:?}")]
    InvalidCidr(String),
}

impl TransportError {
    /// Permanent failures require operator intervention; everything else is
    /// retried on the next tick per spec §7.
    pub fn is_permanent(&self) -> bool {
        matches!(self, TransportError::HostnameNotAllowed { .. } | TransportError::InvalidCidr(_))
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
