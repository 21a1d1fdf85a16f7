use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to replace directory at {path}")]
    ReplaceDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to acquire exclusive lock on {path}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cross-device hardlink not supported for {0}")]
    CrossDeviceHardlink(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
