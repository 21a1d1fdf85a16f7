use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("filesystem error: {0}")]
    Fs(#[from] ach_fs::Error),

    #[error("codec error: {0}")]
    Codec(#[from] ach_codec::CodecError),

    #[error("store error: {0}")]
    Store(#[from] ach_store::StoreError),

    #[error("transport error: {0}")]
    Transport(#[from] ach_transport::TransportError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("child worker panicked: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("no mergable file found containing trace number {0}")]
    EntryNotFound(String),

    #[error("pipeline controller is not running")]
    ControllerStopped,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
