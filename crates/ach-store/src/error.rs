use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage engine error: {0}")]
    Engine(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Encode(#[from] postcard::Error),

    #[error("no record found for id {0}")]
    NotFound(String),

    #[error("illegal transfer transition: {0}")]
    IllegalTransfer(#[from] ach_types::transfer::IllegalTransition),

    #[error("illegal depository transition: {0}")]
    IllegalDepository(#[from] ach_types::depository::IllegalTransition),
}

pub type Result<T> = std::result::Result<T, StoreError>;
