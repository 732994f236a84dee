use thiserror::Error;

pub type FolioResult<T, E = FolioError> = Result<T, E>;

#[derive(Debug, Error)]
pub enum FolioError {
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Buffer error: {0}")]
    Buffer(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
