mod coder;
mod storage;

use error_stack::Report;
use thiserror::Error;

pub use coder::CoderError;
pub use storage::{GitHubStorageError, StorageError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage operation failed")]
    Storage,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, Report<AppError>>;
pub type CoderResult<T> = Result<T, Report<CoderError>>;
pub type StorageResult<T> = Result<T, Report<StorageError>>;
pub type GitHubStorageResult<T> = Result<T, Report<GitHubStorageError>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_failure_message() {
        assert_eq!(AppError::Storage.to_string(), "Storage operation failed");
    }
}
