use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Remote request failed: {0}")]
    RemoteFailure(&'static str),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GitHubStorageError {
    #[error("Resource not found")]
    NotFound,

    #[error("GitHub API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("GitHub request failed")]
    Transport,

    #[error("Missing data in response: {0}")]
    MissingData(String),

    #[error("Authentication error")]
    AuthError,
}

impl GitHubStorageError {
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        match status {
            StatusCode::NOT_FOUND => GitHubStorageError::NotFound,
            status => GitHubStorageError::Api {
                status,
                message: message.into(),
            },
        }
    }

    /// HTTP status reported by the remote, if the failure carried one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GitHubStorageError::NotFound => Some(StatusCode::NOT_FOUND),
            GitHubStorageError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GitHubStorageError::NotFound)
    }
}

impl From<&octocrab::Error> for GitHubStorageError {
    fn from(err: &octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => {
                GitHubStorageError::from_status(source.status_code, source.message.clone())
            }
            _ => GitHubStorageError::Transport,
        }
    }
}
