use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoderError {
    #[error("Failed to decode base64 content: {0}")]
    Base64(String),
}
