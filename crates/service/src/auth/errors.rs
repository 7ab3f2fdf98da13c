use thiserror::Error;

use store::StoreError;

/// Business errors for credential and token workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("unable to authenticate")]
    Unauthorized,
    #[error("credentials file error: {0}")]
    CredentialsFile(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("token generation failed: {0}")]
    Randomness(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::InvalidBody(_) => 1001,
            AuthError::Unauthorized => 1004,
            AuthError::CredentialsFile(_) => 1101,
            AuthError::Serialization(_) => 1102,
            AuthError::Randomness(_) => 1103,
            AuthError::Store(_) => 1200,
            AuthError::Task(_) => 1300,
        }
    }
}
