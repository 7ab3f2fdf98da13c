use thiserror::Error;

use store::StoreError;

use crate::auth::errors::AuthError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 3001,
            ServiceError::Auth(e) => e.code(),
            ServiceError::Store(_) => 3200,
            ServiceError::Task(_) => 3300,
        }
    }
}
