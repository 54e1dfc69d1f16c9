//! Error types for document stores

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
