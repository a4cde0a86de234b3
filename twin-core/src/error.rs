// twin-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TwinError {
    // --- ERREURS DU DOMAINE (scan, API, token) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- ERREURS D'INFRASTRUCTURE (IO, Parsing, HTTP) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    #[error("Unsafe path traversal detected: {0}")]
    UnsafePath(String),
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for TwinError {
    fn from(err: std::io::Error) -> Self {
        TwinError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<serde_json::Error> for TwinError {
    fn from(err: serde_json::Error) -> Self {
        TwinError::Infrastructure(InfrastructureError::Json(err))
    }
}
