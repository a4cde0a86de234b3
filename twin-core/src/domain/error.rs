// twin-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Scan failed: {0}")]
    #[diagnostic(
        code(twin::domain::scan),
        help("Check that the export contains a readable transformation directory.")
    )]
    ScanError(String),

    #[error("Storage API error: {0}")]
    #[diagnostic(
        code(twin::domain::api),
        help("Check KBC_STORAGE_API_TOKEN and KBC_STORAGE_API_HOST, or run with --offline.")
    )]
    ApiError(String),

    #[error("Missing Storage API token")]
    #[diagnostic(
        code(twin::domain::token),
        help("Set KBC_STORAGE_API_TOKEN (or add it to .env.local), or run with --offline.")
    )]
    MissingToken,
}
