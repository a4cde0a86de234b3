// twin-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(twin::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- JSON ---
    #[error("JSON Error: {0}")]
    #[diagnostic(
        code(twin::infra::json),
        help("The exported configuration or the API response is not valid JSON.")
    )]
    Json(#[from] serde_json::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(twin::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(code(twin::infra::config_missing))]
    ConfigNotFound(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(twin::infra::config_invalid),
        help("Check the limits in twin.yaml (api.jobs_limit, api.sample_rows, api.max_samples).")
    )]
    Validation(#[from] validator::ValidationErrors),

    // --- HTTP ---
    #[error("HTTP Error: {0}")]
    #[diagnostic(
        code(twin::infra::http),
        help("Check network access and the Storage API host.")
    )]
    Http(#[from] reqwest::Error),

    // --- TEMPLATING ---
    #[error("Template Rendering Error: {0}")]
    #[diagnostic(code(twin::infra::template))]
    TemplateError(#[from] minijinja::Error),
}
