// src/domain/project/configuration.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_API_HOST: &str = "https://connection.keboola.com";

#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct TwinConfig {
    /// Branch directory of the export to scan (`{project}/{branch}/transformation`).
    #[serde(default = "default_branch")]
    #[validate(length(min = 1, message = "source_branch cannot be empty"))]
    pub source_branch: String,

    #[serde(default = "default_output_dir")]
    #[validate(length(min = 1, message = "output_dir cannot be empty"))]
    pub output_dir: String,

    #[serde(default)]
    #[validate(nested)]
    pub api: ApiConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

impl Default for TwinConfig {
    fn default() -> Self {
        Self {
            source_branch: default_branch(),
            output_dir: default_output_dir(),
            api: ApiConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    #[validate(url(message = "api.base_url must be a valid URL"))]
    pub base_url: String,

    /// Read from the environment only.
    #[serde(skip)]
    pub token: Option<String>,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 1000))]
    pub jobs_limit: usize,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 1000))]
    pub sample_rows: usize,

    #[serde(default = "default_max_samples")]
    #[validate(range(max = 100))]
    pub max_samples: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            jobs_limit: default_limit(),
            sample_rows: default_limit(),
            max_samples: default_max_samples(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    #[serde(default)]
    pub is_public_repo: bool,
    #[serde(default = "default_true")]
    pub export_data_samples: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            is_public_repo: false,
            export_data_samples: true,
        }
    }
}

impl SecurityConfig {
    /// Data never leaves the platform for a public repository.
    pub fn samples_allowed(&self) -> bool {
        !self.is_public_repo && self.export_data_samples
    }
}

fn default_branch() -> String {
    "main".to_string()
}
fn default_output_dir() -> String {
    "twin_format".to_string()
}
fn default_base_url() -> String {
    DEFAULT_API_HOST.to_string()
}
fn default_limit() -> usize {
    100
}
fn default_max_samples() -> usize {
    5
}
fn default_true() -> bool {
    true
}
