// twin-core/src/infrastructure/config/project.rs

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::domain::project::configuration::TwinConfig;
use crate::infrastructure::error::InfrastructureError;

pub const ENV_TOKEN: &str = "KBC_STORAGE_API_TOKEN";
pub const ENV_HOST: &str = "KBC_STORAGE_API_HOST";
pub const ENV_OUTPUT_DIR: &str = "TWIN_OUTPUT_DIR";
pub const ENV_LOCAL_FILE: &str = ".env.local";

// --- LOADER ---

#[instrument(skip(project_dir))]
pub fn load_twin_config(project_dir: &Path) -> Result<TwinConfig, InfrastructureError> {
    if !project_dir.is_dir() {
        return Err(InfrastructureError::ConfigNotFound(
            project_dir.display().to_string(),
        ));
    }

    // 1. Fichier YAML optionnel, sinon valeurs par défaut
    let mut config: TwinConfig = match find_main_config(project_dir) {
        Some(path) => {
            info!(path = ?path, "Loading twin configuration");
            let content = fs::read_to_string(&path)?;
            serde_yaml::from_str(&content)?
        }
        None => {
            debug!("No twin.yaml found, using defaults");
            TwinConfig::default()
        }
    };

    // 2. Layering: .env.local < process environment
    let env_local = read_env_local(&project_dir.join(ENV_LOCAL_FILE))?;
    apply_env_overrides(&mut config, |key| {
        std::env::var(key)
            .ok()
            .or_else(|| env_local.get(key).cloned())
    });

    config.validate()?;
    Ok(config)
}

fn find_main_config(root: &Path) -> Option<PathBuf> {
    ["twin.yaml", "twin.yml"]
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.exists())
}

/// Reads `KEY=VALUE` pairs without touching the process environment.
fn read_env_local(path: &Path) -> Result<HashMap<String, String>, InfrastructureError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let iter = dotenvy::from_path_iter(path)
        .map_err(|e| InfrastructureError::ConfigError(format!("{}: {}", path.display(), e)))?;

    let mut values = HashMap::new();
    for item in iter {
        let (key, value) = item
            .map_err(|e| InfrastructureError::ConfigError(format!("{}: {}", path.display(), e)))?;
        values.insert(key, value);
    }
    debug!(count = values.len(), "Loaded .env.local");
    Ok(values)
}

fn apply_env_overrides<F>(config: &mut TwinConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.trim().is_empty()) {
        config.api.token = Some(token.trim().to_string());
    }
    if let Some(host) = lookup(ENV_HOST).filter(|h| !h.trim().is_empty()) {
        let host = normalize_host(&host);
        info!(old = ?config.api.base_url, new = ?host, "Overriding API host via ENV");
        config.api.base_url = host;
    }
    if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|d| !d.trim().is_empty()) {
        info!(old = ?config.output_dir, new = ?dir, "Overriding output dir via ENV");
        config.output_dir = dir;
    }
}

/// `connection.keboola.com/` -> `https://connection.keboola.com`
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}
