// twin-core/src/application/clean.rs

use crate::error::TwinError;
use crate::infrastructure::config::project::load_twin_config;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Output directory inside the project. Absolute paths, `..` and the project
/// root itself are refused.
pub fn output_path(project_dir: &Path, output_dir: &str) -> Result<PathBuf, TwinError> {
    let target_rel = Path::new(output_dir);

    // Zero-Trust Path Traversal Guard
    let escapes = target_rel.is_absolute()
        || target_rel
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    let full_path = project_dir.join(target_rel);
    if escapes || !full_path.starts_with(project_dir) || full_path == project_dir {
        return Err(TwinError::UnsafePath(output_dir.to_string()));
    }
    Ok(full_path)
}

/// Removes the configured output directory. Returns the removed path, if any.
pub fn clean_output(project_dir: &Path) -> Result<Option<PathBuf>, TwinError> {
    tracing::info!("🧹 Cleaning twin output...");

    let config = load_twin_config(project_dir)?;
    let full_path = output_path(project_dir, &config.output_dir)?;

    if !full_path.exists() {
        return Ok(None);
    }

    if full_path.is_dir() {
        fs::remove_dir_all(&full_path)?;
    } else {
        fs::remove_file(&full_path)?;
    }
    println!("   🗑️  Artifact removed: {}", config.output_dir);
    Ok(Some(full_path))
}
