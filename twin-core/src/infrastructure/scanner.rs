// twin-core/src/infrastructure/scanner.rs

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::domain::error::DomainError;
use crate::domain::lineage::{Code, CodeBlock, TransformationMeta, TransformationRecord};
use crate::domain::ports::{ScanFailure, ScanOutput, TransformationSource};
use crate::infrastructure::error::InfrastructureError;

const CODE_FILES: [(&str, &str); 3] = [("code.sql", "sql"), ("code.py", "python"), ("code.r", "r")];

// --- config.json (only the storage mapping is needed) ---

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    storage: StorageMapping,
}

#[derive(Debug, Default, Deserialize)]
struct StorageMapping {
    #[serde(default)]
    input: TableMappings,
    #[serde(default)]
    output: TableMappings,
}

#[derive(Debug, Default, Deserialize)]
struct TableMappings {
    #[serde(default)]
    tables: Vec<TableMapping>,
}

#[derive(Debug, Default, Deserialize)]
struct TableMapping {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    destination: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NameOnly {
    #[serde(default)]
    name: Option<String>,
}

/// Reads `{project}/{branch}/transformation/**/config.json`.
pub struct TransformationScanner;

impl TransformationSource for TransformationScanner {
    fn load(&self, project_dir: &Path, branch: &str) -> Result<ScanOutput, DomainError> {
        Self::scan(project_dir, branch).map_err(|e| DomainError::ScanError(e.to_string()))
    }
}

impl TransformationScanner {
    #[instrument(skip(project_dir))]
    pub fn scan(project_dir: &Path, branch: &str) -> Result<ScanOutput, InfrastructureError> {
        let branch_dir = project_dir.join(branch);
        let transformation_dir = branch_dir.join("transformation");
        let mut output = ScanOutput::default();

        if !transformation_dir.is_dir() {
            info!(path = ?transformation_dir, "No transformation directory found");
            return Ok(output);
        }

        let walker = WalkDir::new(&transformation_dir)
            .min_depth(2)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!(path = ?path, error = %e, "Skipping unreadable entry");
                    output.failures.push(ScanFailure {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() || entry.file_name() != "config.json" {
                continue;
            }
            let Some(config_dir) = entry.path().parent() else {
                continue;
            };

            match Self::read_record(config_dir, &branch_dir) {
                Ok(record) => output.records.push(record),
                Err(e) => {
                    warn!(path = ?config_dir, error = %e, "Failed to scan transformation");
                    output.failures.push(ScanFailure {
                        path: config_dir.to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        output.records.sort_by(|a, b| a.path.cmp(&b.path));

        info!(
            records = output.records.len(),
            failures = output.failures.len(),
            "Scanned transformation configurations"
        );
        Ok(output)
    }

    fn read_record(
        config_dir: &Path,
        branch_dir: &Path,
    ) -> Result<TransformationRecord, InfrastructureError> {
        let name = dir_name(config_dir);
        let component_id = config_dir.parent().map(dir_name).unwrap_or_default();

        let content = fs::read_to_string(config_dir.join("config.json"))?;
        let config: ConfigFile = serde_json::from_str(&content)?;

        let meta = read_meta(&config_dir.join("meta.json"));
        let description = read_description(&config_dir.join("description.md"));

        let blocks_dir = config_dir.join("blocks");
        let blocks = if blocks_dir.is_dir() {
            read_blocks(&blocks_dir)
        } else {
            Vec::new()
        };

        let path = config_dir
            .strip_prefix(branch_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| config_dir.to_path_buf());

        Ok(TransformationRecord {
            name,
            component_id,
            meta,
            inputs: config
                .storage
                .input
                .tables
                .into_iter()
                .filter_map(|t| t.source)
                .collect(),
            outputs: config
                .storage
                .output
                .tables
                .into_iter()
                .filter_map(|t| t.destination)
                .collect(),
            description,
            path,
            blocks,
        })
    }
}

/// Optional metadata: missing or broken files fall back to defaults.
fn read_meta(path: &Path) -> TransformationMeta {
    if !path.exists() {
        return TransformationMeta::default();
    }
    let parsed = fs::read_to_string(path)
        .map_err(InfrastructureError::from)
        .and_then(|content| serde_json::from_str(&content).map_err(InfrastructureError::from));
    match parsed {
        Ok(meta) => meta,
        Err(e) => {
            warn!(path = ?path, error = %e, "Unreadable meta.json, using defaults");
            TransformationMeta::default()
        }
    }
}

fn read_description(path: &Path) -> String {
    if !path.exists() {
        return String::new();
    }
    match fs::read_to_string(path) {
        Ok(content) => content.trim().to_string(),
        Err(e) => {
            warn!(path = ?path, error = %e, "Unreadable description.md, ignoring");
            String::new()
        }
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Display name from an optional `meta.json`, else the directory name.
fn read_name(dir: &Path) -> String {
    let meta_path = dir.join("meta.json");
    fs::read_to_string(&meta_path)
        .ok()
        .and_then(|content| serde_json::from_str::<NameOnly>(&content).ok())
        .and_then(|meta| meta.name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| dir_name(dir))
}

fn sorted_subdirs(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect()
}

/// `blocks/{block}/{code}/code.{sql,py,r}`. Unreadable blocks are skipped.
fn read_blocks(blocks_dir: &Path) -> Vec<CodeBlock> {
    sorted_subdirs(blocks_dir)
        .into_iter()
        .filter_map(|block_dir| {
            let codes: Vec<Code> = sorted_subdirs(&block_dir)
                .iter()
                .filter_map(|code_dir| read_code(code_dir))
                .collect();
            if codes.is_empty() {
                return None;
            }
            Some(CodeBlock {
                name: read_name(&block_dir),
                codes,
            })
        })
        .collect()
}

fn read_code(code_dir: &Path) -> Option<Code> {
    for (file, language) in CODE_FILES {
        let path = code_dir.join(file);
        if !path.exists() {
            continue;
        }
        match fs::read_to_string(&path) {
            Ok(script) => {
                return Some(Code {
                    name: read_name(code_dir),
                    language: language.to_string(),
                    script,
                });
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to read code file");
                return None;
            }
        }
    }
    debug!(path = ?code_dir, "No code file found");
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) -> Result<()> {
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(path, content)?;
        Ok(())
    }

    #[test]
    fn test_missing_transformation_dir_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let output = TransformationScanner::scan(dir.path(), "main")?;
        assert!(output.records.is_empty());
        assert!(output.failures.is_empty());
        Ok(())
    }

    #[test]
    fn test_scan_reads_config_meta_description_and_blocks() -> Result<()> {
        let dir = tempdir()?;
        let config_dir = dir
            .path()
            .join("main/transformation/keboola.snowflake-transformation/agg_orders");
        write(
            &config_dir.join("config.json"),
            r#"{"storage": {
                "input": {"tables": [{"source": "in.c-shopify.orders", "destination": "orders"}]},
                "output": {"tables": [{"source": "totals", "destination": "out.c-shopify.daily_totals"}]}
            }}"#,
        )?;
        write(&config_dir.join("meta.json"), r#"{"name": "Aggregate Orders", "isDisabled": true}"#)?;
        write(&config_dir.join("description.md"), "\n  Daily totals.  \n")?;
        write(&config_dir.join("blocks/001-block/meta.json"), r#"{"name": "Main"}"#)?;
        write(&config_dir.join("blocks/001-block/001-code/code.sql"), "SELECT 1;")?;
        write(&config_dir.join("blocks/002-empty/001-code/readme.txt"), "nothing")?;

        let output = TransformationScanner::scan(dir.path(), "main")?;
        assert_eq!(output.records.len(), 1);

        let record = &output.records[0];
        assert_eq!(record.name, "agg_orders");
        assert_eq!(record.component_id, "keboola.snowflake-transformation");
        assert_eq!(record.meta.name.as_deref(), Some("Aggregate Orders"));
        assert!(record.meta.is_disabled);
        assert_eq!(record.description, "Daily totals.");
        assert_eq!(record.inputs, vec!["in.c-shopify.orders"]);
        assert_eq!(record.outputs, vec!["out.c-shopify.daily_totals"]);
        assert_eq!(
            record.path,
            PathBuf::from("transformation/keboola.snowflake-transformation/agg_orders")
        );

        assert_eq!(record.blocks.len(), 1);
        assert_eq!(record.blocks[0].name, "Main");
        assert_eq!(record.blocks[0].codes[0].name, "001-code");
        assert_eq!(record.blocks[0].codes[0].language, "sql");
        assert_eq!(record.blocks[0].codes[0].script, "SELECT 1;");
        Ok(())
    }

    #[test]
    fn test_broken_meta_and_description_fall_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config_dir = dir
            .path()
            .join("main/transformation/keboola.snowflake-transformation/agg");
        write(
            &config_dir.join("config.json"),
            r#"{"storage": {"input": {"tables": [{"source": "in.c-main.orders"}]}}}"#,
        )?;
        write(&config_dir.join("meta.json"), "{ broken")?;
        fs::write(config_dir.join("description.md"), [0xff_u8, 0xfe, 0x00, 0x9f])?;

        let output = TransformationScanner::scan(dir.path(), "main")?;
        assert!(output.failures.is_empty());
        assert_eq!(output.records.len(), 1);

        let record = &output.records[0];
        assert_eq!(record.name, "agg");
        assert_eq!(record.meta.name, None);
        assert!(!record.meta.is_disabled);
        assert_eq!(record.description, "");
        assert_eq!(record.inputs, vec!["in.c-main.orders".to_string()]);
        Ok(())
    }

    #[test]
    fn test_invalid_config_is_a_failure_not_an_abort() -> Result<()> {
        let dir = tempdir()?;
        let base = dir.path().join("main/transformation/keboola.python-transformation");
        write(&base.join("broken/config.json"), "{ not json")?;
        write(&base.join("good/config.json"), "{}")?;

        let output = TransformationScanner::scan(dir.path(), "main")?;
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].name, "good");
        assert!(output.records[0].inputs.is_empty());
        assert_eq!(output.failures.len(), 1);
        assert!(output.failures[0].path.ends_with("broken"));
        Ok(())
    }

    #[test]
    fn test_records_sorted_by_path() -> Result<()> {
        let dir = tempdir()?;
        let base = dir.path().join("main/transformation");
        write(&base.join("keboola.snowflake-transformation/zeta/config.json"), "{}")?;
        write(&base.join("keboola.dbt-transformation/alpha/config.json"), "{}")?;
        write(&base.join("keboola.snowflake-transformation/beta/config.json"), "{}")?;

        let output = TransformationScanner::scan(dir.path(), "main")?;
        let names: Vec<&str> = output.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "zeta"]);
        Ok(())
    }

    #[test]
    fn test_variables_directories_are_still_returned_as_records() -> Result<()> {
        // filtering happens in the registry, the scanner reports what is on disk
        let dir = tempdir()?;
        let base = dir
            .path()
            .join("main/transformation/keboola.snowflake-transformation/agg");
        write(&base.join("config.json"), "{}")?;
        write(&base.join("variables/config.json"), "{}")?;
        write(&base.join("variables/values/default/config.json"), "{}")?;

        let output = TransformationScanner::scan(dir.path(), "main")?;
        assert_eq!(output.records.len(), 3);
        assert!(output.records.iter().filter(|r| !r.is_variables_definition()).count() == 1);
        Ok(())
    }
}
