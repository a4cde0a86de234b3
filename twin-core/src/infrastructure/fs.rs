// twin-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write content to a file atomically using a temporary file.
///
/// Missing parent directories are created first. The temporary file lives in
/// the target directory so that the final rename never crosses filesystems.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Pretty JSON with a trailing newline.
pub fn write_json<P: AsRef<Path>, T: Serialize + ?Sized>(
    path: P,
    value: &T,
) -> Result<(), InfrastructureError> {
    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');
    atomic_write(path, body)
}

/// One compact JSON document per line.
pub fn write_jsonl<P, T, I>(path: P, lines: I) -> Result<(), InfrastructureError>
where
    P: AsRef<Path>,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut body = String::new();
    for line in lines {
        body.push_str(&serde_json::to_string(&line)?);
        body.push('\n');
    }
    atomic_write(path, body)
}

pub fn write_yaml<P: AsRef<Path>, T: Serialize + ?Sized>(
    path: P,
    value: &T,
) -> Result<(), InfrastructureError> {
    atomic_write(path, serde_yaml::to_string(value)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_parents() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("buckets/shopify/index.json");

        atomic_write(&file_path, "{}")?;

        assert_eq!(fs::read_to_string(file_path)?, "{}");
        Ok(())
    }

    #[test]
    fn test_atomic_write_overwrites_existing() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("README.md");

        atomic_write(&file_path, "Initial")?;
        atomic_write(&file_path, "Updated")?;

        assert_eq!(fs::read_to_string(file_path)?, "Updated");
        Ok(())
    }

    #[test]
    fn test_write_jsonl_one_document_per_line() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("graph.jsonl");

        write_jsonl(
            &file_path,
            vec![serde_json::json!({"a": 1}), serde_json::json!({"b": [1, 2]})],
        )?;

        let content = fs::read_to_string(file_path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec![r#"{"a":1}"#, r#"{"b":[1,2]}"#]);
        Ok(())
    }

    #[test]
    fn test_write_json_is_pretty() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("index.json");

        write_json(&file_path, &serde_json::json!({"total": 2}))?;

        let content = fs::read_to_string(&file_path)?;
        assert!(content.contains("\n  \"total\": 2"));
        assert!(content.ends_with('\n'));
        Ok(())
    }
}
