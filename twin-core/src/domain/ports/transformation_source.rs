use crate::domain::error::DomainError;
use crate::domain::lineage::TransformationRecord;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A configuration directory that could not be turned into a record.
#[derive(Debug, Clone, Serialize)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ScanOutput {
    /// Sorted by path.
    pub records: Vec<TransformationRecord>,
    pub failures: Vec<ScanFailure>,
}

pub trait TransformationSource: Send + Sync {
    fn load(&self, project_dir: &Path, branch: &str) -> Result<ScanOutput, DomainError>;
}
