// twin-core/src/domain/lineage/reference.rs

use serde::{Deserialize, Serialize};
use std::fmt;

pub const STAGE_IN: &str = "in";
pub const STAGE_OUT: &str = "out";

/// A parsed dotted table reference: `{stage}.{bucket}.{table}`.
///
/// Table names may contain dots themselves, so everything after the bucket
/// segment belongs to the table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub stage: String,
    pub bucket: String,
    pub table: String,
}

impl TableRef {
    /// Returns `None` when the reference has fewer than three segments.
    /// Callers skip such references silently: sparse configs are full of them.
    pub fn parse(reference: &str) -> Option<Self> {
        let mut parts = reference.split('.');
        let stage = parts.next()?;
        let bucket = parts.next()?;
        let rest: Vec<&str> = parts.collect();
        if rest.is_empty() {
            return None;
        }

        Some(Self {
            stage: stage.to_string(),
            bucket: bucket.to_string(),
            table: rest.join("."),
        })
    }

    /// Identifier expected by the Storage API (`in.c-bucket.table`).
    pub fn table_id(&self) -> String {
        format!("{}.{}.{}", self.stage, self.bucket, self.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_id())
    }
}
