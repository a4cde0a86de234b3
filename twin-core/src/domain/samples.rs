// twin-core/src/domain/samples.rs

use serde::Serialize;

/// Shape of a table preview exported next to its CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleSummary {
    pub table_id: String,
    pub bucket: String,
    pub table: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl SampleSummary {
    /// Header-only parse: the preview endpoint returns plain RFC 4180 text and
    /// only the column names are needed here.
    pub fn from_csv(table_id: &str, bucket: &str, table: &str, csv: &str) -> Self {
        let mut lines = csv.lines().filter(|l| !l.trim().is_empty());
        let columns = lines
            .next()
            .map(|header| {
                header
                    .split(',')
                    .map(|c| c.trim().trim_matches('"').to_string())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            table_id: table_id.to_string(),
            bucket: bucket.to_string(),
            table: table.to_string(),
            row_count: lines.count(),
            columns,
        }
    }
}
