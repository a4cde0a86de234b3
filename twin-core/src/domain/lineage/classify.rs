// twin-core/src/domain/lineage/classify.rs
//
// Substring classification of component ids (platform) and bucket names (source).
// Both tables are evaluated top to bottom: the first matching entry wins, so the
// specific patterns must stay above the generic ones (e.g. "postgres" above "sql").

use serde::{Deserialize, Serialize};
use std::fmt;

use super::reference::{STAGE_IN, STAGE_OUT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Snowflake,
    Redshift,
    Bigquery,
    Synapse,
    Mssql,
    Mysql,
    Postgresql,
    Oracle,
    Exasol,
    Duckdb,
    Python,
    R,
    Julia,
    Dbt,
    Spark,
    Sql,
    Unknown,
}

/// Ordered platform table. Do not reorder without checking the tests.
const PLATFORM_PATTERNS: &[(Platform, &[&str])] = &[
    (Platform::Snowflake, &["snowflake"]),
    (Platform::Redshift, &["redshift"]),
    (Platform::Bigquery, &["bigquery"]),
    (Platform::Synapse, &["synapse"]),
    (Platform::Mssql, &["mssql", "sql-server"]),
    (Platform::Mysql, &["mysql"]),
    (Platform::Postgresql, &["postgres", "pgsql"]),
    (Platform::Oracle, &["oracle"]),
    (Platform::Exasol, &["exasol"]),
    (Platform::Duckdb, &["duckdb"]),
    (Platform::Python, &["python"]),
    (Platform::R, &[".r-transformation"]),
    (Platform::Julia, &["julia"]),
    (Platform::Dbt, &["dbt"]),
    (Platform::Spark, &["spark"]),
    (Platform::Sql, &["sql", "transformation"]),
];

impl Platform {
    pub fn detect(component_id: &str) -> Self {
        let cid = component_id.to_lowercase();
        PLATFORM_PATTERNS
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| cid.contains(p)))
            .map(|(platform, _)| *platform)
            .unwrap_or(Platform::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snowflake => "snowflake",
            Self::Redshift => "redshift",
            Self::Bigquery => "bigquery",
            Self::Synapse => "synapse",
            Self::Mssql => "mssql",
            Self::Mysql => "mysql",
            Self::Postgresql => "postgresql",
            Self::Oracle => "oracle",
            Self::Exasol => "exasol",
            Self::Duckdb => "duckdb",
            Self::Python => "python",
            Self::R => "r",
            Self::Julia => "julia",
            Self::Dbt => "dbt",
            Self::Spark => "spark",
            Self::Sql => "sql",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// --- SOURCES ---

pub const SOURCE_STORAGE_INPUT: &str = "storage-input";
pub const SOURCE_STORAGE_OUTPUT: &str = "storage-output";
pub const SOURCE_UNKNOWN: &str = "unknown";

const SOURCE_PATTERNS: &[(&str, &[&str])] = &[
    ("shopify", &["shopify", "ex-shopify"]),
    ("hubspot", &["hubspot", "ex-hubspot", "crm"]),
    ("google-analytics", &["ga4", "analytics", "ex-google-analytics"]),
    ("google-drive", &["drive", "ex-google-drive"]),
    ("salesforce", &["salesforce", "ex-salesforce"]),
    ("facebook", &["facebook", "ex-facebook"]),
    ("mysql", &["mysql", "ex-mysql", "ex-db-mysql"]),
    ("postgres", &["postgres", "postgresql", "ex-db-pgsql"]),
    ("snowflake", &["snowflake"]),
    ("bigquery", &["bigquery"]),
    ("stripe", &["stripe"]),
    ("jira", &["jira"]),
    ("slack", &["slack"]),
    ("zendesk", &["zendesk"]),
];

/// Infers the originating system of a bucket.
///
/// Name patterns take precedence; the stage of the reference is only a fallback.
pub fn infer_source(bucket: &str, stage: &str) -> &'static str {
    let bucket_lower = bucket.to_lowercase();
    if let Some((source, _)) = SOURCE_PATTERNS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| bucket_lower.contains(p)))
    {
        return source;
    }

    match stage {
        STAGE_IN => SOURCE_STORAGE_INPUT,
        STAGE_OUT => SOURCE_STORAGE_OUTPUT,
        _ => SOURCE_UNKNOWN,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Extractor,
    Database,
    Internal,
    Unknown,
}

impl SourceKind {
    pub fn of(source: &str) -> Self {
        match source {
            "shopify" | "hubspot" | "google-analytics" | "google-drive" | "salesforce"
            | "facebook" | "stripe" | "jira" | "slack" | "zendesk" => Self::Extractor,
            "mysql" | "postgres" | "snowflake" | "bigquery" => Self::Database,
            SOURCE_STORAGE_INPUT | SOURCE_STORAGE_OUTPUT => Self::Internal,
            _ => Self::Unknown,
        }
    }
}

/// Human readable label: "google-analytics" -> "Google Analytics".
pub fn source_display_name(source: &str) -> String {
    match source {
        "hubspot" => "HubSpot".to_string(),
        "mysql" => "MySQL".to_string(),
        "postgres" => "PostgreSQL".to_string(),
        "bigquery" => "BigQuery".to_string(),
        other => other
            .split('-')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Display form of a bucket: the conventional `c-` prefix is stripped.
pub fn clean_bucket_name(bucket: &str) -> String {
    match bucket.strip_prefix("c-") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => bucket.to_string(),
    }
}
