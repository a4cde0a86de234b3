// twin-core/src/domain/lineage/registry.rs
//
// Entity registry: consolidates transformation records into deduplicated
// tables, buckets, transformations, sources and the lineage edge list.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use tracing::{debug, warn};

use super::classify::{Platform, clean_bucket_name, infer_source};
use super::reference::TableRef;

// ── Input Records ────────────────────────────────────────────────────

/// Optional `meta.json` of a transformation directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformationMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "isDisabled")]
    pub is_disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeBlock {
    pub name: String,
    pub codes: Vec<Code>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Code {
    pub name: String,
    /// sql | python | r
    pub language: String,
    pub script: String,
}

/// One scanned transformation configuration directory.
#[derive(Debug, Clone, Default)]
pub struct TransformationRecord {
    /// Name of the configuration directory.
    pub name: String,
    /// Name of the parent (component) directory.
    pub component_id: String,
    pub meta: TransformationMeta,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub description: String,
    /// Path relative to the scanned branch directory.
    pub path: PathBuf,
    pub blocks: Vec<CodeBlock>,
}

impl TransformationRecord {
    /// Variables are parameter definitions, not data transformations.
    pub fn is_variables_definition(&self) -> bool {
        if self.name == "variables" {
            return true;
        }
        let normalized = self.path.to_string_lossy().replace('\\', "/");
        normalized.contains("variables/values")
    }
}

// ── Entities ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub uid: String,
    pub name: String,
    pub bucket: String,
    pub bucket_clean: String,
    pub source: String,
    /// Stage of the reference that created the table (`in` / `out`).
    pub stage: String,
    pub description: String,
    pub consumed_by: Vec<String>,
    pub produced_by: Vec<String>,
}

impl Table {
    pub fn connections(&self) -> usize {
        self.consumed_by.len() + self.produced_by.len()
    }

    /// Storage API identifier, e.g. `in.c-shopify.orders`.
    pub fn storage_id(&self) -> String {
        format!("{}.{}.{}", self.stage, self.bucket, self.name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Transformation {
    pub uid: String,
    pub name: String,
    /// Configuration directory name.
    pub config_id: String,
    pub platform: Platform,
    pub component_id: String,
    pub is_disabled: bool,
    pub description: String,
    pub original_path: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    #[serde(skip)]
    pub blocks: Vec<CodeBlock>,
}

impl Transformation {
    pub fn connections(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Bucket {
    pub name: String,
    pub tables: Vec<String>,
    /// First inferred source of any table of the bucket. Never overwritten.
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Source {
    pub tag: String,
    pub buckets: BTreeSet<String>,
    pub table_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// table -> transformation
    ConsumedBy,
    /// transformation -> table
    Produces,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
}

pub fn table_uid(bucket: &str, table: &str) -> String {
    format!("table:{}/{}", bucket, table)
}

pub fn transformation_uid(name: &str) -> String {
    format!("transform:{}", name)
}

#[derive(Clone, Copy)]
enum Direction {
    Input,
    Output,
}

// ── Registry ─────────────────────────────────────────────────────────

/// Owned result of a scan pass. Entities keep their discovery order.
#[derive(Debug, Default, Clone)]
pub struct LineageRegistry {
    tables: Vec<Table>,
    table_index: HashMap<(String, String), usize>,
    transformations: Vec<Transformation>,
    transformation_index: HashMap<String, usize>,
    buckets: BTreeMap<String, Bucket>,
    sources: BTreeMap<String, Source>,
    edges: Vec<GraphEdge>,
}

impl LineageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a TransformationRecord>,
    {
        let mut registry = Self::new();
        for record in records {
            registry.ingest(record);
        }
        registry
    }

    pub fn ingest(&mut self, record: &TransformationRecord) {
        if record.is_variables_definition() {
            debug!(path = ?record.path, "Skipping variables definition");
            return;
        }

        let t_idx = self.track_transformation(record);

        for reference in &record.inputs {
            self.track_reference(reference, t_idx, Direction::Input);
        }
        for reference in &record.outputs {
            self.track_reference(reference, t_idx, Direction::Output);
        }
    }

    fn track_transformation(&mut self, record: &TransformationRecord) -> usize {
        let uid = transformation_uid(&record.name);
        if let Some(&idx) = self.transformation_index.get(&uid) {
            warn!(
                uid = %uid,
                component = %record.component_id,
                "Transformation id already registered, merging references"
            );
            return idx;
        }

        let transformation = Transformation {
            uid: uid.clone(),
            name: record
                .meta
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| record.name.clone()),
            config_id: record.name.clone(),
            platform: Platform::detect(&record.component_id),
            component_id: record.component_id.clone(),
            is_disabled: record.meta.is_disabled,
            description: record.description.clone(),
            original_path: record.path.to_string_lossy().replace('\\', "/"),
            inputs: Vec::new(),
            outputs: Vec::new(),
            blocks: record.blocks.clone(),
        };

        let idx = self.transformations.len();
        self.transformations.push(transformation);
        self.transformation_index.insert(uid, idx);
        idx
    }

    fn track_reference(&mut self, reference: &str, t_idx: usize, direction: Direction) {
        let Some(table_ref) = TableRef::parse(reference) else {
            debug!(reference, "Ignoring malformed table reference");
            return;
        };

        let table_idx = self.track_table(&table_ref);
        let table_id = self.tables[table_idx].uid.clone();
        let transform_id = self.transformations[t_idx].uid.clone();

        match direction {
            Direction::Input => {
                self.tables[table_idx].consumed_by.push(transform_id.clone());
                self.transformations[t_idx].inputs.push(table_id.clone());
                self.edges.push(GraphEdge {
                    from: table_id,
                    to: transform_id,
                    edge_type: EdgeType::ConsumedBy,
                });
            }
            Direction::Output => {
                self.tables[table_idx].produced_by.push(transform_id.clone());
                self.transformations[t_idx].outputs.push(table_id.clone());
                self.edges.push(GraphEdge {
                    from: transform_id,
                    to: table_id,
                    edge_type: EdgeType::Produces,
                });
            }
        }
    }

    /// Look up before insert: immutable fields are only set on creation.
    fn track_table(&mut self, table_ref: &TableRef) -> usize {
        let key = (table_ref.bucket.clone(), table_ref.table.clone());
        if let Some(&idx) = self.table_index.get(&key) {
            return idx;
        }

        let source = infer_source(&table_ref.bucket, &table_ref.stage);
        let bucket_clean = clean_bucket_name(&table_ref.bucket);

        let table = Table {
            uid: table_uid(&table_ref.bucket, &table_ref.table),
            name: table_ref.table.clone(),
            bucket: table_ref.bucket.clone(),
            bucket_clean: bucket_clean.clone(),
            source: source.to_string(),
            stage: table_ref.stage.clone(),
            description: format!("Table {} from {}", table_ref.table, source),
            consumed_by: Vec::new(),
            produced_by: Vec::new(),
        };

        let bucket = self
            .buckets
            .entry(bucket_clean.clone())
            .or_insert_with(|| Bucket {
                name: bucket_clean.clone(),
                ..Bucket::default()
            });
        bucket.tables.push(table_ref.table.clone());
        if bucket.source.is_none() {
            bucket.source = Some(source.to_string());
        }

        let entry = self
            .sources
            .entry(source.to_string())
            .or_insert_with(|| Source {
                tag: source.to_string(),
                ..Source::default()
            });
        entry.buckets.insert(bucket_clean);
        entry.table_count += 1;

        let idx = self.tables.len();
        self.tables.push(table);
        self.table_index.insert(key, idx);
        idx
    }

    // --- READ ACCESS ---

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, bucket: &str, table: &str) -> Option<&Table> {
        self.table_index
            .get(&(bucket.to_string(), table.to_string()))
            .map(|&idx| &self.tables[idx])
    }

    pub fn transformations(&self) -> &[Transformation] {
        &self.transformations
    }

    pub fn transformation(&self, uid: &str) -> Option<&Transformation> {
        self.transformation_index
            .get(uid)
            .map(|&idx| &self.transformations[idx])
    }

    /// Buckets keyed by cleaned name.
    pub fn buckets(&self) -> &BTreeMap<String, Bucket> {
        &self.buckets
    }

    pub fn sources(&self) -> &BTreeMap<String, Source> {
        &self.sources
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }
}
