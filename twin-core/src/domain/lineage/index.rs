// twin-core/src/domain/lineage/index.rs
//
// Read-only aggregates derived from a completed registry.

use serde::Serialize;
use std::collections::BTreeMap;

use super::classify::{SOURCE_UNKNOWN, SourceKind, source_display_name};
use super::registry::LineageRegistry;

pub const MOST_CONNECTED_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct BucketSummary {
    pub name: String,
    pub source: String,
    pub table_count: usize,
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SourceStats {
    pub count: usize,
    pub total_tables: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformationSummary {
    pub uid: String,
    pub name: String,
    pub platform: String,
    pub is_disabled: bool,
    pub input_count: usize,
    pub output_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Table,
    Transformation,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectedNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub connections: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableEntry {
    pub uid: String,
    pub name: String,
    pub bucket: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformationEntry {
    pub uid: String,
    pub name: String,
    pub is_disabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceRow {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub instances: usize,
    pub total_tables: usize,
    pub buckets: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct GraphMeta {
    pub total_edges: usize,
    pub total_nodes: usize,
    pub tables: usize,
    pub transformations: usize,
    pub sources: usize,
}

/// Everything the emitter needs besides the raw entities.
#[derive(Debug, Clone, Serialize)]
pub struct TwinIndex {
    pub buckets: Vec<BucketSummary>,
    pub by_source: BTreeMap<String, SourceStats>,
    pub transformations: Vec<TransformationSummary>,
    pub by_platform: BTreeMap<String, usize>,
    pub most_connected: Vec<ConnectedNode>,
    pub tables_by_source: BTreeMap<String, Vec<TableEntry>>,
    pub transformations_by_platform: BTreeMap<String, Vec<TransformationEntry>>,
    pub sources: Vec<SourceRow>,
    pub graph: GraphMeta,
}

impl TwinIndex {
    pub fn build(registry: &LineageRegistry) -> Self {
        let buckets = bucket_summaries(registry);

        let mut by_source: BTreeMap<String, SourceStats> = BTreeMap::new();
        for bucket in &buckets {
            let stats = by_source.entry(bucket.source.clone()).or_default();
            stats.count += 1;
            stats.total_tables += bucket.table_count;
        }

        let mut transformations: Vec<TransformationSummary> = registry
            .transformations()
            .iter()
            .map(|t| TransformationSummary {
                uid: t.uid.clone(),
                name: t.name.clone(),
                platform: t.platform.as_str().to_string(),
                is_disabled: t.is_disabled,
                input_count: t.inputs.len(),
                output_count: t.outputs.len(),
            })
            .collect();
        transformations.sort_by(|a, b| a.uid.cmp(&b.uid));

        let mut by_platform: BTreeMap<String, usize> = BTreeMap::new();
        for t in &transformations {
            *by_platform.entry(t.platform.clone()).or_insert(0) += 1;
        }

        let mut tables_by_source: BTreeMap<String, Vec<TableEntry>> = BTreeMap::new();
        for table in registry.tables() {
            tables_by_source
                .entry(table.source.clone())
                .or_default()
                .push(TableEntry {
                    uid: table.uid.clone(),
                    name: table.name.clone(),
                    bucket: table.bucket_clean.clone(),
                });
        }

        let mut transformations_by_platform: BTreeMap<String, Vec<TransformationEntry>> =
            BTreeMap::new();
        for t in registry.transformations() {
            transformations_by_platform
                .entry(t.platform.as_str().to_string())
                .or_default()
                .push(TransformationEntry {
                    uid: t.uid.clone(),
                    name: t.name.clone(),
                    is_disabled: t.is_disabled,
                });
        }

        let sources = registry
            .sources()
            .values()
            .map(|s| SourceRow {
                id: s.tag.clone(),
                name: source_display_name(&s.tag),
                kind: SourceKind::of(&s.tag),
                instances: s.buckets.len(),
                total_tables: s.table_count,
                buckets: s.buckets.iter().cloned().collect(),
            })
            .collect();

        let graph = GraphMeta {
            total_edges: registry.edges().len(),
            total_nodes: registry.tables().len() + registry.transformations().len(),
            tables: registry.tables().len(),
            transformations: registry.transformations().len(),
            sources: registry.sources().len(),
        };

        Self {
            buckets,
            by_source,
            transformations,
            by_platform,
            most_connected: most_connected(registry, MOST_CONNECTED_LIMIT),
            tables_by_source,
            transformations_by_platform,
            sources,
            graph,
        }
    }
}

fn bucket_summaries(registry: &LineageRegistry) -> Vec<BucketSummary> {
    // BTreeMap iteration is already sorted by name
    registry
        .buckets()
        .values()
        .map(|b| {
            let mut tables = b.tables.clone();
            tables.sort();
            BucketSummary {
                name: b.name.clone(),
                source: b
                    .source
                    .clone()
                    .unwrap_or_else(|| SOURCE_UNKNOWN.to_string()),
                table_count: b.tables.len(),
                tables,
            }
        })
        .collect()
}

/// Tables first, then transformations, each in discovery order. The sort is
/// stable, so equal counts keep that order.
pub fn most_connected(registry: &LineageRegistry, limit: usize) -> Vec<ConnectedNode> {
    let tables = registry.tables().iter().map(|t| ConnectedNode {
        id: t.uid.clone(),
        name: t.name.clone(),
        kind: NodeKind::Table,
        connections: t.connections(),
    });
    let transformations = registry.transformations().iter().map(|t| ConnectedNode {
        id: t.uid.clone(),
        name: t.name.clone(),
        kind: NodeKind::Transformation,
        connections: t.connections(),
    });

    let mut nodes: Vec<ConnectedNode> = tables
        .chain(transformations)
        .filter(|n| n.connections > 0)
        .collect();
    nodes.sort_by(|a, b| b.connections.cmp(&a.connections));
    nodes.truncate(limit);
    nodes
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::lineage::registry::TransformationRecord;
    use std::path::PathBuf;

    fn record(name: &str, component: &str, inputs: &[&str], outputs: &[&str]) -> TransformationRecord {
        TransformationRecord {
            name: name.to_string(),
            component_id: component.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            path: PathBuf::from(name),
            ..TransformationRecord::default()
        }
    }

    #[test]
    fn test_most_connected_tie_break_keeps_discovery_order() {
        let mut records: Vec<TransformationRecord> = (0..5)
            .map(|i| {
                record(
                    &format!("t{i}"),
                    "keboola.snowflake-transformation",
                    &["in.c-m.X", "in.c-m.Y"],
                    &[],
                )
            })
            .collect();
        records.push(record(
            "t5",
            "keboola.python-transformation",
            &["in.c-m.Z", "in.c-m.Z"],
            &[],
        ));
        let registry = LineageRegistry::from_records(&records);

        let nodes = most_connected(&registry, MOST_CONNECTED_LIMIT);
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(&ids[..4], &["table:c-m/X", "table:c-m/Y", "table:c-m/Z", "transform:t0"]);
        assert_eq!(nodes[0].connections, 5);
        assert_eq!(nodes[2].connections, 2);
    }

    #[test]
    fn test_most_connected_is_capped_and_skips_isolated() {
        let mut records: Vec<TransformationRecord> = (0..60)
            .map(|i| {
                let output = format!("out.c-m.table_{i}");
                record(&format!("t{i:02}"), "keboola.snowflake-transformation", &[], &[&output])
            })
            .collect();
        records.push(record("isolated", "keboola.snowflake-transformation", &[], &[]));
        let registry = LineageRegistry::from_records(&records);

        let nodes = most_connected(&registry, MOST_CONNECTED_LIMIT);
        assert_eq!(nodes.len(), MOST_CONNECTED_LIMIT);
        assert_eq!(nodes[0].id, "table:c-m/table_0");
        assert!(nodes.iter().all(|n| n.id != "transform:isolated"));
    }

    #[test]
    fn test_bucket_and_source_aggregates() {
        let records = vec![
            record(
                "load",
                "keboola.ex-shopify",
                &[],
                &["out.c-shopify.orders", "out.c-shopify.customers"],
            ),
            record(
                "report",
                "keboola.snowflake-transformation",
                &["in.c-shopify.orders"],
                &["out.c-reporting.summary"],
            ),
        ];
        let registry = LineageRegistry::from_records(&records);
        let index = TwinIndex::build(&registry);

        let names: Vec<&str> = index.buckets.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["reporting", "shopify"]);
        assert_eq!(index.buckets[1].tables, vec!["customers", "orders"]);
        assert_eq!(index.buckets[0].source, "storage-output");

        assert_eq!(
            index.by_source["shopify"],
            SourceStats {
                count: 1,
                total_tables: 2
            }
        );
        assert_eq!(index.by_platform["snowflake"], 1);
        assert_eq!(index.by_platform["unknown"], 1);
        assert_eq!(index.tables_by_source["shopify"].len(), 2);
        // same bucket name as the output paths
        assert_eq!(index.tables_by_source["shopify"][0].bucket, "shopify");
        assert_eq!(index.transformations_by_platform["snowflake"][0].uid, "transform:report");

        let uids: Vec<&str> = index.transformations.iter().map(|t| t.uid.as_str()).collect();
        assert_eq!(uids, vec!["transform:load", "transform:report"]);
    }

    #[test]
    fn test_source_registry_and_graph_meta() -> anyhow::Result<()> {
        let records = vec![record(
            "sync",
            "keboola.python-transformation",
            &["in.c-hubspot.contacts", "in.c-crm-extra.deals"],
            &["out.c-marts.pipeline"],
        )];
        let registry = LineageRegistry::from_records(&records);
        let index = TwinIndex::build(&registry);

        let hubspot = index.sources.iter().find(|s| s.id == "hubspot").unwrap();
        assert_eq!(hubspot.name, "HubSpot");
        assert_eq!(hubspot.kind, SourceKind::Extractor);
        assert_eq!(hubspot.instances, 2);
        assert_eq!(hubspot.total_tables, 2);
        assert_eq!(hubspot.buckets, vec!["crm-extra", "hubspot"]);

        assert_eq!(
            index.graph,
            GraphMeta {
                total_edges: 3,
                total_nodes: 4,
                tables: 3,
                transformations: 1,
                sources: 2,
            }
        );

        let json = serde_json::to_value(&index.sources)?;
        assert_eq!(json[0]["type"], "extractor");
        Ok(())
    }

    #[test]
    fn test_empty_registry_builds_empty_index() {
        let index = TwinIndex::build(&LineageRegistry::new());
        assert!(index.buckets.is_empty());
        assert!(index.most_connected.is_empty());
        assert_eq!(index.graph, GraphMeta::default());
    }
}
