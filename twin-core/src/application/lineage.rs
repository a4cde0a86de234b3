// twin-core/src/application/lineage.rs
//
// Lineage report: the registry graph as JSON or as a Mermaid flowchart.

use serde::Serialize;
use std::collections::HashMap;

use crate::domain::lineage::index::NodeKind;
use crate::domain::lineage::{EdgeType, GraphEdge, LineageRegistry};

// ── Report Structures ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LineageReport {
    pub nodes: Vec<LineageNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Serialize)]
pub struct LineageNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Transformations only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Tables only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl LineageReport {
    /// Tables first, then transformations, both in discovery order.
    pub fn from_registry(registry: &LineageRegistry) -> Self {
        let tables = registry.tables().iter().map(|t| LineageNode {
            id: t.uid.clone(),
            name: format!("{}.{}", t.bucket, t.name),
            kind: NodeKind::Table,
            platform: None,
            source: Some(t.source.clone()),
        });
        let transformations = registry.transformations().iter().map(|t| LineageNode {
            id: t.uid.clone(),
            name: t.name.clone(),
            kind: NodeKind::Transformation,
            platform: Some(t.platform.to_string()),
            source: None,
        });

        Self {
            nodes: tables.chain(transformations).collect(),
            edges: registry.edges().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_mermaid(&self) -> String {
        let mut lines = Vec::new();
        lines.push("graph LR".to_string());

        // Registry ids contain ':' and '/', Mermaid ids cannot.
        let ids: HashMap<&str, String> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), format!("n{}", i)))
            .collect();

        for node in &self.nodes {
            let id = &ids[node.id.as_str()];
            let label = node.name.replace('"', "'");
            match node.kind {
                NodeKind::Table => lines.push(format!("    {}[(\"{}\")]", id, label)),
                NodeKind::Transformation => {
                    let platform = node.platform.as_deref().unwrap_or("unknown");
                    lines.push(format!("    {}[[\"{} ({})\"]]", id, label, platform))
                }
            }
        }

        for edge in &self.edges {
            let (Some(from), Some(to)) = (ids.get(edge.from.as_str()), ids.get(edge.to.as_str()))
            else {
                continue;
            };
            match edge.edge_type {
                EdgeType::ConsumedBy => lines.push(format!("    {} --> {}", from, to)),
                EdgeType::Produces => lines.push(format!("    {} ==> {}", from, to)),
            }
        }

        lines.join("\n")
    }
}
