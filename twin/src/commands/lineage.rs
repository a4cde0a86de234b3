// twin/src/commands/lineage.rs
//
// USE CASE: Lineage graph of the local export, without the Storage API.

use std::path::PathBuf;

use anyhow::Context;
use twin_core::application::LineageReport;
use twin_core::domain::lineage::LineageRegistry;
use twin_core::domain::ports::TransformationSource;
use twin_core::infrastructure::config::load_twin_config;
use twin_core::infrastructure::scanner::TransformationScanner;

use crate::cli::LineageFormat;

pub fn execute(project_dir: PathBuf, format: LineageFormat) -> anyhow::Result<()> {
    // 1. Load Config & Scan
    let config = load_twin_config(&project_dir).with_context(|| {
        format!("Failed to load twin configuration from {:?}", project_dir)
    })?;
    let scan = TransformationScanner.load(&project_dir, &config.source_branch)?;
    let registry = LineageRegistry::from_records(&scan.records);

    // 2. Build Report
    let report = LineageReport::from_registry(&registry);

    // 3. Output Report (stdout stays machine-readable in JSON mode)
    match format {
        LineageFormat::Json => {
            println!("{}", report.to_json()?);
        }
        LineageFormat::Mermaid => {
            println!("🔍 Lineage of branch '{}'", config.source_branch);
            println!("\n```mermaid");
            println!("{}", report.to_mermaid());
            println!("```\n");

            println!("📊 Lineage Summary:");
            println!("   Nodes: {}", report.nodes.len());
            println!("   Edges: {}", report.edges.len());
        }
    }

    if !scan.failures.is_empty() {
        eprintln!("⚠️  {} configuration(s) could not be read:", scan.failures.len());
        for failure in &scan.failures {
            eprintln!("   ❌ {}: {}", failure.path.display(), failure.reason);
        }
    }

    Ok(())
}
