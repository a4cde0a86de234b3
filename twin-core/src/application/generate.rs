// twin-core/src/application/generate.rs
//
// USE CASE: scan -> registry -> index -> (remote fetch) -> emit.

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::application::clean::output_path;
use crate::application::fetch::{RemoteData, fetch_remote};
use crate::application::ports::TemplateEngine;
use crate::application::twin::{TwinGenerator, TwinInput};
use crate::domain::jobs::JobsIndex;
use crate::domain::lineage::{LineageRegistry, TwinIndex};
use crate::domain::ports::{ScanFailure, TransformationSource};
use crate::domain::project::TwinConfig;
use crate::error::TwinError;
use crate::ports::storage_api::StorageApi;

#[derive(Debug, Serialize)]
pub struct GenerationSummary {
    pub output_dir: PathBuf,
    pub tables: usize,
    pub transformations: usize,
    pub buckets: usize,
    pub sources: usize,
    pub edges: usize,
    pub jobs: usize,
    pub samples: usize,
    pub files_written: usize,
    pub scan_failures: Vec<ScanFailure>,
}

/// `api` is `None` in offline mode: no metadata, jobs or samples are fetched.
#[instrument(skip_all, fields(project = ?project_dir))]
pub async fn generate_twin(
    source: &dyn TransformationSource,
    renderer: &dyn TemplateEngine,
    api: Option<&dyn StorageApi>,
    project_dir: &Path,
    config: &TwinConfig,
) -> Result<GenerationSummary, TwinError> {
    let output_dir = output_path(project_dir, &config.output_dir)?;

    // 1. SCAN (Infra -> Domain)
    println!("🕵️  Scanning transformations in '{}'...", config.source_branch);
    let scan = source.load(project_dir, &config.source_branch)?;
    for failure in &scan.failures {
        warn!(path = ?failure.path, reason = %failure.reason, "Scan failure");
    }

    // 2. REGISTRY + INDEX (pure)
    let registry = LineageRegistry::from_records(&scan.records);
    let index = TwinIndex::build(&registry);
    info!(
        tables = registry.tables().len(),
        transformations = registry.transformations().len(),
        edges = registry.edges().len(),
        "Lineage registry built"
    );

    // 3. REMOTE (optional)
    let remote = match api {
        Some(api) => fetch_remote(api, &registry, config).await?,
        None => {
            println!("📴 Offline mode: skipping project metadata, jobs and samples");
            RemoteData::default()
        }
    };
    let jobs = JobsIndex::build(&remote.jobs, config.api.jobs_limit);

    // 4. EMIT
    let generated_at = Utc::now().to_rfc3339();
    let project_name = project_label(project_dir);
    let input = TwinInput {
        registry: &registry,
        index: &index,
        jobs: &jobs,
        samples: &remote.samples,
        project: remote.project.as_ref(),
        project_name: &project_name,
        config,
        generated_at: &generated_at,
    };
    let files_written = TwinGenerator::new(&output_dir, renderer).generate(&input)?;

    Ok(GenerationSummary {
        output_dir,
        tables: registry.tables().len(),
        transformations: registry.transformations().len(),
        buckets: registry.buckets().len(),
        sources: registry.sources().len(),
        edges: registry.edges().len(),
        jobs: jobs.total_jobs,
        samples: remote.samples.len(),
        files_written,
        scan_failures: scan.failures,
    })
}

/// Directory name of the project, used as a title when offline.
fn project_label(project_dir: &Path) -> String {
    project_dir
        .canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Project".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::fetch::tests::MockStorageApi;
    use crate::domain::jobs::{Job, JobId, OperationParams};
    use crate::infrastructure::render::GuideRenderer;
    use crate::infrastructure::scanner::TransformationScanner;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    fn write_fixture(root: &Path) -> Result<()> {
        let base = root.join("main/transformation");
        let extract = base.join("keboola.ex-shopify/extract_orders");
        fs::create_dir_all(&extract)?;
        fs::write(
            extract.join("config.json"),
            r#"{"storage": {"output": {"tables": [{"destination": "out.c-shopify.orders"}]}}}"#,
        )?;

        let agg = base.join("keboola.snowflake-transformation/agg_orders");
        fs::create_dir_all(&agg)?;
        fs::write(
            agg.join("config.json"),
            r#"{"storage": {
                "input": {"tables": [{"source": "in.c-shopify.orders"}]},
                "output": {"tables": [{"destination": "out.c-shopify.daily_totals"}]}
            }}"#,
        )?;
        fs::write(agg.join("meta.json"), r#"{"name": "agg_orders"}"#)?;
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_offline() -> Result<()> {
        let dir = tempdir()?;
        write_fixture(dir.path())?;
        let renderer = GuideRenderer::new()?;

        let summary = generate_twin(
            &TransformationScanner,
            &renderer,
            None,
            dir.path(),
            &TwinConfig::default(),
        )
        .await?;

        assert_eq!(summary.tables, 2);
        assert_eq!(summary.transformations, 2);
        assert_eq!(summary.edges, 3);
        assert_eq!(summary.jobs, 0);
        assert!(summary.scan_failures.is_empty());
        assert!(summary.output_dir.join("manifest-extended.json").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_links_jobs_and_samples() -> Result<()> {
        let dir = tempdir()?;
        write_fixture(dir.path())?;
        let renderer = GuideRenderer::new()?;
        let api = MockStorageApi {
            jobs: vec![Job {
                id: JobId::Number(7),
                status: "success".into(),
                operation_params: OperationParams {
                    component_id: Some("keboola.snowflake-transformation".into()),
                    configuration_id: Some("agg_orders".into()),
                },
                created_time: Some("2024-01-15T10:00:00+0100".into()),
                start_time: Some("2024-01-15T10:00:00+0100".into()),
                end_time: Some("2024-01-15T10:00:42+0100".into()),
                ..Job::default()
            }],
            ..MockStorageApi::default()
        };

        let summary = generate_twin(
            &TransformationScanner,
            &renderer,
            Some(&api),
            dir.path(),
            &TwinConfig::default(),
        )
        .await?;
        assert_eq!(summary.jobs, 1);
        assert_eq!(summary.samples, 2);

        let out = &summary.output_dir;
        let metadata: serde_json::Value = serde_json::from_str(&fs::read_to_string(
            out.join("transformations/agg_orders/metadata.json"),
        )?)?;
        assert_eq!(metadata["job_execution"]["last_run_status"], "success");
        assert_eq!(metadata["job_execution"]["duration_seconds"], 42);

        assert!(out.join("jobs/recent/7.json").is_file());
        assert!(
            out.join("jobs/by-component/keboola.snowflake-transformation/agg_orders/latest.json")
                .is_file()
        );
        assert!(out.join("storage/samples/shopify/orders/sample.csv").is_file());

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("manifest-extended.json"))?)?;
        assert_eq!(manifest["project_id"], "42");
        assert_eq!(manifest["project_name"], "Mock Project");
        Ok(())
    }

    #[tokio::test]
    async fn test_output_outside_project_is_refused() -> Result<()> {
        let dir = tempdir()?;
        let project = dir.path().join("project");
        write_fixture(&project)?;
        let renderer = GuideRenderer::new()?;

        for output in ["../outside", "/tmp/twin-out", "."] {
            let config = TwinConfig {
                output_dir: output.to_string(),
                ..TwinConfig::default()
            };
            let result =
                generate_twin(&TransformationScanner, &renderer, None, &project, &config).await;
            assert!(matches!(result, Err(TwinError::UnsafePath(_))), "{output}");
        }
        assert!(!dir.path().join("outside").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_scan_failures_are_reported() -> Result<()> {
        let dir = tempdir()?;
        write_fixture(dir.path())?;
        let broken = dir.path().join("main/transformation/keboola.python-transformation/broken");
        fs::create_dir_all(&broken)?;
        fs::write(broken.join("config.json"), "nope")?;

        let renderer = GuideRenderer::new()?;
        let summary = generate_twin(
            &TransformationScanner,
            &renderer,
            None,
            dir.path(),
            &TwinConfig::default(),
        )
        .await?;
        assert_eq!(summary.transformations, 2);
        assert_eq!(summary.scan_failures.len(), 1);
        Ok(())
    }
}
