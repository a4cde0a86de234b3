// twin-core/src/application/fetch.rs
//
// Remote part of a generation run: project metadata, job history and a few
// table previews. Calls are awaited one after another.

use tracing::{info, instrument, warn};

use crate::domain::jobs::Job;
use crate::domain::lineage::LineageRegistry;
use crate::domain::project::TwinConfig;
use crate::domain::samples::SampleSummary;
use crate::error::TwinError;
use crate::ports::storage_api::{ProjectInfo, StorageApi};

#[derive(Debug, Clone)]
pub struct FetchedSample {
    pub summary: SampleSummary,
    /// Cleaned bucket name, used for the output path.
    pub bucket_clean: String,
    pub csv: String,
}

#[derive(Debug, Default, Clone)]
pub struct RemoteData {
    pub project: Option<ProjectInfo>,
    pub jobs: Vec<Job>,
    pub samples: Vec<FetchedSample>,
}

/// Metadata and job failures abort the run; a failed preview only skips that table.
#[instrument(skip_all)]
pub async fn fetch_remote(
    api: &dyn StorageApi,
    registry: &LineageRegistry,
    config: &TwinConfig,
) -> Result<RemoteData, TwinError> {
    println!("🔑 Verifying Storage API token...");
    let project = api.verify_token().await?;
    info!(project = %project.owner.name, "Token verified");

    println!("📜 Fetching last {} jobs...", config.api.jobs_limit);
    let jobs = api.list_jobs(config.api.jobs_limit).await?;
    info!(count = jobs.len(), "Jobs fetched");

    let samples = if config.security.samples_allowed() {
        fetch_samples(api, registry, config).await
    } else {
        info!("Sample export disabled by security settings");
        Vec::new()
    };

    Ok(RemoteData {
        project: Some(project),
        jobs,
        samples,
    })
}

async fn fetch_samples(
    api: &dyn StorageApi,
    registry: &LineageRegistry,
    config: &TwinConfig,
) -> Vec<FetchedSample> {
    let mut samples = Vec::new();

    for table in registry.tables().iter().take(config.api.max_samples) {
        let table_id = table.storage_id();
        match api.table_preview(&table_id, config.api.sample_rows).await {
            Ok(csv) => {
                println!("   📥 Sample: {}", table_id);
                samples.push(FetchedSample {
                    summary: SampleSummary::from_csv(&table_id, &table.bucket, &table.name, &csv),
                    bucket_clean: table.bucket_clean.clone(),
                    csv,
                });
            }
            Err(e) => {
                warn!(table = %table_id, error = %e, "Could not fetch sample, skipping");
            }
        }
    }

    samples
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::jobs::JobId;
    use crate::domain::lineage::TransformationRecord;
    use crate::ports::storage_api::ProjectOwner;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory Storage API. Previews of tables listed in `failing` error out.
    #[derive(Default)]
    pub struct MockStorageApi {
        pub jobs: Vec<Job>,
        pub failing: Vec<String>,
        pub fail_verify: bool,
        pub preview_calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StorageApi for MockStorageApi {
        async fn verify_token(&self) -> Result<ProjectInfo, TwinError> {
            if self.fail_verify {
                return Err(DomainError::ApiError("invalid token".into()).into());
            }
            Ok(ProjectInfo {
                owner: ProjectOwner {
                    id: serde_json::json!(42),
                    name: "Mock Project".into(),
                    region: Some("eu-central-1".into()),
                },
            })
        }

        async fn list_jobs(&self, limit: usize) -> Result<Vec<Job>, TwinError> {
            Ok(self.jobs.iter().take(limit).cloned().collect())
        }

        async fn table_preview(&self, table_id: &str, _limit: usize) -> Result<String, TwinError> {
            self.preview_calls.lock().unwrap().push(table_id.to_string());
            if self.failing.iter().any(|t| t == table_id) {
                return Err(DomainError::ApiError(format!("404 {}", table_id)).into());
            }
            Ok("\"id\",\"value\"\n\"1\",\"a\"\n".to_string())
        }
    }

    fn registry() -> LineageRegistry {
        let record = TransformationRecord {
            name: "t".into(),
            component_id: "keboola.snowflake-transformation".into(),
            inputs: vec!["in.c-a.one".into(), "in.c-a.two".into(), "in.c-b.three".into()],
            ..TransformationRecord::default()
        };
        LineageRegistry::from_records([&record])
    }

    #[tokio::test]
    async fn test_samples_limited_and_failures_skipped() {
        let api = MockStorageApi {
            failing: vec!["in.c-a.one".into()],
            jobs: vec![Job {
                id: JobId::Number(1),
                status: "success".into(),
                ..Job::default()
            }],
            ..MockStorageApi::default()
        };
        let mut config = TwinConfig::default();
        config.api.max_samples = 2;

        let remote = fetch_remote(&api, &registry(), &config).await.unwrap();
        assert_eq!(remote.jobs.len(), 1);
        assert_eq!(remote.project.unwrap().project_id(), "42");
        assert_eq!(
            *api.preview_calls.lock().unwrap(),
            vec!["in.c-a.one".to_string(), "in.c-a.two".to_string()]
        );
        assert_eq!(remote.samples.len(), 1);
        assert_eq!(remote.samples[0].summary.table, "two");
        assert_eq!(remote.samples[0].bucket_clean, "a");
        assert_eq!(remote.samples[0].summary.row_count, 1);
    }

    #[tokio::test]
    async fn test_public_repo_never_fetches_samples() {
        let api = MockStorageApi::default();
        let mut config = TwinConfig::default();
        config.security.is_public_repo = true;

        let remote = fetch_remote(&api, &registry(), &config).await.unwrap();
        assert!(remote.samples.is_empty());
        assert!(api.preview_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verify_failure_aborts() {
        let api = MockStorageApi {
            fail_verify: true,
            ..MockStorageApi::default()
        };
        let result = fetch_remote(&api, &registry(), &TwinConfig::default()).await;
        assert!(matches!(result, Err(TwinError::Domain(DomainError::ApiError(_)))));
    }
}
