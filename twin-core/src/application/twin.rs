// twin-core/src/application/twin.rs
//
// Writes the twin directory. Every JSON index starts with the `_comment`,
// `_purpose` and `_update_frequency` fields so a reader can tell where the
// data comes from without opening the generator.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, instrument};

use crate::application::fetch::FetchedSample;
use crate::application::ports::TemplateEngine;
use crate::domain::jobs::{JobExecution, JobsIndex};
use crate::domain::lineage::index::{
    BucketSummary, ConnectedNode, GraphMeta, SourceRow, SourceStats, TransformationSummary,
};
use crate::domain::lineage::{GraphEdge, LineageRegistry, Platform, Table, Transformation, TwinIndex};
use crate::domain::project::TwinConfig;
use crate::domain::samples::SampleSummary;
use crate::error::TwinError;
use crate::infrastructure::fs::{atomic_write, write_json, write_jsonl, write_yaml};
use crate::infrastructure::render::{AI_GUIDE, ROOT_README};
use crate::ports::storage_api::ProjectInfo;

pub const TWIN_VERSION: u32 = 1;
pub const FORMAT_VERSION: u32 = 2;

fn re_non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\W").unwrap_or_else(|_| {
            // hardcoded pattern, kept panic-free for the clippy guard
            Regex::new("$^").unwrap_or_else(|_| unreachable!())
        })
    })
}

/// `"Daily Orders (v2)"` -> `"daily_orders__v2_"`
pub fn slug(name: &str) -> String {
    re_non_word()
        .replace_all(&name.to_lowercase(), "_")
        .into_owned()
}

/// Single path component: separators and dot-only names cannot escape the tree.
fn path_segment(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}

// ── Documentation Envelope ───────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Documented<T: Serialize> {
    #[serde(rename = "_comment")]
    pub comment: &'static str,
    #[serde(rename = "_purpose")]
    pub purpose: &'static str,
    #[serde(rename = "_update_frequency")]
    pub update_frequency: &'static str,
    #[serde(rename = "_security", skip_serializing_if = "Option::is_none")]
    pub security: Option<&'static str>,
    #[serde(rename = "_retention", skip_serializing_if = "Option::is_none")]
    pub retention: Option<&'static str>,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> Documented<T> {
    pub fn new(
        body: T,
        comment: &'static str,
        purpose: &'static str,
        update_frequency: &'static str,
    ) -> Self {
        Self {
            comment,
            purpose,
            update_frequency,
            security: None,
            retention: None,
            body,
        }
    }

    pub fn security(mut self, note: &'static str) -> Self {
        self.security = Some(note);
        self
    }

    pub fn retention(mut self, note: &'static str) -> Self {
        self.retention = Some(note);
        self
    }
}

// ── File Bodies ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct BucketsIndex<'a> {
    total_buckets: usize,
    buckets: &'a [BucketSummary],
    by_source: &'a BTreeMap<String, SourceStats>,
}

#[derive(Serialize)]
struct TableDependencies<'a> {
    consumed_by: &'a [String],
    produced_by: &'a [String],
}

#[derive(Serialize)]
struct TableMetadata<'a> {
    uid: &'a str,
    name: &'a str,
    table_id: String,
    bucket: &'a str,
    source: &'a str,
    description: &'a str,
    dependencies: TableDependencies<'a>,
}

#[derive(Serialize)]
struct TransformationsIndex<'a> {
    total_transformations: usize,
    transformations: &'a [TransformationSummary],
    by_platform: &'a BTreeMap<String, usize>,
}

#[derive(Serialize)]
struct TransformationDependencies<'a> {
    consumes: &'a [String],
    produces: &'a [String],
}

#[derive(Serialize)]
struct TransformationMetadata<'a> {
    uid: &'a str,
    name: &'a str,
    config_id: &'a str,
    component_id: &'a str,
    platform: Platform,
    is_disabled: bool,
    description: &'a str,
    original_path: &'a str,
    dependencies: TransformationDependencies<'a>,
    code_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_execution: Option<JobExecution>,
}

#[derive(Serialize)]
struct JobsSummary<'a> {
    total_jobs: usize,
    recent_jobs_count: usize,
    by_status: &'a BTreeMap<String, usize>,
    by_operation: &'a BTreeMap<String, usize>,
}

#[derive(Serialize)]
struct SamplesIndex<'a> {
    enabled: bool,
    total_samples: usize,
    samples: Vec<&'a SampleSummary>,
}

#[derive(Serialize)]
struct ComponentEntry {
    component_id: String,
    platform: Platform,
    configurations: usize,
    transformations: Vec<String>,
}

#[derive(Serialize)]
struct ComponentsIndex {
    total_components: usize,
    components: Vec<ComponentEntry>,
}

#[derive(Serialize)]
struct SourcesIndex<'a> {
    sources: &'a [SourceRow],
}

#[derive(Serialize)]
struct MostConnected<'a> {
    nodes: &'a [ConnectedNode],
}

#[derive(Serialize)]
struct GraphMetaLine<'a> {
    #[serde(rename = "_meta")]
    meta: GraphMetaBody<'a>,
}

#[derive(Serialize)]
struct GraphMetaBody<'a> {
    #[serde(flatten)]
    graph: &'a GraphMeta,
    generated_at: &'a str,
}

#[derive(Serialize)]
#[serde(untagged)]
enum GraphLine<'a> {
    Meta(GraphMetaLine<'a>),
    Edge(&'a GraphEdge),
}

#[derive(Serialize)]
struct Statistics {
    total_buckets: usize,
    total_tables: usize,
    total_transformations: usize,
    total_edges: usize,
    total_jobs: usize,
    total_samples: usize,
}

#[derive(Serialize)]
struct ManifestExtended<'a> {
    project_id: String,
    project_name: &'a str,
    twin_version: u32,
    format_version: u32,
    generated_at: &'a str,
    statistics: Statistics,
    sources: &'a [SourceRow],
    transformation_platforms: &'a BTreeMap<String, usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestSecurity {
    encrypt_secrets: bool,
    is_public_repo: bool,
    export_data_samples: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestRetention {
    jobs: usize,
    sample_rows: usize,
}

#[derive(Serialize)]
struct ManifestYaml {
    twin_version: u32,
    project_id: String,
    security: ManifestSecurity,
    retention: ManifestRetention,
}

// ── Generator ────────────────────────────────────────────────────────

/// Everything one run knows. Borrowed, the generator never mutates it.
pub struct TwinInput<'a> {
    pub registry: &'a LineageRegistry,
    pub index: &'a TwinIndex,
    pub jobs: &'a JobsIndex,
    pub samples: &'a [FetchedSample],
    pub project: Option<&'a ProjectInfo>,
    /// Used when no project metadata was fetched.
    pub project_name: &'a str,
    pub config: &'a TwinConfig,
    pub generated_at: &'a str,
}

impl TwinInput<'_> {
    fn project_id(&self) -> String {
        self.project
            .map(|p| p.project_id())
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn display_name(&self) -> &str {
        self.project
            .map(|p| p.owner.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(self.project_name)
    }
}

pub struct TwinGenerator<'r> {
    root: PathBuf,
    renderer: &'r dyn TemplateEngine,
    files_written: usize,
}

impl<'r> TwinGenerator<'r> {
    pub fn new(output_dir: &Path, renderer: &'r dyn TemplateEngine) -> Self {
        Self {
            root: output_dir.to_path_buf(),
            renderer,
            files_written: 0,
        }
    }

    /// Returns the number of files written.
    #[instrument(skip_all, fields(output = ?self.root))]
    pub fn generate(&mut self, input: &TwinInput<'_>) -> Result<usize, TwinError> {
        println!("📦 Writing buckets...");
        self.write_buckets(input)?;
        println!("🔧 Writing transformations...");
        self.write_transformations(input)?;
        println!("📜 Writing jobs...");
        self.write_jobs(input)?;
        self.write_samples(input)?;
        self.write_components(input)?;
        println!("🕸️  Writing lineage indices...");
        self.write_indices(input)?;
        self.write_root_files(input)?;

        info!(files = self.files_written, "Twin directory written");
        Ok(self.files_written)
    }

    // --- WRITERS ---

    fn json<T: Serialize + ?Sized>(&mut self, rel: &Path, value: &T) -> Result<(), TwinError> {
        write_json(self.root.join(rel), value)?;
        self.files_written += 1;
        Ok(())
    }

    fn text(&mut self, rel: &Path, content: &str) -> Result<(), TwinError> {
        atomic_write(self.root.join(rel), content)?;
        self.files_written += 1;
        Ok(())
    }

    // --- SECTIONS ---

    fn write_buckets(&mut self, input: &TwinInput<'_>) -> Result<(), TwinError> {
        let index = input.index;
        let body = BucketsIndex {
            total_buckets: index.buckets.len(),
            buckets: &index.buckets,
            by_source: &index.by_source,
        };
        self.json(
            Path::new("buckets/index.json"),
            &Documented::new(
                body,
                "Derived from storage.input/output mappings of all transformation configs",
                "Catalog of buckets with their inferred source system",
                "Every sync",
            ),
        )?;

        // "c-x" and "x" share a cleaned bucket dir; a clashing table gets the raw bucket appended
        let mut used: HashMap<String, HashSet<String>> = HashMap::new();
        for table in input.registry.tables() {
            let bucket_dir = path_segment(&table.bucket_clean);
            let taken = used.entry(bucket_dir.clone()).or_default();
            let table_dir = claim_dir(taken, path_segment(&table.name), &path_segment(&table.bucket));
            if table_dir != path_segment(&table.name) {
                debug!(table = %table.uid, dir = %table_dir, "Table directory renamed on collision");
            }
            self.write_table(table, &bucket_dir, &table_dir)?;
        }
        Ok(())
    }

    fn write_table(
        &mut self,
        table: &Table,
        bucket_dir: &str,
        table_dir: &str,
    ) -> Result<(), TwinError> {
        let rel = PathBuf::from("buckets")
            .join(bucket_dir)
            .join("tables")
            .join(table_dir)
            .join("metadata.json");

        let body = TableMetadata {
            uid: &table.uid,
            name: &table.name,
            table_id: table.storage_id(),
            bucket: &table.bucket,
            source: &table.source,
            description: &table.description,
            dependencies: TableDependencies {
                consumed_by: &table.consumed_by,
                produced_by: &table.produced_by,
            },
        };
        self.json(
            &rel,
            &Documented::new(
                body,
                "Table entity consolidated from every transformation that references it",
                "Table lineage: which transformations read and write it",
                "Every sync",
            ),
        )
    }

    fn write_transformations(&mut self, input: &TwinInput<'_>) -> Result<(), TwinError> {
        let index = input.index;
        let body = TransformationsIndex {
            total_transformations: index.transformations.len(),
            transformations: &index.transformations,
            by_platform: &index.by_platform,
        };
        self.json(
            Path::new("transformations/index.json"),
            &Documented::new(
                body,
                "Scanned from {branch}/transformation/*/*/config.json",
                "All transformations with platform and input/output counts",
                "Every sync",
            ),
        )?;

        let mut used_dirs: HashSet<String> = HashSet::new();
        for transformation in input.registry.transformations() {
            let dir = unique_dir(&mut used_dirs, transformation);
            self.write_transformation(input, transformation, &dir)?;
        }
        Ok(())
    }

    fn write_transformation(
        &mut self,
        input: &TwinInput<'_>,
        t: &Transformation,
        dir: &str,
    ) -> Result<(), TwinError> {
        let base = PathBuf::from("transformations").join(dir);

        let mut code_files = Vec::new();
        let codes = t.blocks.iter().flat_map(|b| b.codes.iter());
        for (n, code) in codes.enumerate() {
            let ext = match code.language.as_str() {
                "python" => "py",
                "r" => "r",
                _ => "sql",
            };
            let name = slug(&code.name);
            let file = format!("{:02}-{}.{}", n + 1, name, ext);
            self.text(&base.join("code").join(&file), &code.script)?;
            code_files.push(format!("code/{}", file));
        }

        let body = TransformationMetadata {
            uid: &t.uid,
            name: &t.name,
            config_id: &t.config_id,
            component_id: &t.component_id,
            platform: t.platform,
            is_disabled: t.is_disabled,
            description: &t.description,
            original_path: &t.original_path,
            dependencies: TransformationDependencies {
                consumes: &t.inputs,
                produces: &t.outputs,
            },
            code_files,
            job_execution: input.jobs.execution_for(&t.component_id, &t.config_id),
        };
        self.json(
            &base.join("metadata.json"),
            &Documented::new(
                body,
                "config.json + meta.json + description.md + blocks/ of one configuration",
                "Transformation details, dependencies and last execution",
                "On configuration change",
            ),
        )
    }

    fn write_jobs(&mut self, input: &TwinInput<'_>) -> Result<(), TwinError> {
        let jobs = input.jobs;
        let body = JobsSummary {
            total_jobs: jobs.total_jobs,
            recent_jobs_count: jobs.recent.len(),
            by_status: &jobs.by_status,
            by_operation: &jobs.by_operation,
        };
        self.json(
            Path::new("jobs/index.json"),
            &Documented::new(
                body,
                "GET /v2/storage/jobs?limit=N + aggregate statistics",
                "Job execution statistics and summary",
                "Every hour or on job completion",
            ),
        )?;

        for job in &jobs.recent {
            let rel = PathBuf::from("jobs/recent").join(format!("{}.json", path_segment(&job.id)));
            self.json(
                &rel,
                &Documented::new(
                    job,
                    "GET /v2/storage/jobs + computed duration",
                    "Job execution details for debugging and analysis",
                    "On job completion",
                )
                .retention("Keep the last fetched jobs only"),
            )?;
        }

        for component in &jobs.by_component {
            let rel = PathBuf::from("jobs/by-component")
                .join(path_segment(&component.component_id))
                .join(path_segment(&component.configuration_id))
                .join("latest.json");
            self.json(
                &rel,
                &Documented::new(
                    component,
                    "Aggregate from jobs list for this component+config",
                    "Latest job status per component configuration",
                    "On job completion for this component",
                ),
            )?;
        }
        Ok(())
    }

    fn write_samples(&mut self, input: &TwinInput<'_>) -> Result<(), TwinError> {
        let enabled = input.config.security.samples_allowed();
        let body = SamplesIndex {
            enabled,
            total_samples: input.samples.len(),
            samples: input.samples.iter().map(|s| &s.summary).collect(),
        };
        self.json(
            Path::new("storage/samples/index.json"),
            &Documented::new(
                body,
                "GET /v2/storage/tables/{table_id}/data-preview for the first tables",
                "Small data previews to understand table contents",
                "Every sync",
            )
            .security("Never exported for public repositories"),
        )?;

        for sample in input.samples {
            let base = PathBuf::from("storage/samples")
                .join(path_segment(&sample.bucket_clean))
                .join(path_segment(&sample.summary.table));
            self.text(&base.join("sample.csv"), &sample.csv)?;
            self.json(
                &base.join("metadata.json"),
                &Documented::new(
                    &sample.summary,
                    "Computed from the preview CSV header",
                    "Columns and row count of the sample",
                    "Every sync",
                )
                .security("Contains real data, keep the repository private"),
            )?;
        }
        debug!(count = input.samples.len(), "Samples written");
        Ok(())
    }

    fn write_components(&mut self, input: &TwinInput<'_>) -> Result<(), TwinError> {
        let mut grouped: BTreeMap<&str, Vec<&Transformation>> = BTreeMap::new();
        for t in input.registry.transformations() {
            grouped.entry(t.component_id.as_str()).or_default().push(t);
        }

        let components: Vec<ComponentEntry> = grouped
            .into_iter()
            .map(|(component_id, transformations)| ComponentEntry {
                component_id: component_id.to_string(),
                platform: Platform::detect(component_id),
                configurations: transformations.len(),
                transformations: transformations.iter().map(|t| t.uid.clone()).collect(),
            })
            .collect();

        let body = ComponentsIndex {
            total_components: components.len(),
            components,
        };
        self.json(
            Path::new("components/index.json"),
            &Documented::new(
                body,
                "Grouped from the component directories of the export",
                "Components in use and their configurations",
                "On configuration change",
            ),
        )
    }

    fn write_indices(&mut self, input: &TwinInput<'_>) -> Result<(), TwinError> {
        let index = input.index;

        let meta = GraphLine::Meta(GraphMetaLine {
            meta: GraphMetaBody {
                graph: &index.graph,
                generated_at: input.generated_at,
            },
        });
        let lines = std::iter::once(meta).chain(input.registry.edges().iter().map(GraphLine::Edge));
        write_jsonl(self.root.join("indices/graph.jsonl"), lines)?;
        self.files_written += 1;

        self.json(
            Path::new("indices/sources.json"),
            &Documented::new(
                SourcesIndex {
                    sources: &index.sources,
                },
                "Inferred from bucket names, falling back to the reference stage",
                "Registry of data sources and the buckets they feed",
                "Every sync",
            ),
        )?;

        self.json(
            Path::new("indices/queries/tables-by-source.json"),
            &Documented::new(
                &index.tables_by_source,
                "Pre-computed: tables grouped by inferred source",
                "Answer 'which tables come from X' without scanning buckets/",
                "Every sync",
            ),
        )?;

        self.json(
            Path::new("indices/queries/transformations-by-platform.json"),
            &Documented::new(
                &index.transformations_by_platform,
                "Pre-computed: transformations grouped by platform",
                "Answer 'which transformations run on X'",
                "Every sync",
            ),
        )?;

        self.json(
            Path::new("indices/queries/most-connected-nodes.json"),
            &Documented::new(
                MostConnected {
                    nodes: &index.most_connected,
                },
                "Pre-computed: top 50 nodes by number of lineage connections",
                "Find the critical tables and transformations of the project",
                "Every sync",
            ),
        )
    }

    fn write_root_files(&mut self, input: &TwinInput<'_>) -> Result<(), TwinError> {
        let index = input.index;
        let statistics = Statistics {
            total_buckets: index.buckets.len(),
            total_tables: index.graph.tables,
            total_transformations: index.graph.transformations,
            total_edges: index.graph.total_edges,
            total_jobs: input.jobs.total_jobs,
            total_samples: input.samples.len(),
        };

        let manifest = ManifestExtended {
            project_id: input.project_id(),
            project_name: input.display_name(),
            twin_version: TWIN_VERSION,
            format_version: FORMAT_VERSION,
            generated_at: input.generated_at,
            statistics,
            sources: &index.sources,
            transformation_platforms: &index.by_platform,
        };
        self.json(
            Path::new("manifest-extended.json"),
            &Documented::new(
                manifest,
                "GET /v2/storage/tokens/verify + computed statistics",
                "Complete project overview in one file",
                "Every sync",
            ),
        )?;

        let security = &input.config.security;
        let manifest_yaml = ManifestYaml {
            twin_version: TWIN_VERSION,
            project_id: input.project_id(),
            security: ManifestSecurity {
                encrypt_secrets: true,
                is_public_repo: security.is_public_repo,
                export_data_samples: security.export_data_samples,
            },
            retention: ManifestRetention {
                jobs: input.config.api.jobs_limit,
                sample_rows: input.config.api.sample_rows,
            },
        };
        write_yaml(self.root.join("manifest.yaml"), &manifest_yaml)?;
        self.files_written += 1;

        let context = guide_context(input);
        let readme = self.renderer.render(ROOT_README, &context)?;
        self.text(Path::new("README.md"), &readme)?;
        let guide = self.renderer.render(AI_GUIDE, &context)?;
        self.text(Path::new("ai/README.md"), &guide)?;
        Ok(())
    }
}

/// Lower-cased display name; a later transformation with the same name gets
/// its config id appended.
fn unique_dir(used: &mut HashSet<String>, t: &Transformation) -> String {
    let mut dir = slug(&t.name);
    if dir.is_empty() {
        dir = slug(&t.config_id);
    }
    claim_dir(used, dir, &slug(&t.config_id))
}

/// Claims `base`, else `{base}_{suffix}`, else the first free `{base}_{suffix}_{n}`.
fn claim_dir(used: &mut HashSet<String>, base: String, suffix: &str) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let fallback = format!("{}_{}", base, suffix);
    let mut candidate = fallback.clone();
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{}_{}", fallback, n);
        n += 1;
    }
    candidate
}

/// Template context. The API token is deliberately absent.
fn guide_context(input: &TwinInput<'_>) -> serde_json::Value {
    let mut platforms: Vec<(&String, &usize)> = input.index.by_platform.iter().collect();
    platforms.sort_by(|a, b| b.1.cmp(a.1));

    serde_json::json!({
        "project": {
            "id": input.project_id(),
            "name": input.display_name(),
            "region": input
                .project
                .and_then(|p| p.owner.region.clone())
                .unwrap_or_else(|| "unknown".to_string()),
        },
        "stats": {
            "total_tables": input.index.graph.tables,
            "total_transformations": input.index.graph.transformations,
            "total_buckets": input.index.buckets.len(),
            "total_sources": input.index.graph.sources,
            "total_jobs": input.jobs.total_jobs,
            "total_samples": input.samples.len(),
        },
        "platforms": platforms
            .into_iter()
            .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
            .collect::<Vec<_>>(),
        "api": {
            "base_url": input.config.api.base_url,
            "jobs_limit": input.config.api.jobs_limit,
            "sample_rows": input.config.api.sample_rows,
        },
    })
}
