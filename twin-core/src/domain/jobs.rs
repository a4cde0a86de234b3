// twin-core/src/domain/jobs.rs
//
// Aggregation of the job history returned by the Storage API.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// The API returns numeric ids on older stacks and strings on newer ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobId {
    Number(u64),
    Text(String),
}

impl Default for JobId {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationParams {
    #[serde(default)]
    pub component_id: Option<String>,
    #[serde(default)]
    pub configuration_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub operation_params: OperationParams,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub metrics: Option<serde_json::Value>,
    #[serde(default)]
    pub result: Option<JobResult>,
}

impl Job {
    /// Whole seconds between start (or creation) and end (or creation).
    pub fn duration_seconds(&self) -> Option<i64> {
        let created = self.created_time.as_deref();
        let start = parse_timestamp(self.start_time.as_deref().or(created)?)?;
        let end = parse_timestamp(self.end_time.as_deref().or(created)?)?;
        Some((end - start).num_seconds())
    }

    fn completion_time(&self) -> Option<DateTime<FixedOffset>> {
        self.end_time
            .as_deref()
            .or(self.created_time.as_deref())
            .and_then(parse_timestamp)
    }

    fn error_message(&self) -> Option<String> {
        if self.status != STATUS_ERROR {
            return None;
        }
        self.result
            .as_ref()
            .and_then(|r| r.message.clone())
            .filter(|m| !m.is_empty())
    }
}

/// RFC 3339, or the compact `+0100` offset form the queue emits.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    pub id: String,
    pub run_id: Option<String>,
    pub status: String,
    pub operation_name: Option<String>,
    pub operation_params: OperationParams,
    pub created_time: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration_seconds: Option<i64>,
    pub metrics: serde_json::Value,
}

impl From<&Job> for JobDetail {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.to_string(),
            run_id: job.run_id.clone(),
            status: job.status.clone(),
            operation_name: job.operation_name.clone(),
            operation_params: job.operation_params.clone(),
            created_time: job.created_time.clone(),
            start_time: job.start_time.clone(),
            end_time: job.end_time.clone(),
            duration_seconds: job.duration_seconds(),
            metrics: job
                .metrics
                .clone()
                .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentJobs {
    pub component_id: String,
    pub configuration_id: String,
    pub latest_job_id: String,
    pub latest_job_status: String,
    pub latest_job_time: Option<String>,
    pub success_count: usize,
    pub error_count: usize,
    #[serde(skip)]
    latest_start_time: Option<String>,
    #[serde(skip)]
    latest_duration: Option<i64>,
    #[serde(skip)]
    latest_error: Option<String>,
}

/// Last-run summary attached to a transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobExecution {
    pub last_run_time: Option<String>,
    pub last_run_status: String,
    pub job_reference: String,
    pub duration_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct JobsIndex {
    pub total_jobs: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_operation: BTreeMap<String, usize>,
    pub recent: Vec<JobDetail>,
    /// Sorted by (component, configuration).
    pub by_component: Vec<ComponentJobs>,
}

impl JobsIndex {
    pub fn build(jobs: &[Job], recent_limit: usize) -> Self {
        let mut by_status = BTreeMap::new();
        let mut by_operation = BTreeMap::new();
        for job in jobs {
            *by_status.entry(job.status.clone()).or_insert(0) += 1;
            let operation = job
                .operation_name
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            *by_operation.entry(operation).or_insert(0) += 1;
        }

        let recent = jobs.iter().take(recent_limit).map(JobDetail::from).collect();

        let mut grouped: BTreeMap<(String, String), Vec<&Job>> = BTreeMap::new();
        for job in jobs {
            let params = &job.operation_params;
            if let (Some(component), Some(config)) =
                (params.component_id.as_ref(), params.configuration_id.as_ref())
            {
                grouped
                    .entry((component.clone(), config.clone()))
                    .or_default()
                    .push(job);
            }
        }

        let by_component = grouped
            .into_iter()
            .filter_map(|((component_id, configuration_id), group)| {
                let latest = latest_job(&group)?;
                Some(ComponentJobs {
                    component_id,
                    configuration_id,
                    latest_job_id: latest.id.to_string(),
                    latest_job_status: latest.status.clone(),
                    latest_job_time: latest.end_time.clone(),
                    success_count: group.iter().filter(|j| j.status == STATUS_SUCCESS).count(),
                    error_count: group.iter().filter(|j| j.status == STATUS_ERROR).count(),
                    latest_start_time: latest.start_time.clone(),
                    latest_duration: latest.duration_seconds(),
                    latest_error: latest.error_message(),
                })
            })
            .collect();

        Self {
            total_jobs: jobs.len(),
            by_status,
            by_operation,
            recent,
            by_component,
        }
    }

    pub fn execution_for(&self, component_id: &str, configuration_id: &str) -> Option<JobExecution> {
        self.by_component
            .iter()
            .find(|c| c.component_id == component_id && c.configuration_id == configuration_id)
            .map(|c| JobExecution {
                last_run_time: c.latest_start_time.clone(),
                last_run_status: c.latest_job_status.clone(),
                job_reference: c.latest_job_id.clone(),
                duration_seconds: c.latest_duration,
                last_error: c.latest_error.clone(),
            })
    }
}

/// First job with the greatest completion time. Unparsable times rank lowest.
fn latest_job<'a>(group: &[&'a Job]) -> Option<&'a Job> {
    let mut best: Option<(&'a Job, Option<DateTime<FixedOffset>>)> = None;
    for &job in group {
        let time = job.completion_time();
        match &best {
            Some((_, best_time)) if time <= *best_time => {}
            _ => best = Some((job, time)),
        }
    }
    best.map(|(job, _)| job)
}
