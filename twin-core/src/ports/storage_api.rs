// twin-core/src/ports/storage_api.rs

// What the generator needs from the platform, without knowing it is HTTP.

use crate::domain::jobs::Job;
use crate::error::TwinError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Owner block of the token verification response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectOwner {
    pub id: serde_json::Value,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub owner: ProjectOwner,
}

impl ProjectInfo {
    pub fn project_id(&self) -> String {
        match &self.owner.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
pub trait StorageApi: Send + Sync {
    /// `GET /v2/storage/tokens/verify`
    async fn verify_token(&self) -> Result<ProjectInfo, TwinError>;

    /// `GET /v2/storage/jobs?limit=N`, newest first.
    async fn list_jobs(&self, limit: usize) -> Result<Vec<Job>, TwinError>;

    /// CSV text of the first `limit` rows.
    async fn table_preview(&self, table_id: &str, limit: usize) -> Result<String, TwinError>;
}
