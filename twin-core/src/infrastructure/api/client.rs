// twin-core/src/infrastructure/api/client.rs

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::domain::jobs::Job;
use crate::error::TwinError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::storage_api::{ProjectInfo, StorageApi};

pub const TOKEN_HEADER: &str = "X-StorageApi-Token";

/// Storage API over HTTPS. Requests are sent one at a time by the caller.
pub struct StorageApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl StorageApiClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, TwinError> {
        let client = Client::builder()
            .user_agent(concat!("twin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(InfrastructureError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn get_text(&self, endpoint: &str) -> Result<String, TwinError> {
        debug!(endpoint, "GET");
        let response = self
            .client
            .get(self.url(endpoint))
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(InfrastructureError::Http)?
            .error_for_status()
            .map_err(InfrastructureError::Http)?;

        let text = response.text().await.map_err(InfrastructureError::Http)?;
        Ok(text)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, TwinError> {
        let text = self.get_text(endpoint).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl StorageApi for StorageApiClient {
    #[instrument(skip(self))]
    async fn verify_token(&self) -> Result<ProjectInfo, TwinError> {
        self.get_json("/v2/storage/tokens/verify").await
    }

    #[instrument(skip(self))]
    async fn list_jobs(&self, limit: usize) -> Result<Vec<Job>, TwinError> {
        self.get_json(&format!("/v2/storage/jobs?limit={}", limit))
            .await
    }

    #[instrument(skip(self))]
    async fn table_preview(&self, table_id: &str, limit: usize) -> Result<String, TwinError> {
        self.get_text(&format!(
            "/v2/storage/tables/{}/data-preview?limit={}",
            table_id, limit
        ))
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = StorageApiClient::new("https://connection.keboola.com/", "token").unwrap();
        assert_eq!(
            client.url("/v2/storage/tokens/verify"),
            "https://connection.keboola.com/v2/storage/tokens/verify"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_http_error() {
        // port 9 (discard) on localhost is closed in test environments
        let client = StorageApiClient::new("http://127.0.0.1:9", "token").unwrap();
        let err = client.verify_token().await.unwrap_err();
        assert!(matches!(
            err,
            TwinError::Infrastructure(InfrastructureError::Http(_))
        ));
    }
}
