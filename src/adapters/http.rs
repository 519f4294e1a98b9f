use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;

use crate::domain::model::LoanApplication;
use crate::domain::ports::ApplicationStore;
use crate::domain::wire::{
    ListQuery, ListResponse, StatusUpdate, StatusUpdateAck, SubmissionReceipt, SubmissionRequest,
};
use crate::utils::error::{LoanDeskError, Result};
use crate::utils::validation::validate_url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Application store reached over HTTP. One endpoint serves all three
/// operations, distinguished by method: POST submits, GET lists, PUT updates.
#[derive(Debug, Clone)]
pub struct HttpApplicationStore {
    client: Client,
    endpoint: String,
}

impl HttpApplicationStore {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, None)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = endpoint.into();
        validate_url("store.endpoint", &endpoint)?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        tracing::debug!("Health check against {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("test", "health")])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

/// Any non-2xx answer becomes `RemoteStatus`, carrying the body for logs.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    tracing::debug!("Store response status: {}", status);
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LoanDeskError::RemoteStatus {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ApplicationStore for HttpApplicationStore {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionReceipt> {
        tracing::debug!("POST {}", self.endpoint);
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<LoanApplication>> {
        let pairs = query.to_query_pairs();
        tracing::debug!("GET {} {:?}", self.endpoint, pairs);
        let response = self.client.get(&self.endpoint).query(&pairs).send().await?;
        let response = ensure_success(response).await?;
        let listing: ListResponse = response.json().await?;
        Ok(listing.applications)
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<()> {
        tracing::debug!("PUT {} id={} status={}", self.endpoint, update.id, update.status);
        let response = self.client.put(&self.endpoint).json(update).send().await?;
        let response = ensure_success(response).await?;

        // The body is advisory; only an explicit `success: false` is a failure.
        let body = response.text().await?;
        match serde_json::from_str::<StatusUpdateAck>(&body) {
            Ok(ack) if !ack.success => Err(LoanDeskError::UnknownApplication { id: update.id }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_endpoint() {
        assert!(HttpApplicationStore::new("not a url").is_err());
        assert!(HttpApplicationStore::new("ftp://example.com/apps").is_err());
        assert!(HttpApplicationStore::new("https://example.com/apps").is_ok());
    }

    #[test]
    fn test_health_status() {
        let health: HealthStatus =
            serde_json::from_str(r#"{"status": "healthy", "service": "loan-applications"}"#)
                .unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.service.as_deref(), Some("loan-applications"));
    }
}
