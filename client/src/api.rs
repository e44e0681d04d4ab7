//! HTTP client for the remote transaction store.
//!
//! The store speaks query-string action dispatch: `?action=get` for the
//! full snapshot, `?action=save|delete|addCategory` for writes. Bodies go
//! out as `text/plain` JSON - the content type the spreadsheet-era
//! deployment required - and every response is a 200 whose `status` field
//! carries the real outcome.

use crate::sync::{RemoteSnapshot, RemoteStore, SyncError};
use reqwest::header::CONTENT_TYPE;
use shared::{AddCategoryRequest, SnapshotResponse, StatusResponse, Transaction, TransactionKind};

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    async fn post_action(&self, url: String, body: String) -> Result<(), SyncError> {
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let status: StatusResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Malformed(e.to_string()))?;
        if !status.is_success() {
            return Err(SyncError::Remote(
                status.message.unwrap_or_else(|| "unspecified error".to_string()),
            ));
        }
        Ok(())
    }
}

impl RemoteStore for ApiClient {
    async fn fetch_all(&self) -> Result<RemoteSnapshot, SyncError> {
        let url = format!("{}?action=get", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let snapshot: SnapshotResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Malformed(e.to_string()))?;
        if !snapshot.is_success() {
            return Err(SyncError::Remote(
                snapshot
                    .message
                    .unwrap_or_else(|| "unspecified error".to_string()),
            ));
        }

        Ok(RemoteSnapshot {
            transactions: snapshot.transactions,
            categories: snapshot.categories,
        })
    }

    async fn save(&self, transaction: &Transaction) -> Result<(), SyncError> {
        let url = format!("{}?action=save", self.base_url);
        let body = serde_json::to_string(transaction)
            .map_err(|e| SyncError::Malformed(e.to_string()))?;
        self.post_action(url, body).await
    }

    async fn delete(&self, id: &str) -> Result<(), SyncError> {
        let url = format!("{}?action=delete&id={}", self.base_url, id);
        self.post_action(url, String::new()).await
    }

    async fn add_category(&self, kind: TransactionKind, name: &str) -> Result<(), SyncError> {
        let url = format!("{}?action=addCategory", self.base_url);
        let request = AddCategoryRequest {
            kind,
            name: name.to_string(),
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| SyncError::Malformed(e.to_string()))?;
        self.post_action(url, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_urls() {
        let client = ApiClient::new("http://localhost:3000/");
        // Query-string dispatch hangs off the base URL unchanged.
        assert_eq!(
            format!("{}?action=get", client.base_url),
            "http://localhost:3000/?action=get"
        );
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_a_network_error() {
        // Nothing listens on this port.
        let client = ApiClient::new("http://127.0.0.1:59999/");
        let result = client.fetch_all().await;
        assert!(matches!(result, Err(SyncError::Network(_))));
    }
}
