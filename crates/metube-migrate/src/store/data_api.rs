//! MongoDB Data API store.
//!
//! Talks to the REST endpoint of the Data API so the tool needs no native
//! MongoDB driver. Clearing a collection is a `deleteMany` with an empty
//! filter; loading is a series of `insertMany` calls.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::common::{create_http_client, handle_http_error, validate_url};
use super::DocumentStore;
use crate::config::DataApiTarget;
use crate::error::{Error, Result};
use crate::retry::{with_retry, RetryConfig};

/// Documents sent per `insertMany` request.
pub const DEFAULT_INSERT_BATCH: usize = 1000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteManyRequest<'a> {
    data_source: &'a str,
    database: &'a str,
    collection: &'a str,
    filter: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteManyResponse {
    deleted_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertManyRequest<'a> {
    data_source: &'a str,
    database: &'a str,
    collection: &'a str,
    documents: &'a [Value],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertManyResponse {
    inserted_ids: Vec<Value>,
}

/// Store backed by the MongoDB Data API.
pub struct DataApiStore {
    target: DataApiTarget,
    client: Client,
    retry: RetryConfig,
    batch_size: usize,
}

impl DataApiStore {
    /// Creates a store for `target`.
    pub fn new(target: DataApiTarget) -> Self {
        Self {
            target,
            client: create_http_client(),
            retry: RetryConfig::default(),
            batch_size: DEFAULT_INSERT_BATCH,
        }
    }

    /// Overrides the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Overrides the number of documents per request.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn build_url(&self, action: &str) -> String {
        format!("{}/action/{}", self.target.url.trim_end_matches('/'), action)
    }

    async fn api_request<T: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        body: &T,
    ) -> Result<R> {
        validate_url(&self.target.url)?;
        let response = self
            .client
            .post(self.build_url(action))
            .header("Content-Type", "application/json")
            .header("api-key", &self.target.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(handle_http_error(status.as_u16(), &body, "Data API"));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Store(format!("Failed to parse Data API response: {}", e)))
    }
}

#[async_trait]
impl DocumentStore for DataApiStore {
    fn store_type(&self) -> &'static str {
        "data_api"
    }

    async fn clear(&self, collection: &str) -> Result<()> {
        let request = DeleteManyRequest {
            data_source: &self.target.data_source,
            database: &self.target.database,
            collection,
            filter: serde_json::json!({}),
        };
        let response: DeleteManyResponse = with_retry(&self.retry, "deleteMany", || {
            self.api_request("deleteMany", &request)
        })
        .await?;
        debug!("Cleared {} documents from {}", response.deleted_count, collection);
        Ok(())
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> Result<u64> {
        let mut inserted = 0;
        for chunk in documents.chunks(self.batch_size) {
            let request = InsertManyRequest {
                data_source: &self.target.data_source,
                database: &self.target.database,
                collection,
                documents: chunk,
            };
            let response: InsertManyResponse = with_retry(&self.retry, "insertMany", || {
                self.api_request("insertMany", &request)
            })
            .await?;
            inserted += response.inserted_ids.len() as u64;
        }
        Ok(inserted)
    }
}

#[cfg(test)]
#[path = "data_api_tests.rs"]
mod tests;
