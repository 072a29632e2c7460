//! Bulk delivery of collected records to the storage API

use crate::config::SinkConfig;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors that can occur while delivering records
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP error posting to storage API: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage API rejected upload with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Table-specific flag sent alongside the records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadDirective {
    /// `"ignoreDuplicates": 1`; re-runs may resend reviews already stored
    IgnoreDuplicates,
    /// `"database": <name>`
    Database(String),
}

/// Successful delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub table: String,
    pub records: usize,
}

/// Client for the storage API's bulk insert endpoint
#[derive(Debug, Clone)]
pub struct SinkClient {
    client: Client,
    config: SinkConfig,
}

impl SinkClient {
    pub fn new(client: Client, config: SinkConfig) -> Self {
        Self { client, config }
    }

    /// Posts all records in one request
    ///
    /// Body: `{"data": [...], "tableName": <table>, <directive>}`. Only HTTP
    /// 201 counts as success.
    pub async fn deliver<T: Serialize>(
        &self,
        records: &[T],
        table: &str,
        directive: &UploadDirective,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let body = upload_body(records, table, directive)?;

        let mut request = self.client.post(self.config.url.as_str()).json(&body);
        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        tracing::info!("Posting {} records to table {}", records.len(), table);
        let response = request.send().await?;
        let status = response.status();

        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(DeliveryReceipt {
            table: table.to_string(),
            records: records.len(),
        })
    }
}

/// Builds the bulk upload body
pub(crate) fn upload_body<T: Serialize>(
    records: &[T],
    table: &str,
    directive: &UploadDirective,
) -> Result<Value, serde_json::Error> {
    let mut body = json!({
        "data": serde_json::to_value(records)?,
        "tableName": table,
    });

    match directive {
        UploadDirective::IgnoreDuplicates => body["ignoreDuplicates"] = json!(1),
        UploadDirective::Database(name) => body["database"] = json!(name),
    }

    Ok(body)
}
