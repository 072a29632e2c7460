//! Restaurant registry client
//!
//! The registry is an external database API that answers a query with the
//! list of competitor restaurants to crawl. It is read once at the start of
//! every run.

use crate::config::RegistryConfig;
use crate::model::RestaurantRef;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors that can occur while reading the registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP error querying registry: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registry returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected registry payload: {0}")]
    Payload(String),
}

/// Client for the restaurant registry query API
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    config: RegistryConfig,
}

impl RegistryClient {
    pub fn new(client: Client, config: RegistryConfig) -> Self {
        Self { client, config }
    }

    /// Runs the configured query and returns the crawlable restaurants
    ///
    /// Sends `{"query": <query>}` and expects a JSON array of rows. Rows that
    /// are not objects or have no `res_id` are skipped with a warning.
    pub async fn fetch_restaurants(&self) -> Result<Vec<RestaurantRef>, RegistryError> {
        let mut request = self
            .client
            .post(self.config.url.as_str())
            .json(&json!({ "query": self.config.query }));
        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let restaurants = parse_registry_rows(&body)?;
        tracing::info!("Registry returned {} restaurants", restaurants.len());
        Ok(restaurants)
    }
}

/// Parses the registry response body into restaurant references
pub fn parse_registry_rows(body: &str) -> Result<Vec<RestaurantRef>, RegistryError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| RegistryError::Payload(format!("invalid JSON: {}", e)))?;

    let rows = payload
        .as_array()
        .ok_or_else(|| RegistryError::Payload("expected a list of rows".to_string()))?;

    let mut restaurants = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        if !row.is_object() {
            tracing::warn!("Skipping registry row {}: not an object", index);
            continue;
        }

        match serde_json::from_value::<RestaurantRef>(row.clone()) {
            Ok(restaurant) if restaurant.has_res_id() => restaurants.push(restaurant),
            Ok(_) => tracing::warn!("Skipping registry row {}: missing res_id", index),
            Err(e) => tracing::warn!("Skipping registry row {}: {}", index, e),
        }
    }

    Ok(restaurants)
}
