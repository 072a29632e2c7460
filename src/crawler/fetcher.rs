//! HTTP fetcher implementation
//!
//! This module handles all requests to the platform, including:
//! - Building HTTP clients with the configured user agent and proxy
//! - Retry logic with exponential backoff for transient failures
//! - Review page retrieval and payload parsing
//! - Menu page resolution through the short-link service
//! - Error classification

use crate::config::{ClientConfig, Config, EndpointsConfig, RetryConfig};
use crate::crawler::scheduler::Scheduler;
use crate::model::{value_to_f64, ReviewEntry};
use crate::{ConfigError, ScoutError};
use reqwest::{redirect::Policy, Client, Proxy, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum number of redirects followed when resolving short links
const MAX_REDIRECTS: usize = 10;

/// Errors returned by the page fetcher
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Network failure or retryable status, after the retry policy was exhausted
    #[error("Transient failure fetching {url}: {message}")]
    Transient { url: String, message: String },

    /// Non-retryable HTTP status
    #[error("HTTP {status} from {url}")]
    Rejected { url: String, status: u16 },

    /// Body was not the expected JSON structure; never retried
    #[error("Malformed payload from {url}: {message}")]
    Malformed { url: String, message: String },
}

impl FetchError {
    /// Returns true if the payload arrived but had the wrong shape
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

/// One page of the review listing
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewPage {
    /// Reviews in payload order (newest first)
    pub entries: Vec<ReviewEntry>,
    /// `currentPage` as reported by the platform
    pub current_page: u32,
    /// `numberOfPages` as reported by the platform
    pub total_pages: u32,
}

/// Builds the HTTP client used for platform requests
///
/// Sets the configured User-Agent (the platform rejects unidentified
/// clients), timeouts, compression, redirect following, and the optional
/// outbound proxy.
///
/// # Example
///
/// ```no_run
/// use zomato_scout::config::ClientConfig;
/// use zomato_scout::crawler::build_http_client;
///
/// let client = build_http_client(&ClientConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// Builds the HTTP client used for the registry and storage APIs
///
/// These internal APIs are reached directly, never through the crawl proxy.
pub fn build_api_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .build()
}

/// Delay before retry number `attempt` (1-based): `backoff_ms * 2^(attempt - 1)`
pub fn backoff_delay(backoff_ms: u64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    Duration::from_millis(backoff_ms.saturating_mul(1u64 << exponent))
}

/// Fetches review pages and menu payloads from the platform
///
/// Cloning is cheap; all clones share the HTTP connection pool and the
/// request scheduler.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    scheduler: Scheduler,
    retry: RetryConfig,
    base_url: Url,
    short_url_base: Url,
}

impl Fetcher {
    /// Creates a fetcher from its parts
    pub fn new(
        client: Client,
        scheduler: Scheduler,
        retry: RetryConfig,
        endpoints: &EndpointsConfig,
    ) -> Result<Self, ConfigError> {
        let parse = |field: &str, value: &str| {
            Url::parse(value)
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))
        };

        Ok(Self {
            client,
            scheduler,
            retry,
            base_url: parse("base_url", &endpoints.base_url)?,
            short_url_base: parse("short_url_base", &endpoints.short_url_base)?,
        })
    }

    /// Creates a fetcher with a client and scheduler built from the configuration
    pub fn from_config(config: &Config) -> Result<Self, ScoutError> {
        let client = build_http_client(&config.client)?;
        let scheduler = Scheduler::from_config(&config.crawler);
        Ok(Self::new(
            client,
            scheduler,
            config.retry.clone(),
            &config.endpoints,
        )?)
    }

    /// Builds the review listing URL for a restaurant and page
    pub fn review_page_url(&self, res_id: &str, page: u32) -> Url {
        let mut url = self.base_url.clone();
        url.set_path("/webroutes/reviews/loadMore");
        url.query_pairs_mut()
            .clear()
            .append_pair("sort", "dd")
            .append_pair("filter", "reviews-dd")
            .append_pair("res_id", res_id)
            .append_pair("page", &page.to_string());
        url
    }

    /// Builds the menu API URL for a restaurant page path
    pub fn menu_page_url(&self, page_path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path("/webroutes/getPage");
        url.query_pairs_mut()
            .clear()
            .append_pair("page_url", &format!("/{}/order", page_path.trim_matches('/')))
            .append_pair("location", "")
            .append_pair("isMobile", "0");
        url
    }

    /// Fetches and parses one page of a restaurant's reviews
    ///
    /// # Returns
    ///
    /// * `Ok(ReviewPage)` - Entries in payload order plus pagination metadata
    /// * `Err(FetchError::Transient)` - Network failure, 5xx or other retryable status after all attempts
    /// * `Err(FetchError::Rejected)` - Non-retryable HTTP status
    /// * `Err(FetchError::Malformed)` - Body is not a review listing payload
    pub async fn fetch_review_page(&self, res_id: &str, page: u32) -> Result<ReviewPage, FetchError> {
        let url = self.review_page_url(res_id, page);
        tracing::debug!(res_id, page, "Fetching review page {}", url);

        let (_, body) = self.get_with_retry(&url).await?;
        parse_review_page(&body).map_err(|message| FetchError::Malformed {
            url: url.to_string(),
            message,
        })
    }

    /// Resolves a restaurant's short link to its menu API URL
    ///
    /// The short link redirects to the restaurant's page; that page's path is
    /// what the menu API expects as `page_url`.
    pub async fn resolve_menu_url(&self, res_id: &str) -> Result<Url, FetchError> {
        let short_url = self
            .short_url_base
            .join(&format!("r/{}", res_id))
            .map_err(|e| FetchError::Malformed {
                url: self.short_url_base.to_string(),
                message: format!("cannot build short link for res_id {}: {}", res_id, e),
            })?;

        let (final_url, _) = self.get_with_retry(&short_url).await?;
        let page_path = final_url.path().trim_matches('/');

        if page_path.is_empty() {
            return Err(FetchError::Malformed {
                url: final_url.to_string(),
                message: "short link did not resolve to a restaurant page".to_string(),
            });
        }

        let api_url = self.menu_page_url(page_path);
        tracing::debug!(res_id, "Menu API URL: {}", api_url);
        Ok(api_url)
    }

    /// Fetches a menu API payload as JSON
    pub async fn fetch_menu_payload(&self, url: &Url) -> Result<Value, FetchError> {
        let (_, body) = self.get_with_retry(url).await?;
        let malformed = |message: String| FetchError::Malformed {
            url: url.to_string(),
            message,
        };

        let payload: Value =
            serde_json::from_str(&body).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;
        if !payload.is_object() {
            return Err(malformed("expected a JSON object".to_string()));
        }
        Ok(payload)
    }

    /// Sends a GET request and reads the body, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx with a readable body | Return the final URL and the body |
    /// | Any 5xx | Retry with backoff |
    /// | Other status in `retryable-status-codes` (e.g. 429) | Retry with backoff |
    /// | Timeout / connection error / body read error | Retry with backoff |
    /// | Any other status | Immediate `Rejected` |
    ///
    /// The returned URL is where the request ended up after redirects.
    async fn get_with_retry(&self, url: &Url) -> Result<(Url, String), FetchError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let slot = self.scheduler.acquire().await.ok_or_else(|| FetchError::Transient {
                url: url.to_string(),
                message: "request scheduler closed".to_string(),
            })?;

            let failure = match self.client.get(url.clone()).send().await {
                Ok(response) if response.status().is_success() => {
                    let final_url = response.url().clone();
                    match response.text().await {
                        Ok(body) => return Ok((final_url, body)),
                        Err(e) => format!("failed to read body: {}", classify_error(&e)),
                    }
                }
                Ok(response) => {
                    let status = response.status();
                    if !self.is_retryable_status(status) {
                        return Err(FetchError::Rejected {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                    format!("HTTP {}", status.as_u16())
                }
                Err(e) => classify_error(&e),
            };
            drop(slot);

            if attempt >= max_attempts {
                return Err(FetchError::Transient {
                    url: url.to_string(),
                    message: format!("{} (gave up after {} attempts)", failure, attempt),
                });
            }

            let delay = backoff_delay(self.retry.backoff_ms, attempt);
            tracing::warn!(
                url = %url,
                attempt,
                max_attempts,
                error = %failure,
                "Transient fetch failure, retrying in {:?}",
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Every server error is transient; the configuration adds others such as 429
    fn is_retryable_status(&self, status: StatusCode) -> bool {
        status.is_server_error() || self.retry.retryable_status_codes.contains(&status.as_u16())
    }
}

/// Describes a reqwest error for logs and `FetchError` messages
fn classify_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}

/// Parses a review listing body
///
/// Expected shape:
///
/// ```text
/// { "entities": { "REVIEWS": { "<id>": { reviewId, reviewText, ratingV2, ratingV2Text, timestamp } } },
///   "page_data": { "sections": { "SECTION_REVIEWS": { currentPage, numberOfPages } } } }
/// ```
///
/// A missing review map means an empty page and missing metadata means page
/// 1 of 1. Non-JSON bodies, non-object roots and a review map that is not an
/// object are rejected.
pub fn parse_review_page(body: &str) -> Result<ReviewPage, String> {
    let root: Value = serde_json::from_str(body).map_err(|e| format!("invalid JSON: {}", e))?;
    let root = root
        .as_object()
        .ok_or_else(|| "expected a JSON object".to_string())?;

    let entries = match root.get("entities").and_then(|e| e.get("REVIEWS")) {
        None | Some(Value::Null) => Vec::new(),
        // Empty collections are sometimes rendered as [] instead of {}
        Some(Value::Array(items)) if items.is_empty() => Vec::new(),
        Some(Value::Object(reviews)) => reviews
            .iter()
            .map(|(key, value)| parse_review_entry(key, value))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err("entities.REVIEWS is not an object".to_string()),
    };

    let section = root
        .get("page_data")
        .and_then(|p| p.get("sections"))
        .and_then(|s| s.get("SECTION_REVIEWS"));

    Ok(ReviewPage {
        entries,
        current_page: page_number(section.and_then(|s| s.get("currentPage"))),
        total_pages: page_number(section.and_then(|s| s.get("numberOfPages"))),
    })
}

fn parse_review_entry(key: &str, value: &Value) -> Result<ReviewEntry, String> {
    if !value.is_object() {
        return Err(format!("review '{}' is not an object", key));
    }

    let mut entry: ReviewEntry = serde_json::from_value(value.clone())
        .map_err(|e| format!("review '{}' could not be decoded: {}", key, e))?;
    if entry.review_id.is_empty() {
        entry.review_id = key.to_string();
    }
    Ok(entry)
}

/// Reads a page number, defaulting to 1 when absent or unusable
fn page_number(value: Option<&Value>) -> u32 {
    value
        .and_then(value_to_f64)
        .filter(|n| n.is_finite() && *n >= 1.0)
        .map(|n| n.min(f64::from(u32::MAX)) as u32)
        .unwrap_or(1)
}
