use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Zomato-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    pub registry: RegistryConfig,
    pub sink: SinkConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Reviews strictly older than `today - stop_threshold_days` end a restaurant's crawl
    #[serde(rename = "stop-threshold-days", default = "default_stop_threshold_days")]
    pub stop_threshold_days: u32,

    /// Maximum number of HTTP requests in flight across all restaurants
    #[serde(
        rename = "max-concurrent-requests",
        default = "default_max_concurrent_requests"
    )]
    pub max_concurrent_requests: u32,

    /// Minimum time between the start of two requests (milliseconds)
    #[serde(rename = "request-delay-ms", default)]
    pub request_delay_ms: u64,

    /// Hard cap on review pages fetched for one restaurant
    #[serde(
        rename = "max-pages-per-restaurant",
        default = "default_max_pages_per_restaurant"
    )]
    pub max_pages_per_restaurant: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            stop_threshold_days: default_stop_threshold_days(),
            max_concurrent_requests: default_max_concurrent_requests(),
            request_delay_ms: 0,
            max_pages_per_restaurant: default_max_pages_per_restaurant(),
        }
    }
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// User-Agent header sent with every platform request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Optional outbound (e.g. residential) proxy URL
    #[serde(default)]
    pub proxy: Option<String>,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            proxy: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Retry policy for transient fetch errors
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per request, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff in milliseconds; doubled after every failed attempt
    #[serde(rename = "backoff-ms", default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Additional HTTP status codes that are retried; server errors always are
    #[serde(
        rename = "retryable-status-codes",
        default = "default_retryable_status_codes"
    )]
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            retryable_status_codes: default_retryable_status_codes(),
        }
    }
}

/// Platform endpoint locations
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    /// Base URL of the platform's web routes
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Base URL of the short-link service used to resolve menu pages
    #[serde(rename = "short-url-base", default = "default_short_url_base")]
    pub short_url_base: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            short_url_base: default_short_url_base(),
        }
    }
}

/// Restaurant registry (competitor database API)
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Query endpoint URL
    pub url: String,

    /// Query sent as `{"query": ...}`
    #[serde(default = "default_registry_query")]
    pub query: String,

    /// Extra request headers (API keys and the like)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Storage API receiving the bulk upload
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// Bulk insert endpoint URL
    pub url: String,

    /// Destination table for review records
    #[serde(rename = "reviews-table", default = "default_reviews_table")]
    pub reviews_table: String,

    /// Destination table for menu item records
    #[serde(rename = "menu-table", default = "default_menu_table")]
    pub menu_table: String,

    /// Database name sent with menu uploads
    #[serde(rename = "menu-database", default = "default_menu_database")]
    pub menu_database: String,

    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Local output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Optional path of a JSON export written at the end of each run
    #[serde(rename = "export-path", default)]
    pub export_path: Option<String>,
}

fn default_stop_threshold_days() -> u32 {
    2
}

fn default_max_concurrent_requests() -> u32 {
    8
}

fn default_max_pages_per_restaurant() -> u32 {
    50
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_retryable_status_codes() -> Vec<u16> {
    vec![429, 500, 502, 503, 504]
}

fn default_base_url() -> String {
    "https://www.zomato.com".to_string()
}

fn default_short_url_base() -> String {
    "https://zoma.to".to_string()
}

fn default_registry_query() -> String {
    "SELECT * FROM competitor_master_data;".to_string()
}

fn default_reviews_table() -> String {
    "competitor_zomato_reviews".to_string()
}

fn default_menu_table() -> String {
    "competitor_zomato_item_details".to_string()
}

fn default_menu_database() -> String {
    "dev".to_string()
}
