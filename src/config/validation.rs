use crate::config::types::{
    ClientConfig, Config, CrawlerConfig, EndpointsConfig, RegistryConfig, RetryConfig, SinkConfig,
};
use crate::ConfigError;
use reqwest::StatusCode;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_client_config(&config.client)?;
    validate_retry_config(&config.retry)?;
    validate_endpoints_config(&config.endpoints)?;
    validate_registry_config(&config.registry)?;
    validate_sink_config(&config.sink)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 100, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.max_pages_per_restaurant < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages_per_restaurant must be >= 1, got {}",
            config.max_pages_per_restaurant
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if let Some(proxy) = &config.proxy {
        validate_http_url("proxy", proxy)?;
    }

    Ok(())
}

/// Validates the retry policy
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    for code in &config.retryable_status_codes {
        if StatusCode::from_u16(*code).is_err() {
            return Err(ConfigError::Validation(format!(
                "retryable_status_codes contains an invalid HTTP status: {}",
                code
            )));
        }
    }

    Ok(())
}

fn validate_endpoints_config(config: &EndpointsConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)?;
    validate_http_url("short_url_base", &config.short_url_base)?;
    Ok(())
}

fn validate_registry_config(config: &RegistryConfig) -> Result<(), ConfigError> {
    validate_http_url("registry url", &config.url)?;

    if config.query.trim().is_empty() {
        return Err(ConfigError::Validation(
            "registry query cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_sink_config(config: &SinkConfig) -> Result<(), ConfigError> {
    validate_http_url("sink url", &config.url)?;

    for (name, value) in [
        ("reviews_table", &config.reviews_table),
        ("menu_table", &config.menu_table),
        ("menu_database", &config.menu_database),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Validates that a value is an absolute http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}
