//! Zomato-Scout: competitor menu and review crawler
//!
//! This crate collects restaurant menu items and recent customer reviews from a
//! food-delivery platform's public web endpoints. Reviews are paginated
//! newest-first and the crawler stops each restaurant as soon as it reaches
//! reviews older than a configurable recency threshold.

pub mod config;
pub mod crawler;
pub mod dates;
pub mod model;
pub mod output;
pub mod registry;
pub mod state;

use thiserror::Error;

/// Main error type for Zomato-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Zomato-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use dates::{normalize_relative_date, DateError};
pub use model::{MenuItemRecord, RestaurantRef, ReviewRecord};
pub use state::{ChainState, PaginationCursor, StopReason};
