//! Crawler module for review and menu collection
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Request scheduling (global in-flight cap)
//! - The per-restaurant review pagination state machine
//! - Menu traversal
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod menu;
mod reviews;
mod scheduler;

pub use coordinator::Coordinator;
pub use fetcher::{
    backoff_delay, build_api_client, build_http_client, parse_review_page, FetchError, Fetcher,
    ReviewPage,
};
pub use menu::{
    crawl_restaurant_menu, extract_menu_items, find_bestseller_tag, MenuReport, MissingMenus,
    BESTSELLER_TAG,
};
pub use reviews::{evaluate_page, ChainReport, PageOutcome, RecencyWindow, ReviewChain};
pub use scheduler::{ScheduledRequest, Scheduler};

use crate::config::Config;
use crate::output::RunSummary;
use crate::ScoutError;

/// Runs a complete review crawl
///
/// This is the main entry point for collecting reviews. It will:
/// 1. Read the restaurant list from the registry
/// 2. Walk each restaurant's review pages concurrently until the recency cutoff
/// 3. Export the collected records locally if configured
/// 4. Deliver them to the storage API in one bulk upload
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run finished; per-restaurant failures are in the summary
/// * `Err(ScoutError)` - The HTTP clients could not be built
pub async fn crawl_reviews(config: Config) -> Result<RunSummary, ScoutError> {
    Ok(Coordinator::new(config)?.run_reviews().await)
}

/// Runs a complete menu crawl
pub async fn crawl_menus(config: Config) -> Result<RunSummary, ScoutError> {
    Ok(Coordinator::new(config)?.run_menu().await)
}
