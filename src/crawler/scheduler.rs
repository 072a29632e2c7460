//! Request scheduler for the crawl
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore (max requests in flight)
//! - Optional minimum spacing between the start of two requests
//!
//! Every restaurant chain shares one scheduler; a chain holds a slot only
//! while one of its requests is in flight.

use crate::config::CrawlerConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// A granted request slot; the slot is released when this value is dropped
#[derive(Debug)]
pub struct ScheduledRequest {
    _permit: OwnedSemaphorePermit,
}

/// Scheduler shared by all restaurant chains of a crawl run
#[derive(Debug, Clone)]
pub struct Scheduler {
    /// Global semaphore for limiting in-flight requests
    global_semaphore: Arc<Semaphore>,

    /// Minimum time between two request starts
    request_spacing: Duration,

    /// Start time of the most recent request
    last_request_start: Arc<Mutex<Option<Instant>>>,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `max_concurrent_requests` - Global cap on requests in flight
    /// * `request_spacing` - Minimum delay between request starts (zero disables spacing)
    pub fn new(max_concurrent_requests: usize, request_spacing: Duration) -> Self {
        Self {
            global_semaphore: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
            request_spacing,
            last_request_start: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates a scheduler from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.max_concurrent_requests as usize,
            Duration::from_millis(config.request_delay_ms),
        )
    }

    /// Waits for a request slot
    ///
    /// This method:
    /// 1. Acquires a global semaphore permit
    /// 2. If spacing is configured, sleeps until the spacing since the previous
    ///    request start has elapsed
    ///
    /// # Returns
    ///
    /// * `Some(ScheduledRequest)` - The slot to hold while the request is in flight
    /// * `None` - The scheduler was closed
    pub async fn acquire(&self) -> Option<ScheduledRequest> {
        let permit = self.global_semaphore.clone().acquire_owned().await.ok()?;

        if !self.request_spacing.is_zero() {
            let mut last_start = self.last_request_start.lock().await;
            if let Some(previous) = *last_start {
                let ready_at = previous + self.request_spacing;
                if ready_at > Instant::now() {
                    tracing::trace!("Spacing requests, waiting until {:?}", ready_at);
                    tokio::time::sleep_until(ready_at).await;
                }
            }
            *last_start = Some(Instant::now());
        }

        Some(ScheduledRequest { _permit: permit })
    }

    /// Returns the number of request slots currently free
    pub fn available_slots(&self) -> usize {
        self.global_semaphore.available_permits()
    }
}
