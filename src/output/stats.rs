//! Run statistics
//!
//! This module aggregates per-restaurant chain outcomes into a run summary
//! and prints it at the end of a crawl.

use crate::crawler::{ChainReport, MenuReport};
use std::collections::BTreeMap;
use std::time::Duration;

/// What happened to the run's bulk upload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeliveryStatus {
    /// Not attempted yet
    #[default]
    Pending,
    /// Storage API answered 201
    Delivered { records: usize },
    /// Nothing to send
    Skipped,
    /// Upload rejected or failed; not retried
    Failed { message: String },
}

/// Summary of one crawl run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// "reviews" or "menu"
    pub dataset: String,

    /// Number of restaurants crawled
    pub restaurants: usize,

    /// Total records collected into the sink
    pub records_collected: usize,

    /// Total pages (or menu payloads) fetched
    pub pages_fetched: u64,

    /// Count of chains per outcome label
    pub outcomes: BTreeMap<String, usize>,

    /// Restaurants whose chain ended on an error
    pub failed_restaurants: Vec<String>,

    /// Set when the restaurant registry could not be read
    pub registry_error: Option<String>,

    /// Outcome of the final bulk upload
    pub delivery: DeliveryStatus,

    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl RunSummary {
    /// Creates an empty summary for a dataset
    pub fn new(dataset: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            ..Self::default()
        }
    }

    /// Adds one review chain's outcome
    pub fn record_chain(&mut self, report: &ChainReport) {
        self.restaurants += 1;
        self.records_collected += report.records_emitted;
        self.pages_fetched += u64::from(report.pages_fetched);
        *self
            .outcomes
            .entry(report.stop_reason.label().to_string())
            .or_insert(0) += 1;

        if report.stop_reason.is_error() {
            self.failed_restaurants.push(report.res_id.clone());
        }
    }

    /// Adds one menu crawl's outcome
    pub fn record_menu(&mut self, report: &MenuReport) {
        self.restaurants += 1;
        self.records_collected += report.items_emitted;

        let label = if report.error.is_some() {
            self.failed_restaurants.push(report.res_id.clone());
            "failed"
        } else {
            self.pages_fetched += 1;
            "extracted"
        };
        *self.outcomes.entry(label.to_string()).or_insert(0) += 1;
    }

    /// Counts a chain task that panicked or was cancelled before reporting
    pub fn record_task_failure(&mut self) {
        self.restaurants += 1;
        *self.outcomes.entry("task_failed".to_string()).or_insert(0) += 1;
    }

    /// Returns true if every chain completed and the records were delivered or there were none
    pub fn is_clean(&self) -> bool {
        self.registry_error.is_none()
            && self.failed_restaurants.is_empty()
            && matches!(
                self.delivery,
                DeliveryStatus::Delivered { .. } | DeliveryStatus::Skipped
            )
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Zomato-Scout {} run ===\n", summary.dataset);

    if let Some(error) = &summary.registry_error {
        println!("Registry error: {}\n", error);
    }

    println!("Restaurants:        {}", summary.restaurants);
    println!("Pages fetched:      {}", summary.pages_fetched);
    println!("Records collected:  {}", summary.records_collected);
    println!("Duration:           {:.1}s", summary.duration.as_secs_f64());

    if !summary.outcomes.is_empty() {
        println!("\nOutcomes:");
        for (label, count) in &summary.outcomes {
            println!("  {:<20} {}", label, count);
        }
    }

    if !summary.failed_restaurants.is_empty() {
        println!("\nFailed restaurants ({}):", summary.failed_restaurants.len());
        for res_id in &summary.failed_restaurants {
            println!("  - {}", res_id);
        }
    }

    println!();
    match &summary.delivery {
        DeliveryStatus::Pending => println!("Delivery: not attempted"),
        DeliveryStatus::Delivered { records } => {
            println!("✓ Delivered {} records", records)
        }
        DeliveryStatus::Skipped => println!("Delivery: no items to send"),
        DeliveryStatus::Failed { message } => println!("✗ Delivery failed: {}", message),
    }
}
