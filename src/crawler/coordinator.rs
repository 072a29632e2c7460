//! Crawl coordinator - run orchestration logic
//!
//! This module contains the top-level run logic, including:
//! - Reading the restaurant list from the registry
//! - Spawning one independent chain per restaurant
//! - Isolating per-restaurant failures
//! - Exporting and delivering the collected records exactly once

use crate::config::Config;
use crate::crawler::fetcher::{build_api_client, Fetcher};
use crate::crawler::menu::crawl_restaurant_menu;
use crate::crawler::reviews::{RecencyWindow, ReviewChain};
use crate::model::{MenuItemRecord, RestaurantRef, ReviewRecord};
use crate::output::{
    DeliveryError, DeliveryReceipt, DeliveryStatus, RecordSink, RunSummary, SinkClient,
    UploadDirective,
};
use crate::registry::RegistryClient;
use crate::ScoutError;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Main crawl coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Fetcher,
    registry: RegistryClient,
    sink_client: SinkClient,
    now: NaiveDateTime,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// The crawl's reference instant ("now" for relative dates) is captured
    /// here, once, so every chain of the run agrees on what "today" is.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ScoutError)` - An HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, ScoutError> {
        let fetcher = Fetcher::from_config(&config)?;
        let api_client = build_api_client(config.client.timeout_secs)?;

        Ok(Self {
            registry: RegistryClient::new(api_client.clone(), config.registry.clone()),
            sink_client: SinkClient::new(api_client, config.sink.clone()),
            fetcher,
            now: Local::now().naive_local(),
            config: Arc::new(config),
        })
    }

    /// Overrides the crawl's reference instant
    pub fn with_reference_time(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    /// Runs the review crawl
    ///
    /// Never fails: registry, chain and delivery failures are logged and
    /// reported in the returned summary, and delivery is always attempted
    /// with whatever was collected.
    pub async fn run_reviews(&self) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::new("reviews");
        let restaurants = self.load_restaurants(&mut summary).await;

        let window = Arc::new(RecencyWindow::new(
            self.now,
            self.config.crawler.stop_threshold_days,
        ));
        let max_pages = self.config.crawler.max_pages_per_restaurant;
        tracing::info!(
            "Collecting reviews dated on or after {} for {} restaurants",
            window.cutoff(),
            restaurants.len()
        );

        let sink = Arc::new(RecordSink::<ReviewRecord>::new());
        let mut chains = JoinSet::new();
        for restaurant in restaurants {
            let fetcher = self.fetcher.clone();
            let sink = Arc::clone(&sink);
            let window = Arc::clone(&window);
            chains.spawn(async move {
                ReviewChain::new(&restaurant, &window, max_pages)
                    .run(&fetcher, &sink)
                    .await
            });
        }

        while let Some(joined) = chains.join_next().await {
            match joined {
                Ok(report) => summary.record_chain(&report),
                Err(e) => {
                    tracing::error!("Review chain task failed: {}", e);
                    summary.record_task_failure();
                }
            }
        }

        self.export(&sink);
        let result = sink
            .flush(
                &self.sink_client,
                &self.config.sink.reviews_table,
                &UploadDirective::IgnoreDuplicates,
            )
            .await;
        summary.delivery = delivery_status(result);

        summary.duration = started.elapsed();
        tracing::info!(
            "Review run finished: {} records from {} restaurants in {:?}",
            summary.records_collected,
            summary.restaurants,
            summary.duration
        );
        summary
    }

    /// Runs the menu crawl
    ///
    /// Same failure policy as [`Coordinator::run_reviews`], except that the
    /// upload is skipped when no item was collected.
    pub async fn run_menu(&self) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::new("menu");
        let restaurants = self.load_restaurants(&mut summary).await;
        let crawl_date = self.now.date();

        let sink = Arc::new(RecordSink::<MenuItemRecord>::new());
        let mut chains = JoinSet::new();
        for restaurant in restaurants {
            let fetcher = self.fetcher.clone();
            let sink = Arc::clone(&sink);
            chains.spawn(async move {
                crawl_restaurant_menu(&fetcher, &restaurant, crawl_date, &sink).await
            });
        }

        while let Some(joined) = chains.join_next().await {
            match joined {
                Ok(report) => summary.record_menu(&report),
                Err(e) => {
                    tracing::error!("Menu task failed: {}", e);
                    summary.record_task_failure();
                }
            }
        }

        if sink.is_empty() {
            tracing::info!("No items to send.");
            summary.delivery = DeliveryStatus::Skipped;
        } else {
            self.export(&sink);
            let directive = UploadDirective::Database(self.config.sink.menu_database.clone());
            let result = sink
                .flush(&self.sink_client, &self.config.sink.menu_table, &directive)
                .await;
            summary.delivery = delivery_status(result);
        }

        summary.duration = started.elapsed();
        tracing::info!(
            "Menu run finished: {} items from {} restaurants in {:?}",
            summary.records_collected,
            summary.restaurants,
            summary.duration
        );
        summary
    }

    /// Reads the restaurant list; a registry failure yields an empty list
    async fn load_restaurants(&self, summary: &mut RunSummary) -> Vec<RestaurantRef> {
        match self.registry.fetch_restaurants().await {
            Ok(restaurants) => restaurants,
            Err(e) => {
                tracing::error!("Failed to load restaurants from registry: {}", e);
                summary.registry_error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    /// Writes the local JSON export when one is configured
    fn export<T: Serialize>(&self, sink: &RecordSink<T>) {
        if let Some(path) = &self.config.output.export_path {
            if let Err(e) = sink.export_json(Path::new(path)) {
                tracing::error!("Failed to export records to {}: {}", path, e);
            }
        }
    }
}

fn delivery_status(result: Result<DeliveryReceipt, DeliveryError>) -> DeliveryStatus {
    match result {
        Ok(receipt) => {
            tracing::info!(
                "Data posted successfully: {} records to {}",
                receipt.records,
                receipt.table
            );
            DeliveryStatus::Delivered {
                records: receipt.records,
            }
        }
        Err(e) => {
            tracing::error!("Failed to post data: {}", e);
            DeliveryStatus::Failed {
                message: e.to_string(),
            }
        }
    }
}
