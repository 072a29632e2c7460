//! Review pagination driver
//!
//! Walks one restaurant's review listing page by page. Reviews arrive
//! newest-first, so the first review older than the recency cutoff (or one
//! whose date cannot be read) ends the restaurant's crawl: it and everything
//! after it are discarded and no further pages are requested.

use crate::crawler::fetcher::{FetchError, Fetcher, ReviewPage};
use crate::dates::normalize_relative_date;
use crate::model::{RestaurantRef, ReviewEntry, ReviewRecord};
use crate::output::RecordSink;
use crate::state::{ChainState, PaginationCursor, StopReason};
use chrono::{Days, NaiveDate, NaiveDateTime};

/// Reference instant and recency cutoff shared by every chain of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecencyWindow {
    now: NaiveDateTime,
    cutoff: NaiveDate,
}

impl RecencyWindow {
    /// Creates a window keeping reviews dated on or after `now - threshold_days`
    pub fn new(now: NaiveDateTime, threshold_days: u32) -> Self {
        let cutoff = now
            .date()
            .checked_sub_days(Days::new(u64::from(threshold_days)))
            .unwrap_or(NaiveDate::MIN);
        Self { now, cutoff }
    }

    /// The crawl's reference instant
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Oldest date still collected
    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// Returns true if a review from `date` is strictly older than the cutoff
    pub fn is_stale(&self, date: NaiveDate) -> bool {
        date < self.cutoff
    }
}

/// Result of evaluating one page of reviews
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome {
    /// Records to emit, in page order
    pub records: Vec<ReviewRecord>,
    /// Set when an entry on this page ends the chain
    pub stop: Option<StopReason>,
}

/// Normalizes the entries of one page and applies the stop condition
///
/// Entries are processed in order. The first entry whose timestamp cannot be
/// normalized, or whose date is older than the window's cutoff, stops the
/// evaluation; that entry and all later entries are not emitted.
pub fn evaluate_page(
    entries: &[ReviewEntry],
    restaurant: &RestaurantRef,
    window: &RecencyWindow,
) -> PageOutcome {
    let mut records = Vec::with_capacity(entries.len());

    for entry in entries {
        let review_date = match normalize_relative_date(&entry.timestamp, window.now()) {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!(
                    res_id = %restaurant.res_id,
                    review_id = %entry.review_id,
                    "Stopping: {}",
                    e
                );
                return PageOutcome {
                    records,
                    stop: Some(StopReason::UnrecognizedDate {
                        text: entry.timestamp.clone(),
                    }),
                };
            }
        };

        if window.is_stale(review_date) {
            tracing::info!(
                res_id = %restaurant.res_id,
                "Stopping: review {} dated {} is older than cutoff {}",
                entry.review_id,
                review_date,
                window.cutoff()
            );
            return PageOutcome {
                records,
                stop: Some(StopReason::StaleReview { date: review_date }),
            };
        }

        records.push(ReviewRecord::from_entry(entry, review_date, restaurant));
    }

    PageOutcome {
        records,
        stop: None,
    }
}

/// Summary of one restaurant's review chain
#[derive(Debug, Clone, PartialEq)]
pub struct ChainReport {
    pub res_id: String,
    pub pages_fetched: u32,
    pub records_emitted: usize,
    pub stop_reason: StopReason,
}

/// Pagination state machine for one restaurant
///
/// `Fetching(page) -> Emitting -> Fetching(page + 1) | Stopped`. The chain
/// owns its cursor; nothing else reads or advances it.
#[derive(Debug)]
pub struct ReviewChain<'a> {
    restaurant: &'a RestaurantRef,
    window: &'a RecencyWindow,
    max_pages: u32,
    cursor: PaginationCursor,
    state: ChainState,
    pages_fetched: u32,
    records_emitted: usize,
}

impl<'a> ReviewChain<'a> {
    /// Creates a chain in its initial `Fetching(1)` state
    pub fn new(restaurant: &'a RestaurantRef, window: &'a RecencyWindow, max_pages: u32) -> Self {
        Self {
            restaurant,
            window,
            max_pages,
            cursor: PaginationCursor::new(restaurant.res_id.clone()),
            state: ChainState::initial(),
            pages_fetched: 0,
            records_emitted: 0,
        }
    }

    /// Current state of the chain
    pub fn state(&self) -> &ChainState {
        &self.state
    }

    /// Pagination progress so far
    pub fn cursor(&self) -> &PaginationCursor {
        &self.cursor
    }

    /// Runs the chain to completion, appending emitted records to the sink
    ///
    /// Never fails: fetch errors become the chain's stop reason.
    pub async fn run(mut self, fetcher: &Fetcher, sink: &RecordSink<ReviewRecord>) -> ChainReport {
        tracing::debug!(res_id = %self.restaurant.res_id, "Starting review chain");

        while let Some(page) = self.state.page_to_fetch() {
            let result = fetcher.fetch_review_page(&self.restaurant.res_id, page).await;
            let records = self.handle_fetch(page, result);
            sink.extend(records);
        }

        let report = self.into_report();
        if report.stop_reason.is_complete() {
            tracing::info!(
                res_id = %report.res_id,
                pages = report.pages_fetched,
                records = report.records_emitted,
                "Review chain stopped: {}",
                report.stop_reason
            );
        } else {
            tracing::warn!(
                res_id = %report.res_id,
                pages = report.pages_fetched,
                records = report.records_emitted,
                "Review chain stopped early: {}",
                report.stop_reason
            );
        }
        report
    }

    /// Applies the result of fetching `page` and returns the records to emit
    ///
    /// Transitions to `Fetching(next)` when the page produced no stop signal
    /// and the platform reports more pages; otherwise to `Stopped`.
    pub fn handle_fetch(
        &mut self,
        page: u32,
        result: Result<ReviewPage, FetchError>,
    ) -> Vec<ReviewRecord> {
        if self.state.is_terminal() {
            return Vec::new();
        }

        let review_page = match result {
            Ok(review_page) => review_page,
            Err(e) => {
                let reason = if e.is_malformed() {
                    tracing::error!(res_id = %self.restaurant.res_id, page, "{}", e);
                    StopReason::MalformedPayload {
                        message: e.to_string(),
                    }
                } else {
                    tracing::warn!(res_id = %self.restaurant.res_id, page, "{}", e);
                    StopReason::FetchFailed {
                        message: e.to_string(),
                    }
                };
                self.state = ChainState::Stopped(reason);
                return Vec::new();
            }
        };

        self.pages_fetched += 1;
        self.cursor
            .record_page(page, review_page.current_page, review_page.total_pages);
        self.state = ChainState::Emitting;

        let outcome = evaluate_page(&review_page.entries, self.restaurant, self.window);
        self.records_emitted += outcome.records.len();

        self.state = match (outcome.stop, self.cursor.next_page()) {
            (Some(reason), _) => ChainState::Stopped(reason),
            (None, None) => ChainState::Stopped(StopReason::LastPage),
            (None, Some(_)) if self.pages_fetched >= self.max_pages => {
                ChainState::Stopped(StopReason::PageLimit {
                    pages: self.pages_fetched,
                })
            }
            (None, Some(next)) => ChainState::Fetching(next),
        };
        tracing::trace!(res_id = %self.restaurant.res_id, "Chain state: {}", self.state);

        outcome.records
    }

    fn into_report(self) -> ChainReport {
        // run() only returns once the chain is terminal
        let stop_reason = self.state.stop_reason().cloned().unwrap_or_else(|| {
            StopReason::FetchFailed {
                message: format!("chain ended in non-terminal state {}", self.state),
            }
        });

        ChainReport {
            res_id: self.restaurant.res_id.clone(),
            pages_fetched: self.pages_fetched,
            records_emitted: self.records_emitted,
            stop_reason,
        }
    }
}
