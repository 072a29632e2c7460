//! In-memory record buffer for one crawl run

use crate::output::delivery::{DeliveryError, DeliveryReceipt, SinkClient, UploadDirective};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Buffers records from every restaurant chain until the end of the run
///
/// Appends from concurrent chains are independent and order-insensitive.
/// One sink is created per run and flushed exactly once.
#[derive(Debug)]
pub struct RecordSink<T> {
    records: Mutex<Vec<T>>,
}

impl<T> Default for RecordSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecordSink<T> {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Appends one record
    pub fn append(&self, record: T) {
        self.lock().push(record);
    }

    /// Appends a batch of records
    pub fn extend<I>(&self, records: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.lock().extend(records);
    }

    /// Number of buffered records
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been buffered
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes and returns every buffered record
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.lock())
    }

    // A chain that panicked mid-append must not block delivery of everyone else's records
    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Serialize> RecordSink<T> {
    /// Drains the buffer and delivers it in one bulk upload
    ///
    /// The records are gone from the sink afterwards whatever the outcome;
    /// failed deliveries are not retried.
    pub async fn flush(
        &self,
        client: &SinkClient,
        table: &str,
        directive: &UploadDirective,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let records = self.take();
        client.deliver(&records, table, directive).await
    }

    /// Writes the buffered records to `path` as a pretty-printed JSON array
    ///
    /// Any previous file at `path` is replaced. The buffer is left intact.
    pub fn export_json(&self, path: &Path) -> Result<usize, DeliveryError> {
        let records = self.lock();
        let json = serde_json::to_string_pretty(&*records)?;
        std::fs::write(path, json)?;
        tracing::info!("Exported {} records to {}", records.len(), path.display());
        Ok(records.len())
    }
}
