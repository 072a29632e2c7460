//! Output module for collected records
//!
//! This module handles:
//! - Buffering records from every restaurant chain during a run
//! - The single bulk delivery to the storage API at the end of a run
//! - Optional local JSON export of the collected records
//! - Run statistics and their console summary

mod delivery;
mod sink;
pub mod stats;

pub use delivery::{DeliveryError, DeliveryReceipt, SinkClient, UploadDirective};
pub use sink::RecordSink;
pub use stats::{print_summary, DeliveryStatus, RunSummary};
