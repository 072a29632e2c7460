//! Relative date normalization
//!
//! The platform renders review timestamps as relative text ("2 hours ago",
//! "yesterday") with no absolute fallback in the payload. This module turns
//! those expressions into calendar dates so a recency cutoff can be applied.

mod relative;

pub use relative::{normalize_relative_date, TimeUnit};

use thiserror::Error;

/// Errors produced while normalizing a relative date expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("Unrecognized relative date format: '{0}'")]
    UnrecognizedFormat(String),
}
