//! State module for tracking per-restaurant crawl progress
//!
//! # Components
//!
//! - `ChainState`: the review pagination state machine for one restaurant
//! - `StopReason`: why a restaurant's chain reached its terminal state
//! - `PaginationCursor`: current page / total pages for one restaurant

mod chain_state;
mod cursor;

// Re-export main types
pub use chain_state::{ChainState, StopReason};
pub use cursor::PaginationCursor;
