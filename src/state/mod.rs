//! State module for tracking run progress
//!
//! This module holds the run-scoped accumulation of a crawl.
//!
//! # Components
//!
//! - `RunState`: Accumulated records, visited categories and skip bookkeeping
//! - `SkippedUrl` / `FailedTarget`: What was left out and why

mod run_state;

// Re-export main types
pub use run_state::{FailedTarget, RunState, SkippedUrl};
