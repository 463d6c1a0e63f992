//! Output sink traits and types
//!
//! This module defines the trait interface for record serializers and the
//! error type shared by every output format.

use crate::extract::ProductRecord;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown output format '{0}' (expected json, jsonl, csv or both)")]
    UnknownFormat(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Serializer for a batch of records
///
/// Every sink writes the same field set in the same order.
pub trait RecordSink {
    /// File extension without the leading dot
    fn extension(&self) -> &'static str;

    /// Writes `records` to `writer`
    ///
    /// # Arguments
    ///
    /// * `records` - The records to serialize, in accumulation order
    /// * `writer` - Destination of the serialized bytes
    fn write_records(&self, records: &[ProductRecord], writer: &mut dyn Write) -> OutputResult<()>;
}
