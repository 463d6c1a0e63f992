//! Output module for persisting harvested records
//!
//! This module handles:
//! - Serializing records as JSON, JSON Lines and CSV
//! - Naming output files after the traversed categories
//! - Summarizing a run for the terminal

mod csv_output;
mod json;
pub mod stats;
mod traits;

pub use csv_output::{CsvSink, IMAGE_SEPARATOR};
pub use json::{JsonSink, JsonlSink};
pub use stats::{print_summary, RunSummary};
pub use traits::{OutputError, OutputResult, RecordSink};

use crate::state::RunState;
use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Timestamp layout of output file names
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Requested output file set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Csv,
    /// JSON array plus CSV
    #[default]
    Both,
}

impl OutputFormat {
    /// Sinks producing this format's files
    pub fn sinks(self) -> Vec<Box<dyn RecordSink>> {
        match self {
            Self::Json => vec![Box::new(JsonSink)],
            Self::Jsonl => vec![Box::new(JsonlSink)],
            Self::Csv => vec![Box::new(CsvSink)],
            Self::Both => vec![Box::new(JsonSink), Box::new(CsvSink)],
        }
    }
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" => Ok(Self::Jsonl),
            "csv" => Ok(Self::Csv),
            "both" => Ok(Self::Both),
            other => Err(OutputError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Jsonl => "jsonl",
            Self::Csv => "csv",
            Self::Both => "both",
        };
        f.write_str(name)
    }
}

/// Builds `{prefix}_{stem}_{YYYYmmdd_HHMMSS}.{ext}`, leaving out the stem
/// when there is none
pub fn output_file_name(
    prefix: &str,
    stem: Option<&str>,
    timestamp: DateTime<Local>,
    extension: &str,
) -> String {
    let stamp = timestamp.format(TIMESTAMP_FORMAT);
    match stem {
        Some(stem) if !stem.is_empty() => format!("{}_{}_{}.{}", prefix, stem, stamp, extension),
        _ => format!("{}_{}.{}", prefix, stamp, extension),
    }
}

/// Writes the records of `state` to `directory`
///
/// # Arguments
///
/// * `state` - The run whose records are written
/// * `format` - Which files to produce
/// * `directory` - Output directory, created if missing
/// * `prefix` - Leading part of every file name
///
/// # Returns
///
/// * `Ok(paths)` - The files written; empty when there were no records
/// * `Err(OutputError)` - A file could not be created or written
pub fn save_records(
    state: &RunState,
    format: OutputFormat,
    directory: &Path,
    prefix: &str,
) -> OutputResult<Vec<PathBuf>> {
    if state.is_empty() {
        tracing::warn!("No records to save");
        return Ok(Vec::new());
    }

    fs::create_dir_all(directory)?;
    let stem = state.output_stem();
    let now = Local::now();

    let mut written = Vec::new();
    for sink in format.sinks() {
        let path = directory.join(output_file_name(prefix, stem.as_deref(), now, sink.extension()));
        let mut writer = BufWriter::new(File::create(&path)?);
        sink.write_records(state.records(), &mut writer)?;
        writer.flush()?;

        tracing::info!("Saved {} record(s) to {}", state.len(), path.display());
        written.push(path);
    }
    Ok(written)
}
