//! JSON and JSON Lines sinks

use crate::extract::ProductRecord;
use crate::output::traits::{OutputResult, RecordSink};
use std::io::Write;

/// Pretty-printed JSON array
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSink;

impl RecordSink for JsonSink {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write_records(&self, records: &[ProductRecord], writer: &mut dyn Write) -> OutputResult<()> {
        serde_json::to_writer_pretty(&mut *writer, records)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// One compact JSON object per line
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlSink;

impl RecordSink for JsonlSink {
    fn extension(&self) -> &'static str {
        "jsonl"
    }

    fn write_records(&self, records: &[ProductRecord], writer: &mut dyn Write) -> OutputResult<()> {
        for record in records {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}
