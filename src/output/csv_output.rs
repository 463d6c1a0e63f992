//! Flat tabular output
//!
//! Columns follow the serialized field order of [`ProductRecord`]; the image
//! list is joined into one cell.

use crate::extract::ProductRecord;
use crate::output::traits::{OutputResult, RecordSink};
use serde_json::Value;
use std::io::Write;

/// Separator of the images cell
pub const IMAGE_SEPARATOR: &str = "|";

/// CSV with a header row
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSink;

/// Column names and cells of one record
fn row(record: &ProductRecord) -> OutputResult<Vec<(String, String)>> {
    let Value::Object(fields) = serde_json::to_value(record)? else {
        return Ok(Vec::new());
    };

    Ok(fields.into_iter().map(|(name, value)| (name, cell(value))).collect())
}

fn cell(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Array(items) => items
            .into_iter()
            .map(cell)
            .collect::<Vec<_>>()
            .join(IMAGE_SEPARATOR),
        other => other.to_string(),
    }
}

impl RecordSink for CsvSink {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write_records(&self, records: &[ProductRecord], writer: &mut dyn Write) -> OutputResult<()> {
        let mut csv = csv::Writer::from_writer(writer);

        for (index, record) in records.iter().enumerate() {
            let cells = row(record)?;
            if index == 0 {
                csv.write_record(cells.iter().map(|(name, _)| name.as_str()))?;
            }
            csv.write_record(cells.iter().map(|(_, value)| value.as_str()))?;
        }

        csv.flush()?;
        Ok(())
    }
}
