//! Run statistics
//!
//! This module summarizes an accumulated run and prints the summary the
//! binary shows after every traversal.

use crate::extract::ProductRecord;
use crate::state::RunState;
use chrono::Utc;

/// Summary of one run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of accumulated records
    pub records: usize,

    /// Category paths traversed, in visit order
    pub categories: Vec<String>,

    /// Detail URLs skipped after fetch or parse failures
    pub skipped_urls: usize,

    /// Category targets that failed as a whole, with the reason
    pub failed_targets: Vec<(String, String)>,

    /// Seconds since the run started
    pub duration_seconds: i64,

    /// Records with a non-empty value, per text field
    pub field_fill: Vec<(&'static str, usize)>,

    pub with_price: usize,
    pub with_rating: usize,
    pub with_images: usize,
}

impl RunSummary {
    /// Summarizes `state` as of now
    pub fn from_state(state: &RunState) -> Self {
        let records = state.records();
        Self {
            records: records.len(),
            categories: state.visited().iter().map(|t| t.display_path()).collect(),
            skipped_urls: state.skipped().len(),
            failed_targets: state
                .failed_targets()
                .iter()
                .map(|f| (f.target.clone(), f.reason.clone()))
                .collect(),
            duration_seconds: (Utc::now() - state.started_at()).num_seconds(),
            field_fill: field_fill(records),
            with_price: records.iter().filter(|r| r.price > 0.0).count(),
            with_rating: records.iter().filter(|r| r.rating > 0.0).count(),
            with_images: records.iter().filter(|r| !r.images.is_empty()).count(),
        }
    }

    /// Percentage of detail pages that produced a record
    pub fn success_rate(&self) -> f64 {
        let attempted = self.records + self.skipped_urls;
        if attempted == 0 {
            return 0.0;
        }
        (self.records as f64 / attempted as f64) * 100.0
    }

    /// Percentage of records for which `count` holds
    pub fn rate(&self, count: usize) -> f64 {
        if self.records == 0 {
            return 0.0;
        }
        (count as f64 / self.records as f64) * 100.0
    }
}

fn field_fill(records: &[ProductRecord]) -> Vec<(&'static str, usize)> {
    let Some(first) = records.first() else {
        return Vec::new();
    };

    let mut fill: Vec<(&'static str, usize)> =
        first.text_fields().iter().map(|(name, _)| (*name, 0)).collect();
    for record in records {
        for (slot, (_, value)) in fill.iter_mut().zip(record.text_fields()) {
            if !value.is_empty() {
                slot.1 += 1;
            }
        }
    }
    fill
}

/// Prints the run summary to stdout
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Overview:");
    println!("  Records: {}", summary.records);
    println!("  Categories visited: {}", summary.categories.len());
    println!("  Skipped URLs: {}", summary.skipped_urls);
    println!("  Duration: {}s", summary.duration_seconds);
    println!();

    if !summary.categories.is_empty() {
        println!("Categories:");
        for category in &summary.categories {
            println!("  - {}", category);
        }
        println!();
    }

    if !summary.failed_targets.is_empty() {
        println!("Failed Categories ({}):", summary.failed_targets.len());
        for (target, reason) in &summary.failed_targets {
            println!("  - {}: {}", target, reason);
        }
        println!();
    }

    if summary.records > 0 {
        println!("Field Coverage:");
        println!("  price: {:.1}%", summary.rate(summary.with_price));
        println!("  rating: {:.1}%", summary.rate(summary.with_rating));
        println!("  images: {:.1}%", summary.rate(summary.with_images));
        for (name, filled) in &summary.field_fill {
            println!("  {}: {:.1}%", name, summary.rate(*filled));
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} detail pages harvested)",
        summary.success_rate(),
        summary.records,
        summary.records + summary.skipped_urls
    );
}
