//! CSV parsing and import preview for the place directory
//!
//! The parser turns raw file text into header-keyed row mappings; the
//! preview runs the normalizer over every parsed row without touching
//! the datastore, so the UI can show counts before an admin confirms.

use std::collections::HashMap;

use csv::{ReaderBuilder, Trim};
use tracing::debug;

use crate::error::Result;
use crate::models::ImportRow;
use crate::normalize::normalize_row;

/// One parsed CSV data row, keyed by lowercased header name
pub type RawRow = HashMap<String, String>;

/// Headers a usable import file must carry (case-insensitive)
pub const REQUIRED_HEADERS: [&str; 3] = ["city", "type", "name"];

/// Default number of rows shown in an import preview
pub const DEFAULT_PREVIEW_LIMIT: usize = 10;

/// Parse CSV text into one mapping per data row.
///
/// - strips a leading UTF-8 byte-order-mark
/// - RFC-4180 quoting: embedded commas/newlines, doubled quotes
/// - headers are lowercased and trimmed; blank header cells are dropped
///   and their column excluded from every row mapping
/// - rows whose cells are all empty are skipped
/// - ragged rows default missing cells to the empty string
pub fn parse_rows(text: &str) -> Result<Vec<RawRow>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<Option<String>> = reader
        .headers()?
        .iter()
        .map(|h| {
            let key = h.trim().to_lowercase();
            if key.is_empty() {
                None
            } else {
                Some(key)
            }
        })
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut row = RawRow::with_capacity(headers.len());
        for (idx, key) in headers.iter().enumerate() {
            if let Some(key) = key {
                row.insert(key.clone(), record.get(idx).unwrap_or("").to_string());
            }
        }
        rows.push(row);
    }

    debug!("Parsed {} CSV rows", rows.len());
    Ok(rows)
}

/// True when the parsed rows carry every header in [`REQUIRED_HEADERS`].
/// An empty row set passes; a file with no data rows is reported
/// downstream as a no-valid-rows failure, not a header problem.
pub fn has_required_headers(rows: &[RawRow]) -> bool {
    match rows.first() {
        Some(first) => REQUIRED_HEADERS.iter().all(|h| first.contains_key(*h)),
        None => true,
    }
}

/// Result of a dry normalization pass over parsed rows
#[derive(Debug, Clone)]
pub struct ImportPreview {
    /// First `limit` normalized rows in file order, valid or not
    pub preview_rows: Vec<ImportRow>,
    /// Every valid row, in file order
    pub valid_rows: Vec<ImportRow>,
    pub importable_count: usize,
    pub skipped_count: usize,
}

/// Normalize every row and split valid from invalid. Side-effect free:
/// this is the only call the UI needs before the user confirms an import.
pub fn preview(rows: &[RawRow], limit: usize) -> ImportPreview {
    let normalized: Vec<ImportRow> = rows
        .iter()
        .enumerate()
        .map(|(i, raw)| normalize_row(raw, i + 1))
        .collect();

    let valid_rows: Vec<ImportRow> = normalized.iter().filter(|r| r.valid).cloned().collect();
    let importable_count = valid_rows.len();
    let skipped_count = normalized.len() - importable_count;

    // Slice before filtering: invalid rows must stay visible in the preview
    let preview_rows = normalized.into_iter().take(limit).collect();

    ImportPreview {
        preview_rows,
        valid_rows,
        importable_count,
        skipped_count,
    }
}
