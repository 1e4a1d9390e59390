//! Input-side parsing: delimiter sniffing and product-number extraction.
//!
//! Real-world product exports are inconsistently formatted, so reading is
//! best-effort: structured CSV parsing against a prioritized list of known
//! column names first, a bare-value-per-line fallback second.

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use csv::StringRecord;
use log::debug;

/// Delimiters considered during sniffing, in priority order.
const DELIMITER_CANDIDATES: &[u8] = &[b';', b',', b'\t'];

/// Number of bytes sampled from the start of the file for sniffing.
const SNIFF_SAMPLE_BYTES: usize = 4096;

/// Known product-number column headings, highest priority first. Matching is
/// case-insensitive against trimmed header names.
const PRODUCT_COLUMN_NAMES: &[&str] = &[
    "product_number",
    "productnumber",
    "product no",
    "product_no",
    "product nr",
    "productnr",
    "itemnumber",
    "sku",
    "varenummer",
];

/// Picks the delimiter whose occurrence count in `sample` is highest. Ties go
/// to the earlier candidate; a sample without any candidate yields `;`.
pub fn detect_delimiter(sample: &str) -> u8 {
    let mut best = DELIMITER_CANDIDATES[0];
    let mut best_count = 0usize;
    for &candidate in DELIMITER_CANDIDATES {
        let count = sample.bytes().filter(|&b| b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Returns the index of the product-number column for `headers`, or `None`
/// when there are no headers at all. An unrecognized header set falls back to
/// the first column.
pub fn product_number_column(headers: &StringRecord) -> Option<usize> {
    if headers.is_empty() {
        return None;
    }
    let normalized: Vec<String> = headers
        .iter()
        .map(|name| name.trim().to_lowercase())
        .collect();
    for candidate in PRODUCT_COLUMN_NAMES {
        if let Some(index) = normalized.iter().position(|name| name == candidate) {
            return Some(index);
        }
    }
    Some(0)
}

/// Reads the ordered list of product numbers from `path`.
///
/// A missing file is fatal. The delimiter is sniffed from the first bytes
/// unless `delimiter` overrides it. If header-based parsing produces at least
/// one non-empty value those rows win; otherwise every non-empty line that
/// does not look like a header becomes a value, with stray `;`/`,` characters
/// stripped. The returned list may be empty.
pub fn read_product_numbers(path: &Path, delimiter: Option<u8>) -> Result<Vec<String>> {
    if !path.exists() {
        bail!("input file does not exist: {}", path.display());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading input file {path:?}"))?;
    let text = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(sniff_sample(text)));
    debug!(
        "Reading product numbers from {:?} with delimiter '{}'",
        path,
        crate::printable_delimiter(delimiter)
    );

    let values = column_values(text, delimiter)?;
    if !values.is_empty() {
        return Ok(values);
    }
    Ok(bare_line_values(text))
}

fn sniff_sample(text: &str) -> &str {
    let mut end = text.len().min(SNIFF_SAMPLE_BYTES);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn column_values(text: &str, delimiter: u8) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers().context("Reading input headers")?.clone();
    let Some(column) = product_number_column(&headers) else {
        return Ok(Vec::new());
    };

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record.context("Reading input row")?;
        if let Some(value) = record.get(column) {
            let value = value.trim();
            if !value.is_empty() {
                values.push(value.to_string());
            }
        }
    }
    Ok(values)
}

fn bare_line_values(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_matches(|c: char| c == ';' || c == ',')
                .trim()
        })
        .filter(|value| !value.is_empty() && !value.to_lowercase().starts_with("product"))
        .map(str::to_string)
        .collect()
}
