//! Output-side serialization: fixed-schema semicolon-delimited CSV.

use std::{fs, fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::api::UnitRecord;

pub const OUTPUT_DELIMITER: u8 = b';';

pub const OUTPUT_HEADER: [&str; 4] = ["product_number", "unit", "unitname", "quantity"];

/// One output line: a (product number, unit record) pair flattened for CSV.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRow {
    pub product_number: String,
    pub unit: String,
    pub unitname: String,
    pub quantity: String,
}

pub fn to_output_rows(product_number: &str, units: Vec<UnitRecord>) -> Vec<OutputRow> {
    units
        .into_iter()
        .map(|unit| OutputRow {
            product_number: product_number.to_string(),
            unit: unit.unit,
            unitname: unit.name,
            quantity: unit.quantity,
        })
        .collect()
}

/// Writes `rows` to `path`, creating parent directories as needed. The header
/// row is always written, even when there are no data rows.
pub fn write_output_csv(path: &Path, rows: &[OutputRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Creating output directory {parent:?}"))?;
    }
    let file =
        File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(OUTPUT_DELIMITER)
        .has_headers(false)
        .from_writer(BufWriter::new(file));
    writer
        .write_record(OUTPUT_HEADER)
        .context("Writing output header")?;
    for row in rows {
        writer.serialize(row).context("Writing output row")?;
    }
    writer.flush().context("Flushing output file")?;
    Ok(())
}
