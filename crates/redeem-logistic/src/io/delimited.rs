//! Delimited text (CSV/TSV) reader producing training rows.
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::data_handling::{Row, Value};

/// Configuration for reading delimited text files.
#[derive(Debug, Clone)]
pub struct DelimitedReaderConfig {
    pub delimiter: u8,
    /// Cells equal to one of these (after trimming) are treated as missing.
    pub missing_values: Vec<String>,
}

impl Default for DelimitedReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            missing_values: vec!["NA".to_string(), "?".to_string()],
        }
    }
}

impl DelimitedReaderConfig {
    /// Tab separated for `.tsv`/`.tab`/`.pin` files, comma otherwise.
    pub fn for_path<P: AsRef<Path>>(path: P) -> Self {
        let delimiter = match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ["tsv", "tab", "pin"].contains(&ext.to_ascii_lowercase().as_str()) => b'\t',
            _ => b',',
        };
        Self {
            delimiter,
            ..Self::default()
        }
    }
}

/// Read a delimited file whose header row names the fields.
///
/// Empty and missing cells are left out of the row; cells that parse as
/// finite numbers become [`Value::Num`], everything else [`Value::Cat`].
pub fn read_delimited_rows<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Vec<Row>> {
    read_delimited_rows_with_config(
        path,
        &DelimitedReaderConfig {
            delimiter,
            ..DelimitedReaderConfig::default()
        },
    )
}

pub fn read_delimited_rows_with_config<P: AsRef<Path>>(
    path: P,
    config: &DelimitedReaderConfig,
) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open data file: {}", path.as_ref().display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().any(String::is_empty) {
        return Err(anyhow!("Header row contains an empty field name"));
    }

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        if record.len() > headers.len() {
            return Err(anyhow!(
                "Row {} has {} fields but the header names {}",
                row_idx + 1,
                record.len(),
                headers.len()
            ));
        }
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, cell)| {
                let cell = cell.trim();
                !cell.is_empty() && !config.missing_values.iter().any(|m| m == cell)
            })
            .map(|(name, cell)| (name.clone(), Value::parse(cell.trim())))
            .collect();
        rows.push(row);
    }
    log::info!("Loaded {} rows from {}", rows.len(), path.as_ref().display());
    Ok(rows)
}
