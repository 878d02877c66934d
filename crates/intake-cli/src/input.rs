//! Reading intake requests from disk.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use intake_model::{CellValue, IntakeRequest, RawTable};

/// Loads a request from a `.csv` extract or a JSON request document.
pub fn load_request(path: &Path) -> Result<IntakeRequest> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        return read_csv_table(path).map(IntakeRequest::new);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("read request: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse request: {}", path.display()))
}

/// Reads a CSV extract: header row plus text cells, blank cells empty.
///
/// Ragged rows are accepted; short rows read as empty past their end.
pub fn read_csv_table(path: &Path) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("read csv: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("read headers: {}", path.display()))?
        .iter()
        .map(|header| header.trim_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("read record: {}", path.display()))?;
        rows.push(
            record
                .iter()
                .map(|value| {
                    if value.trim().is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::from(value)
                    }
                })
                .collect(),
        );
    }
    Ok(RawTable::new(headers, rows))
}

/// Reads canned suggestion text for the static provider.
pub fn read_suggestions(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read suggestions: {}", path.display()))
}
