//! CSV files as import input.
//!
//! The header row names the fields. Numeric cells become JSON numbers,
//! empty cells are left out, and rows that fail to parse are counted and
//! skipped rather than failing the whole file.

use std::path::Path;

use serde_json::{Map, Number, Value};

use millbook_core::{CoreError, FileParser, ParsedFile};

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_file(&self, path: &Path) -> Result<ParsedFile, CoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| CoreError::Import {
                message: format!("cannot read {}: {e}", path.display()),
            })?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| CoreError::Import {
                message: format!("cannot read header row of {}: {e}", path.display()),
            })?
            .iter()
            .map(|h| h.trim_matches('\u{feff}').to_owned())
            .collect();

        let mut parsed = ParsedFile::default();
        for (idx, record) in reader.records().enumerate() {
            // Header is line 1
            let line = idx + 2;
            parsed.stats.total_rows += 1;
            match record {
                Ok(record) => {
                    let object: Map<String, Value> = headers
                        .iter()
                        .zip(record.iter())
                        .filter(|(header, cell)| !header.is_empty() && !cell.is_empty())
                        .map(|(header, cell)| (header.clone(), cell_value(cell)))
                        .collect();
                    if object.is_empty() {
                        parsed.stats.failed_rows += 1;
                        parsed.stats.error_details.push(format!("row {line}: empty"));
                        continue;
                    }
                    parsed.data.push(Value::Object(object));
                    parsed.stats.success_rows += 1;
                }
                Err(e) => {
                    parsed.stats.failed_rows += 1;
                    parsed.stats.error_details.push(format!("row {line}: {e}"));
                }
            }
        }
        tracing::debug!(
            path = %path.display(),
            rows = parsed.stats.total_rows,
            failed = parsed.stats.failed_rows,
            "parsed CSV"
        );
        Ok(parsed)
    }
}

fn cell_value(cell: &str) -> Value {
    // Phone numbers and codes keep their leading zero
    let leading_zero = cell.len() > 1 && cell.starts_with('0') && !cell.starts_with("0.");
    if !leading_zero {
        if let Ok(n) = cell.parse::<i64>() {
            return Value::Number(n.into());
        }
        let numeric = cell.bytes().all(|b| b.is_ascii_digit() || b == b'.' || b == b'-');
        if let Some(n) = numeric
            .then(|| cell.parse::<f64>().ok())
            .flatten()
            .and_then(Number::from_f64)
        {
            return Value::Number(n);
        }
    }
    Value::String(cell.to_owned())
}
