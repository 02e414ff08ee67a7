//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Rows carry no fixed
//! schema, so tables are built column-by-column from the ledger's summary
//! fields; structured formats serialize the rows as the server sent them.

use std::io::{self, Write};

use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use millbook_core::{PaginationMeta, Row};

use crate::cli::OutputFormat;
use crate::error::CliError;

#[derive(Serialize)]
struct ListOutput<'a> {
    data: &'a [Row],
    pagination: &'a PaginationMeta,
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render one page of rows.
///
/// - `table`: `ID` followed by `columns`
/// - `json` / `json-compact` / `yaml`: `{data, pagination}`
/// - `plain`: one id per line
pub fn render_rows(
    format: &OutputFormat,
    rows: &[Row],
    columns: &[&str],
    pagination: &PaginationMeta,
) -> Result<String, CliError> {
    let doc = ListOutput {
        data: rows,
        pagination,
    };
    match format {
        OutputFormat::Table => Ok(render_table(rows, columns)),
        OutputFormat::Json => render_json(&doc, false),
        OutputFormat::JsonCompact => render_json(&doc, true),
        OutputFormat::Yaml => render_yaml(&doc),
        OutputFormat::Plain => Ok(rows.iter().map(row_id).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single record. Tables show one `field: value` line per field.
pub fn render_row(format: &OutputFormat, row: &Row) -> Result<String, CliError> {
    render_single(format, row, detail, row_id)
}

/// Render a single serde-serializable item in the chosen format.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// "Showing 11-20 of 42 (page 2/5)" for the footer under a table.
pub fn pagination_footer(meta: &PaginationMeta) -> String {
    if meta.total == 0 {
        return "No records".into();
    }
    format!(
        "Showing {}-{} of {} (page {}/{})",
        meta.first_row(),
        meta.last_row(),
        meta.total,
        meta.page,
        meta.total_pages
    )
}

// ── Format-specific renderers ────────────────────────────────────────

fn row_id(row: &Row) -> String {
    row.id().map(ToString::to_string).unwrap_or_default()
}

fn render_table(rows: &[Row], columns: &[&str]) -> String {
    let mut builder = Builder::default();
    builder.push_record(std::iter::once("ID").chain(columns.iter().copied()));
    for row in rows {
        builder.push_record(
            std::iter::once(row_id(row)).chain(columns.iter().map(|c| row.display_field(c))),
        );
    }
    builder.build().with(Style::rounded()).to_string()
}

fn detail(row: &Row) -> String {
    let width = row.fields().keys().map(String::len).max().unwrap_or(0);
    row.fields()
        .keys()
        .map(|key| format!("{key:<width$}  {}", row.display_field(key)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let text = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(text)
}

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Internal(format!("YAML output failed: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows() -> Vec<Row> {
        vec![
            Row::from_value(json!({"_id": "b1", "name": "Suresh", "phone": "98480"})),
            Row::from_value(json!({"_id": "b2", "name": "Ravi", "commissionRate": 1.5})),
        ]
    }

    #[test]
    fn table_has_id_and_summary_columns() {
        let out = render_rows(
            &OutputFormat::Table,
            &rows(),
            &["name", "commissionRate"],
            &PaginationMeta::default(),
        )
        .unwrap();
        assert!(out.contains("ID"));
        assert!(out.contains("commissionRate"));
        assert!(out.contains("Suresh"));
        assert!(out.contains("1.5"));
    }

    #[test]
    fn plain_prints_ids() {
        let out = render_rows(&OutputFormat::Plain, &rows(), &[], &PaginationMeta::default()).unwrap();
        assert_eq!(out, "b1\nb2");
    }

    #[test]
    fn json_wraps_rows_with_pagination() {
        let meta = PaginationMeta {
            page: 1,
            limit: 10,
            total: 2,
            total_pages: 1,
            ..PaginationMeta::default()
        };
        let out = render_rows(&OutputFormat::JsonCompact, &rows(), &[], &meta).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["data"][1]["_id"], "b2");
        assert_eq!(parsed["pagination"]["totalPages"], 1);
    }

    #[test]
    fn footer_describes_the_page() {
        let meta = PaginationMeta {
            page: 2,
            limit: 10,
            total: 42,
            total_pages: 5,
            ..PaginationMeta::default()
        };
        assert_eq!(pagination_footer(&meta), "Showing 11-20 of 42 (page 2/5)");
        assert_eq!(pagination_footer(&PaginationMeta::default()), "No records");
    }
}
