// ── Spreadsheet import contract ──
//
// File parsing is an external collaborator. The core only consumes its
// output: the parsed rows plus statistics for the success notice.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;

/// How a parse went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub total_rows: usize,
    pub success_rows: usize,
    pub failed_rows: usize,
    pub error_details: Vec<String>,
}

impl ImportStats {
    /// One-line summary for notifications.
    pub fn summary(&self) -> String {
        let mut summary = format!("{} of {} rows imported", self.success_rows, self.total_rows);
        if self.failed_rows > 0 {
            summary.push_str(&format!(", {} skipped", self.failed_rows));
        }
        summary
    }
}

/// Output of a file parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFile {
    pub data: Vec<Value>,
    pub stats: ImportStats,
}

/// `parse_file(file) -> rows`.
pub trait FileParser: Send + Sync {
    fn parse_file(&self, path: &Path) -> Result<ParsedFile, CoreError>;
}
