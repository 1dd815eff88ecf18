//! CSV output for normalized tables.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{serialize_error, Error, Result};
use crate::model::{artifact_file_name, DocumentKind, NormalizedTable, OutputArtifact};

/// Outcome of writing one document's tables.
#[derive(Debug, Default, Serialize)]
pub struct WriteReport {
    /// Artifacts written, in sequence order
    pub written: Vec<OutputArtifact>,
    /// Tables that could not be written
    pub failed: Vec<WriteFailure>,
}

impl WriteReport {
    /// Paths of the written artifacts.
    pub fn paths(&self) -> Vec<&Path> {
        self.written.iter().map(|a| a.path.as_path()).collect()
    }
}

/// A table that could not be written.
#[derive(Debug, Serialize)]
pub struct WriteFailure {
    /// 1-based position of the table within the document
    pub sequence_index: usize,
    /// Target file
    pub path: PathBuf,
    #[serde(serialize_with = "serialize_error")]
    pub error: Error,
}

/// Write each table to its own CSV file under `output_dir`.
///
/// The table at position `i` (1-based) is written to
/// `{base_name}_table_{i}_{kind}_id_{locator_id}.csv`. A table that cannot be
/// written is logged and recorded in the report; the remaining tables are
/// still written. Only failure to create `output_dir` is returned as an error.
pub fn write_tables(
    base_name: &str,
    tables: &[NormalizedTable],
    kind: DocumentKind,
    output_dir: &Path,
) -> Result<WriteReport> {
    fs::create_dir_all(output_dir)?;

    let mut report = WriteReport::default();

    for (i, table) in tables.iter().enumerate() {
        let sequence_index = i + 1;
        let path = output_dir.join(artifact_file_name(
            base_name,
            sequence_index,
            kind,
            table.locator_id,
        ));

        match fs::write(&path, to_csv(table)) {
            Ok(()) => {
                log::info!("Saved table {} to {}", sequence_index, path.display());
                report.written.push(OutputArtifact {
                    path,
                    sequence_index,
                    locator_id: table.locator_id,
                    kind,
                    rows: table.row_count(),
                });
            }
            Err(source) => {
                let error = Error::TableWrite {
                    path: path.clone(),
                    source,
                };
                log::warn!("{}", error);
                report.failed.push(WriteFailure {
                    sequence_index,
                    path,
                    error,
                });
            }
        }
    }

    Ok(report)
}

/// Render a table as CSV: comma separated, `\n` line endings, no header.
///
/// ```
/// use tabex::{write::to_csv, NormalizedTable};
///
/// let table = NormalizedTable {
///     locator_id: 1,
///     rows: vec![vec!["a,b".into(), "c".into()]],
/// };
/// assert_eq!(to_csv(&table), "\"a,b\",c\n");
/// ```
pub fn to_csv(table: &NormalizedTable) -> String {
    let mut out = String::new();

    for row in &table.rows {
        // A lone empty field is quoted so the row is not read back as blank
        if let [only] = row.as_slice() {
            if only.is_empty() {
                out.push_str("\"\"\n");
                continue;
            }
        }

        let fields: Vec<String> = row.iter().map(|f| escape_csv_field(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

/// Quote a field when it contains a separator, quote or line break.
pub fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
