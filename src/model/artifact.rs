//! Output artifacts.

use std::path::PathBuf;

use serde::Serialize;

use super::DocumentKind;

/// A CSV file written for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputArtifact {
    /// Where the file was written
    pub path: PathBuf,
    /// 1-based position of the table within its document's batch
    pub sequence_index: usize,
    /// Locator id of the source table
    pub locator_id: u32,
    /// Kind of the source document
    pub kind: DocumentKind,
    /// Number of rows written
    pub rows: usize,
}

/// Build the artifact file name for a table.
///
/// ```
/// use tabex::{artifact_file_name, DocumentKind};
///
/// assert_eq!(
///     artifact_file_name("report", 2, DocumentKind::Pdf, 7),
///     "report_table_2_pdf_id_7.csv"
/// );
/// ```
pub fn artifact_file_name(
    base_name: &str,
    sequence_index: usize,
    kind: DocumentKind,
    locator_id: u32,
) -> String {
    format!(
        "{}_table_{}_{}_id_{}.csv",
        base_name,
        sequence_index,
        kind.as_str(),
        locator_id
    )
}
