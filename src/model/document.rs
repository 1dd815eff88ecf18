//! Source documents and their kinds.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kind of a source document, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Portable Document Format
    Pdf,
    /// HTML markup
    Html,
}

impl DocumentKind {
    /// Map a file extension (without the dot, any case) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "html" => Some(DocumentKind::Html),
            _ => None,
        }
    }

    /// Lowercase tag used in artifact names and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Html => "html",
        }
    }

    /// The file extension handled by this kind.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source document: a path plus its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path to the file
    pub path: PathBuf,
    /// Kind derived from the extension
    pub kind: DocumentKind,
}

impl Document {
    /// Create a document with an explicit kind.
    pub fn new(path: impl Into<PathBuf>, kind: DocumentKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Create a document, deriving its kind from the extension.
    ///
    /// Fails with [`Error::UnsupportedFormat`] for unrecognized extensions.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match crate::detect::detect_kind(&path) {
            Some(kind) => Ok(Self { path, kind }),
            None => Err(Error::UnsupportedFormat(path)),
        }
    }

    /// File name without its extension, used as the artifact prefix.
    pub fn base_name(&self) -> String {
        base_name_of(&self.path)
    }
}

/// File stem of a path, lossily converted; empty when the path has none.
fn base_name_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_extension("pdf"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_extension("HTML"), Some(DocumentKind::Html));
        assert_eq!(DocumentKind::from_extension("txt"), None);
        assert_eq!(DocumentKind::from_extension(""), None);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(DocumentKind::Pdf.to_string(), "pdf");
        assert_eq!(DocumentKind::Html.to_string(), "html");
    }

    #[test]
    fn test_document_from_path() {
        let doc = Document::from_path("input/Quarterly.Report.PDF").unwrap();
        assert_eq!(doc.kind, DocumentKind::Pdf);
        assert_eq!(doc.base_name(), "Quarterly.Report");

        let err = Document::from_path("input/notes.txt").unwrap_err();
        assert!(err.is_skip());
    }
}
