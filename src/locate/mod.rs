//! Table locators: find raw tables in source documents.
//!
//! Each supported [`DocumentKind`] has a [`TableLocator`]. The
//! [`LocatorRegistry`] maps file extensions to locators and wraps any failure
//! to open or parse a document in [`Error::DocumentOpen`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use tabex::locate::{HtmlLocator, TableLocator};
//!
//! fn main() -> tabex::Result<()> {
//!     let tables = HtmlLocator::new().locate(Path::new("report.html"))?;
//!     for table in &tables {
//!         println!("table {} has {} rows", table.locator_id, table.row_count());
//!     }
//!     Ok(())
//! }
//! ```

mod html;
mod lattice;
mod layout;
mod pdf;
mod table_detector;

pub use html::HtmlLocator;
pub use lattice::{CellBox, LatticeConfig, LatticeDetector, LatticeTable};
pub use layout::{
    group_into_lines, Edge, Orientation, PageAnalyzer, PageContent, TextLine, TextSpan,
};
pub use pdf::PdfLocator;
pub use table_detector::{DetectedTable, TableDetector, TableDetectorConfig, TableRowData};

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{Document, DocumentKind, RawTable};
use crate::options::ExtractOptions;

/// Trait for table locators.
///
/// Implement this trait to add support for a new document kind.
pub trait TableLocator: Send + Sync {
    /// The document kind this locator handles.
    fn kind(&self) -> DocumentKind;

    /// Get the name of this locator.
    fn name(&self) -> &str;

    /// Locate tables in the file at `path`, in document order.
    fn locate(&self, path: &Path) -> Result<Vec<RawTable>>;

    /// Locate tables in an in-memory document.
    fn locate_bytes(&self, data: &[u8]) -> Result<Vec<RawTable>>;

    /// Check if this locator handles the given extension (case-insensitive).
    fn supports_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case(self.kind().extension())
    }
}

/// Registry of table locators keyed by file extension.
pub struct LocatorRegistry {
    locators: HashMap<String, Arc<dyn TableLocator>>,
}

impl LocatorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            locators: HashMap::new(),
        }
    }

    /// Create a registry with the PDF and HTML locators configured from `options`.
    pub fn with_defaults(options: &ExtractOptions) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfLocator::from_options(options)));
        registry.register(Arc::new(HtmlLocator::new()));
        registry
    }

    /// Register a locator, replacing any locator for the same extension.
    pub fn register(&mut self, locator: Arc<dyn TableLocator>) {
        self.locators
            .insert(locator.kind().extension().to_string(), locator);
    }

    /// Get the locator for a document kind.
    pub fn get(&self, kind: DocumentKind) -> Option<Arc<dyn TableLocator>> {
        self.locators.get(kind.extension()).cloned()
    }

    /// Get a locator by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn TableLocator>> {
        self.locators.get(&ext.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.locators.contains_key(&ext.to_lowercase())
    }

    /// Locate the tables of a document with the matching locator.
    pub fn locate(&self, document: &Document) -> Result<Vec<RawTable>> {
        let locator = self
            .get(document.kind)
            .ok_or_else(|| Error::UnsupportedFormat(document.path.clone()))?;

        log::debug!(
            "Locating tables in {} with {} locator",
            document.path.display(),
            locator.name()
        );

        locator
            .locate(&document.path)
            .map_err(|e| Error::document_open(&document.path, e))
    }
}

impl Default for LocatorRegistry {
    fn default() -> Self {
        Self::with_defaults(&ExtractOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_registry_with_defaults() {
        let registry = LocatorRegistry::default();
        assert!(registry.supports("pdf"));
        assert!(registry.supports("HTML"));
        assert!(!registry.supports("htm"));
        assert!(!registry.supports("docx"));
    }

    #[test]
    fn test_registry_get() {
        let registry = LocatorRegistry::default();
        assert_eq!(registry.get(DocumentKind::Pdf).unwrap().name(), "PDF");
        assert_eq!(registry.get_by_extension("Html").unwrap().name(), "HTML");
    }

    #[test]
    fn test_supports_extension() {
        assert!(HtmlLocator::new().supports_extension("HTML"));
        assert!(!HtmlLocator::new().supports_extension("pdf"));
        assert!(PdfLocator::new().supports_extension("Pdf"));
    }

    #[test]
    fn test_empty_registry_rejects_document() {
        let registry = LocatorRegistry::new();
        let document = Document::new("a.pdf", DocumentKind::Pdf);
        assert!(matches!(
            registry.locate(&document),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_locate_wraps_open_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"not a pdf at all").unwrap();

        let registry = LocatorRegistry::default();
        let err = registry
            .locate(&Document::new(&path, DocumentKind::Pdf))
            .unwrap_err();

        match err {
            Error::DocumentOpen { path: p, source } => {
                assert_eq!(p, path);
                assert!(matches!(*source, Error::UnknownFormat));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
