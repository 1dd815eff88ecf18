//! # tabex
//!
//! Table extraction from PDF and HTML documents to CSV.
//!
//! Every document in an input directory is run through three steps:
//!
//! 1. a [`TableLocator`] finds raw tables (PDF pages are analyzed for ruling
//!    lines and text alignment, HTML is streamed for `<table>` elements),
//! 2. [`normalize`] turns each table into a grid of strings,
//! 3. [`write_tables`] writes one CSV file per table.
//!
//! Failures are contained per document; see [`run`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use tabex::ExtractOptions;
//!
//! fn main() -> tabex::Result<()> {
//!     let options = ExtractOptions::new()
//!         .with_input_dir("input_files")
//!         .with_output_dir("extracted_tables");
//!
//!     let report = tabex::run(&options)?;
//!     for artifact in report.artifacts() {
//!         println!("{}", artifact.path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Artifacts are named `{base}_table_{n}_{kind}_id_{id}.csv`, where `n` counts
//! tables within the document and `id` is the page number (PDF) or the
//! table's position in the markup (HTML).

pub mod batch;
pub mod detect;
pub mod error;
pub mod locate;
pub mod model;
pub mod normalize;
pub mod options;
pub mod write;

pub use batch::{
    list_input_files, process_file, run, run_with_progress, BatchProgress, BatchReport,
    BatchSummary, FileOutcome, FileReport,
};
pub use error::{Error, Result};
pub use locate::{
    HtmlLocator, LatticeConfig, LocatorRegistry, PdfLocator, TableDetectorConfig, TableLocator,
};
pub use model::{
    artifact_file_name, Cell, Document, DocumentKind, NormalizedTable, OutputArtifact, RawTable,
};
pub use normalize::{normalize, normalize_with};
pub use options::{
    ErrorMode, ExtractOptions, PdfStrategy, RowPolicy, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR,
};
pub use write::{write_tables, WriteFailure, WriteReport};

use std::path::Path;

/// Locate the tables of a single file with the default locators.
///
/// # Example
///
/// ```no_run
/// let tables = tabex::locate_file("report.pdf").unwrap();
/// println!("{} tables", tables.len());
/// ```
pub fn locate_file<P: AsRef<Path>>(path: P) -> Result<Vec<RawTable>> {
    let document = Document::from_path(path.as_ref())?;
    LocatorRegistry::default().locate(&document)
}

/// Locate the tables of an in-memory document of the given kind.
pub fn locate_bytes(data: &[u8], kind: DocumentKind) -> Result<Vec<RawTable>> {
    match kind {
        DocumentKind::Pdf => PdfLocator::new().locate_bytes(data),
        DocumentKind::Html => HtmlLocator::new().locate_bytes(data),
    }
}
