//! Error types for tabex.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tabex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while locating, normalizing and writing tables.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file does not start with a PDF header.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure or content streams.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error parsing HTML markup.
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// Text could not be decoded.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// A document could not be opened or parsed by its locator.
    #[error("Cannot open {}: {source}", path.display())]
    DocumentOpen {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// A single output artifact could not be written.
    #[error("Cannot write {}: {source}", path.display())]
    TableWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file extension is not one of the supported document kinds.
    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

impl Error {
    /// Wrap an error raised while opening `path`.
    pub fn document_open(path: impl Into<PathBuf>, source: Error) -> Self {
        Error::DocumentOpen {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Whether the batch driver treats this error as a silent skip.
    pub fn is_skip(&self) -> bool {
        matches!(self, Error::UnsupportedFormat(_))
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<lol_html::errors::RewritingError> for Error {
    fn from(err: lol_html::errors::RewritingError) -> Self {
        Error::HtmlParse(err.to_string())
    }
}

/// Serialize an error as its display string.
pub(crate) fn serialize_error<S: serde::Serializer>(
    err: &Error,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(err)
}
