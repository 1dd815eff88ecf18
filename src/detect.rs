//! Document kind detection and PDF header validation.

use crate::error::{Error, Result};
use crate::model::DocumentKind;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"
const HEADER_LEN: u64 = 16;

/// Determine the document kind from a path's extension (case-insensitive).
///
/// Returns `None` for any extension other than `pdf` and `html`.
///
/// # Example
/// ```
/// use tabex::detect::detect_kind;
/// use tabex::DocumentKind;
///
/// assert_eq!(detect_kind("report.PDF"), Some(DocumentKind::Pdf));
/// assert_eq!(detect_kind("notes.txt"), None);
/// ```
pub fn detect_kind<P: AsRef<Path>>(path: P) -> Option<DocumentKind> {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .and_then(DocumentKind::from_extension)
}

/// Validate the PDF header of a file and return its version (e.g. "1.7").
pub fn detect_pdf_version_from_path<P: AsRef<Path>>(path: P) -> Result<String> {
    let file = File::open(path)?;
    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    file.take(HEADER_LEN).read_to_end(&mut header)?;
    detect_pdf_version(&header)
}

/// Validate a PDF header from bytes and return its version.
///
/// # Returns
/// * `Ok(version)` if the data starts with a valid PDF header
/// * `Err(Error::UnknownFormat)` if the data is not a PDF
pub fn detect_pdf_version(data: &[u8]) -> Result<String> {
    if data.len() < PDF_MAGIC_LEN + VERSION_LEN {
        return Err(Error::UnknownFormat);
    }

    if !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(version)
}

/// Check if a version string looks like "1.0" .. "2.0".
fn is_valid_version(version: &str) -> bool {
    if version.len() != 3 {
        return false;
    }

    let chars: Vec<char> = version.chars().collect();
    chars[0].is_ascii_digit() && chars[1] == '.' && chars[2].is_ascii_digit()
}
