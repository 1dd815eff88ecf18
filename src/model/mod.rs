//! Data model shared by the locators, the normalizer and the writer.
//!
//! Every value here is transient: it is built while one document is being
//! processed and dropped once that document's artifacts are written.

mod artifact;
mod document;
mod table;

pub use artifact::{artifact_file_name, OutputArtifact};
pub use document::{Document, DocumentKind};
pub use table::{Cell, NormalizedTable, RawTable};
