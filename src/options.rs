//! Extraction options and configuration.

use std::path::{Path, PathBuf};

use crate::locate::{LatticeConfig, TableDetectorConfig};

/// Default directory scanned for input documents.
pub const DEFAULT_INPUT_DIR: &str = "input_files";

/// Default directory receiving CSV artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "extracted_tables";

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Directory whose immediate entries are processed
    pub input_dir: PathBuf,

    /// Directory receiving one CSV file per table
    pub output_dir: PathBuf,

    /// How tables are detected in PDF pages
    pub pdf_strategy: PdfStrategy,

    /// Error handling mode for undecodable PDF pages
    pub error_mode: ErrorMode,

    /// What the normalizer does with rows of unequal width
    pub row_policy: RowPolicy,

    /// Text-alignment detector settings
    pub stream: TableDetectorConfig,

    /// Ruling-line detector settings
    pub lattice: LatticeConfig,
}

impl ExtractOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input directory.
    pub fn with_input_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.input_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the PDF detection strategy.
    pub fn with_pdf_strategy(mut self, strategy: PdfStrategy) -> Self {
        self.pdf_strategy = strategy;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail a whole PDF when one of its pages cannot be decoded.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Set the row policy.
    pub fn with_row_policy(mut self, policy: RowPolicy) -> Self {
        self.row_policy = policy;
        self
    }

    /// Pad short rows to the widest row of each table.
    pub fn pad_rows(mut self) -> Self {
        self.row_policy = RowPolicy::PadToWidest;
        self
    }

    /// Set the text-alignment detector configuration.
    pub fn with_stream_config(mut self, config: TableDetectorConfig) -> Self {
        self.stream = config;
        self
    }

    /// Set the ruling-line detector configuration.
    pub fn with_lattice_config(mut self, config: LatticeConfig) -> Self {
        self.lattice = config;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            pdf_strategy: PdfStrategy::Lines,
            error_mode: ErrorMode::Lenient,
            row_policy: RowPolicy::Preserve,
            stream: TableDetectorConfig::default(),
            lattice: LatticeConfig::default(),
        }
    }
}

/// Error handling mode for PDF pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail the document on any page error
    Strict,
    /// Skip undecodable pages and continue
    #[default]
    Lenient,
}

/// Table detection strategy for PDF pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdfStrategy {
    /// Ruling lines first, text alignment when a page has no ruled table
    Auto,
    /// Ruling lines only
    #[default]
    Lines,
    /// Text alignment only
    Text,
}

impl PdfStrategy {
    pub(crate) fn uses_lines(&self) -> bool {
        matches!(self, PdfStrategy::Auto | PdfStrategy::Lines)
    }

    pub(crate) fn uses_text(&self) -> bool {
        matches!(self, PdfStrategy::Auto | PdfStrategy::Text)
    }
}

/// What to do with tables whose rows have different widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowPolicy {
    /// Pass rows through as located
    #[default]
    Preserve,
    /// Pad short rows with empty strings up to the widest row
    PadToWidest,
}
