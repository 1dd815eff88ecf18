//! Batch driver: locate, normalize and write the tables of every document in
//! a directory.
//!
//! Failures are contained per file. Only an unreadable input directory or an
//! output directory that cannot be created stops a run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{serialize_error, Error, Result};
use crate::locate::LocatorRegistry;
use crate::model::{Document, DocumentKind, NormalizedTable, OutputArtifact};
use crate::normalize::normalize_with;
use crate::options::ExtractOptions;
use crate::write::{write_tables, WriteFailure};

/// What happened to one input file.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Tables were found; some or all of them were written
    Extracted {
        /// Number of tables located
        tables: usize,
        /// Artifacts written, in sequence order
        artifacts: Vec<OutputArtifact>,
        /// Tables that could not be written
        failures: Vec<WriteFailure>,
    },
    /// The document was read but holds no tables
    NoTables,
    /// The file is not a supported document kind
    Skipped,
    /// The document could not be processed
    Failed {
        #[serde(serialize_with = "serialize_error")]
        error: Error,
    },
}

/// Report for one input file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    /// `None` for skipped files
    pub kind: Option<DocumentKind>,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

impl FileReport {
    /// Artifacts written for this file.
    pub fn artifacts(&self) -> &[OutputArtifact] {
        match &self.outcome {
            FileOutcome::Extracted { artifacts, .. } => artifacts,
            _ => &[],
        }
    }

    /// Check if the file failed as a whole.
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, FileOutcome::Failed { .. })
    }
}

/// Progress event passed to [`run_with_progress`] callbacks.
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress<'a> {
    /// 1-based position of the file in the run
    pub current: usize,
    /// Number of files in the run
    pub total: usize,
    pub file: &'a FileReport,
}

/// Report for a whole run, files in processing order.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

/// Aggregate counts of a [`BatchReport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub files: usize,
    pub extracted: usize,
    pub no_tables: usize,
    pub skipped: usize,
    pub failed: usize,
    pub artifacts: usize,
    pub write_failures: usize,
}

impl BatchReport {
    /// Count files per outcome.
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            files: self.files.len(),
            ..Default::default()
        };

        for file in &self.files {
            match &file.outcome {
                FileOutcome::Extracted {
                    artifacts,
                    failures,
                    ..
                } => {
                    summary.extracted += 1;
                    summary.artifacts += artifacts.len();
                    summary.write_failures += failures.len();
                }
                FileOutcome::NoTables => summary.no_tables += 1,
                FileOutcome::Skipped => summary.skipped += 1,
                FileOutcome::Failed { .. } => summary.failed += 1,
            }
        }

        summary
    }

    /// All artifacts written during the run.
    pub fn artifacts(&self) -> impl Iterator<Item = &OutputArtifact> {
        self.files.iter().flat_map(|f| f.artifacts().iter())
    }

    /// Files that failed as a whole.
    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.is_failed())
    }

    /// Pretty-printed JSON with the summary followed by the file reports.
    pub fn to_json(&self) -> Result<String> {
        #[derive(Serialize)]
        struct JsonReport<'a> {
            summary: BatchSummary,
            files: &'a [FileReport],
        }

        serde_json::to_string_pretty(&JsonReport {
            summary: self.summary(),
            files: &self.files,
        })
        .map_err(|e| Error::Encoding(e.to_string()))
    }
}

/// Process every file in `options.input_dir`.
///
/// # Example
///
/// ```no_run
/// use tabex::ExtractOptions;
///
/// let options = ExtractOptions::new()
///     .with_input_dir("docs")
///     .with_output_dir("tables");
/// let report = tabex::run(&options)?;
/// println!("{} tables written", report.summary().artifacts);
/// # Ok::<(), tabex::Error>(())
/// ```
pub fn run(options: &ExtractOptions) -> Result<BatchReport> {
    run_with_progress(options, |_| {})
}

/// Process every file in `options.input_dir`, reporting each file as soon as
/// it is done.
pub fn run_with_progress<F>(options: &ExtractOptions, mut on_file: F) -> Result<BatchReport>
where
    F: FnMut(BatchProgress<'_>),
{
    fs::create_dir_all(&options.output_dir)?;
    let paths = list_input_files(&options.input_dir)?;
    let registry = LocatorRegistry::with_defaults(options);

    log::info!(
        "Processing {} files from {}",
        paths.len(),
        options.input_dir.display()
    );

    let total = paths.len();
    let mut report = BatchReport::default();

    for (i, path) in paths.into_iter().enumerate() {
        let file = process_with(&registry, path, options);
        on_file(BatchProgress {
            current: i + 1,
            total,
            file: &file,
        });
        report.files.push(file);
    }

    let summary = report.summary();
    log::info!(
        "Done: {} files, {} tables written, {} skipped, {} failed",
        summary.files,
        summary.artifacts,
        summary.skipped,
        summary.failed
    );

    Ok(report)
}

/// Process a single document into `options.output_dir`.
pub fn process_file(path: impl AsRef<Path>, options: &ExtractOptions) -> FileReport {
    let registry = LocatorRegistry::with_defaults(options);
    process_with(&registry, path.as_ref().to_path_buf(), options)
}

/// Regular files directly inside `dir`, sorted by file name.
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            paths.push(path);
        } else {
            log::debug!("Ignoring non-file entry {}", path.display());
        }
    }

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

fn process_with(registry: &LocatorRegistry, path: PathBuf, options: &ExtractOptions) -> FileReport {
    let document = match Document::from_path(&path) {
        Ok(document) => document,
        Err(e) => {
            if e.is_skip() {
                log::info!("Skipping unsupported file {}", path.display());
                return FileReport {
                    path,
                    kind: None,
                    outcome: FileOutcome::Skipped,
                };
            }
            log::error!("Failed to process {}: {}", path.display(), e);
            return FileReport {
                path,
                kind: None,
                outcome: FileOutcome::Failed { error: e },
            };
        }
    };

    log::info!("Processing {} ({})", path.display(), document.kind);

    let outcome = match extract(registry, &document, options) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Failed to process {}: {}", path.display(), e);
            FileOutcome::Failed { error: e }
        }
    };

    FileReport {
        kind: Some(document.kind),
        path,
        outcome,
    }
}

fn extract(
    registry: &LocatorRegistry,
    document: &Document,
    options: &ExtractOptions,
) -> Result<FileOutcome> {
    let raw = registry.locate(document)?;

    if raw.is_empty() {
        log::info!("No tables found in {}", document.path.display());
        return Ok(FileOutcome::NoTables);
    }

    log::info!(
        "Found {} tables in {}",
        raw.len(),
        document.path.display()
    );

    let tables: Vec<NormalizedTable> = raw
        .into_iter()
        .map(|t| normalize_with(t, options.row_policy))
        .collect();

    let report = write_tables(
        &document.base_name(),
        &tables,
        document.kind,
        &options.output_dir,
    )?;

    Ok(FileOutcome::Extracted {
        tables: tables.len(),
        artifacts: report.written,
        failures: report.failed,
    })
}
