//! tabex CLI - extract tables from PDF and HTML documents to CSV

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use tabex::{
    BatchProgress, ExtractOptions, FileOutcome, FileReport, PdfStrategy, DEFAULT_INPUT_DIR,
    DEFAULT_OUTPUT_DIR,
};

#[derive(Parser, Debug)]
#[command(name = "tabex")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract tables from PDF and HTML documents to CSV", long_about = None)]
struct Cli {
    /// Directory containing .pdf and .html documents
    #[arg(value_name = "INPUT_DIR", default_value = DEFAULT_INPUT_DIR)]
    input: PathBuf,

    /// Directory receiving one CSV file per table
    #[arg(value_name = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// How tables are detected in PDF pages
    #[arg(long, value_enum, default_value = "lines")]
    strategy: Strategy,

    /// Pad short rows with empty fields up to the widest row of each table
    #[arg(long)]
    pad_rows: bool,

    /// Fail a whole PDF when one of its pages cannot be decoded
    #[arg(long)]
    strict: bool,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,

    /// Only print errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Strategy {
    /// Ruling lines first, text alignment when a page has no ruled table
    Auto,
    /// Ruling lines only
    Lines,
    /// Text alignment only
    Text,
}

impl From<Strategy> for PdfStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Auto => PdfStrategy::Auto,
            Strategy::Lines => PdfStrategy::Lines,
            Strategy::Text => PdfStrategy::Text,
        }
    }
}

impl Cli {
    fn options(&self) -> ExtractOptions {
        let mut options = ExtractOptions::new()
            .with_input_dir(&self.input)
            .with_output_dir(&self.output)
            .with_pdf_strategy(self.strategy.into());

        if self.pad_rows {
            options = options.pad_rows();
        }
        if self.strict {
            options = options.strict();
        }
        options
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = cmd_extract(&cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_extract(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = cli.options();
    log::debug!("Extract options: {:?}", options);
    let interactive = !cli.quiet && !cli.json;

    let pb = if interactive {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let report = tabex::run_with_progress(&options, |progress: BatchProgress<'_>| {
        pb.set_length(progress.total as u64);
        pb.set_position(progress.current as u64);
        if let Some(name) = progress.file.path.file_name() {
            pb.set_message(name.to_string_lossy().into_owned());
        }

        if interactive {
            let lines = describe(progress.file);
            pb.suspend(|| {
                for line in &lines {
                    println!("{}", line);
                }
            });
        }
    })?;

    pb.finish_and_clear();

    if cli.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    if interactive {
        let summary = report.summary();
        println!(
            "\n{} {} tables written to {}",
            "Done!".green().bold(),
            summary.artifacts,
            options.output_dir.display()
        );
        println!(
            "  {} {} files, {} with tables, {} without, {} skipped, {} failed",
            "└─".dimmed(),
            summary.files,
            summary.extracted,
            summary.no_tables,
            summary.skipped,
            summary.failed
        );
    }

    Ok(())
}

/// Human-readable lines for one processed file.
fn describe(file: &FileReport) -> Vec<String> {
    let name = file.path.display().to_string();

    match &file.outcome {
        FileOutcome::Extracted {
            tables,
            artifacts,
            failures,
        } => {
            let mut lines = vec![format!(
                "{} {} ({} tables)",
                "Extracted".green(),
                name,
                tables
            )];
            for artifact in artifacts {
                lines.push(format!(
                    "  {} {}",
                    "├─".dimmed(),
                    artifact.path.display()
                ));
            }
            for failure in failures {
                lines.push(format!("  {} {}", "Failed".yellow(), failure.error));
            }
            lines
        }
        FileOutcome::NoTables => vec![format!("{} {}", "No tables".dimmed(), name)],
        FileOutcome::Skipped => vec![format!("{} {}", "Skipped".dimmed(), name)],
        FileOutcome::Failed { error } => vec![
            format!("{} {}", "Failed".red(), name),
            format!("  {} {}", "└─".dimmed(), error),
        ],
    }
}
