//! Command-line interface argument parsing.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// vgsales_report - derived sales tables for the video-game dashboard
///
/// Loads a video-game sales CSV, runs the built-in and configured views, and
/// writes each table as CSV/JSON plus a summary.json.
///
/// Examples:
///   vgsales_report
///   vgsales_report --batch --input videogames_wide.csv --output-dir reports
///   vgsales_report --batch --view publisher_trends --format json
///   vgsales_report --init-config
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Sales table to load
    #[arg(short, long, value_name = "FILE", env = "VGSALES_INPUT")]
    pub input: Option<PathBuf>,

    /// Directory the report files are written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .vgsales.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Field delimiter of the input table
    #[arg(short, long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Rows shown in each console preview
    #[arg(long, value_name = "COUNT")]
    pub preview_rows: Option<usize>,

    /// Output format for view tables
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Only run these views (comma-separated or repeated)
    #[arg(long = "view", value_name = "NAME", value_delimiter = ',')]
    pub views: Vec<String>,

    /// Load and generate every report, then exit without the menu
    #[arg(short, long)]
    pub batch: bool,

    /// Print the available view names and exit
    #[arg(long)]
    pub list_views: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .vgsales.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for view tables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
    /// Both CSV and JSON (default)
    #[default]
    Both,
}

impl OutputFormat {
    pub fn writes_csv(self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }

    pub fn writes_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }
}

/// Delimiters the CSV reader can use: a single ASCII byte that is not
/// alphanumeric, a quote or a line break.
pub fn check_delimiter(d: char) -> Result<(), String> {
    if !d.is_ascii() || d.is_ascii_alphanumeric() || matches!(d, '"' | '\n' | '\r') {
        return Err(format!("Unsupported delimiter: {:?}", d));
    }
    Ok(())
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }
        if let Some(d) = self.delimiter {
            check_delimiter(d)?;
        }
        if self.preview_rows == Some(0) {
            return Err("Preview rows must be at least 1".to_string());
        }
        if let Some(ref input) = self.input {
            if input.is_dir() {
                return Err(format!("Input path is a directory: {}", input.display()));
            }
        }
        Ok(())
    }

    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
