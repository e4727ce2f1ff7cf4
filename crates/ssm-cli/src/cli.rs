//! CLI argument definitions for the schema mapper.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use ssm_cli::edits::{FieldEdit, LinkEdit, ReviewEdits};

#[derive(Parser)]
#[command(
    name = "schema-mapper",
    version,
    about = "Semantic schema mapper - align dataset variables to a reference schema",
    long_about = "Align the variables of an uploaded dataset to a reference schema.\n\n\
                  Extraction and scoring run on a remote service; this tool uploads the\n\
                  file, requests candidates for every variable and prints the review."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// TOML config file with `[gateway]` and `[review]` tables.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the scoring service (overrides the config file).
    #[arg(long = "base-url", value_name = "URL", global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load and print the reference schema.
    References,

    /// Upload a dataset file and print the extracted variable definitions.
    Extract(ExtractArgs),

    /// Upload a dataset, align every variable and print the review.
    Review(ReviewArgs),
}

#[derive(Parser)]
pub struct ExtractArgs {
    /// Dataset file to upload.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Parser)]
pub struct ReviewArgs {
    /// Dataset file to upload.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Confidence threshold in [0, 1]; out-of-range values are clamped.
    #[arg(long = "threshold", value_name = "SCORE")]
    pub threshold: Option<f64>,

    /// Discard results for rows removed while their request was in flight.
    #[arg(long = "drop-stale")]
    pub drop_stale: bool,

    /// Print the reconciled view as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,

    /// Add a blank row with this trait id before alignment.
    #[arg(long = "add-row", value_name = "TRAIT")]
    pub add_rows: Vec<String>,

    /// Set one field of the rows with this trait id after alignment.
    ///
    /// Fields: dataset, trait_id, description, method, unit, trait.
    #[arg(long = "set", value_name = "TRAIT.FIELD=VALUE")]
    pub set: Vec<FieldEdit>,

    /// Remove the link between a row and one reference variable.
    #[arg(long = "unlink", value_name = "TRAIT=REF_ID")]
    pub unlink: Vec<LinkEdit>,

    /// Remove every mapping of the rows with this trait id.
    #[arg(long = "unmap", value_name = "TRAIT")]
    pub unmap: Vec<String>,

    /// Delete the rows with this trait id. Their mappings are ignored.
    #[arg(long = "drop-row", value_name = "TRAIT")]
    pub drop_rows: Vec<String>,
}

impl ReviewArgs {
    pub fn edits(&self) -> ReviewEdits {
        ReviewEdits {
            add_rows: self.add_rows.clone(),
            set: self.set.clone(),
            unlink: self.unlink.clone(),
            unmap: self.unmap.clone(),
            drop_rows: self.drop_rows.clone(),
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
