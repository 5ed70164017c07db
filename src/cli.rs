//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// simstats - average metrics across simulation run logs
///
/// Reads numbered run logs (`<root>/<group>/<prefix>-<group>-<n>.txt`),
/// extracts one metric per matching line and prints the mean at every
/// episode position, ready to paste into a spreadsheet.
///
/// Examples:
///   simstats --group sarsa --group unstructured
///   simstats --group structinf --metric kl-divergence --bucket-size 10
///   simstats --root logs --group sarsa --format markdown --output returns.md
///   simstats --report returns
///   simstats --group sarsa --dry-run
///   simstats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Group to include (repeatable or comma-separated)
    ///
    /// Each group is a directory under the log root holding numbered runs.
    #[arg(short, long = "group", value_name = "GROUP", value_delimiter = ',')]
    pub groups: Vec<String>,

    /// Metric to average
    ///
    /// Built-in: accumulated-return, last-return, kl-divergence.
    /// Custom metrics can be declared in .simstats.toml.
    #[arg(short, long, default_value = "accumulated-return")]
    pub metric: String,

    /// Average every N consecutive positions into one value
    #[arg(short, long, value_name = "N")]
    pub bucket_size: Option<usize>,

    /// Print only the first N values
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Directory containing the group directories
    #[arg(short, long, value_name = "DIR", env = "SIMSTATS_ROOT")]
    pub root: Option<PathBuf>,

    /// Leading part of every run-log file name
    #[arg(short, long, value_name = "PREFIX", env = "SIMSTATS_PREFIX")]
    pub prefix: Option<String>,

    /// Highest run index probed per group
    #[arg(long, value_name = "N")]
    pub scan_limit: Option<usize>,

    /// Decimal separator used in printed values
    #[arg(long, value_name = "SEP")]
    pub separator: Option<String>,

    /// Output format (text, markdown, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Run a report declared in the config file
    #[arg(long, value_name = "NAME", conflicts_with = "groups")]
    pub report: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .simstats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (values only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Resolve groups and list the run logs found, without aggregating
    #[arg(long)]
    pub dry_run: bool,

    /// List the available metrics and exit
    #[arg(long)]
    pub list_metrics: bool,

    /// Generate a default .simstats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One value per line (default)
    #[default]
    Text,
    /// Markdown table
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config || self.list_metrics {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.bucket_size == Some(0) {
            return Err("Bucket size must be at least 1".to_string());
        }

        if self.limit == Some(0) {
            return Err("Limit must be at least 1".to_string());
        }

        if self.scan_limit == Some(0) {
            return Err("Scan limit must be at least 1".to_string());
        }

        if let Some(ref separator) = self.separator {
            if separator.is_empty() {
                return Err("Separator must not be empty".to_string());
            }
        }

        if self.groups.iter().any(|g| g.trim().is_empty()) {
            return Err("Group names must not be empty".to_string());
        }

        if let Some(ref root) = self.root {
            if !root.is_dir() {
                return Err(format!("Log root is not a directory: {}", root.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
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
