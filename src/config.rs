//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.simstats.toml` files.

use crate::analysis::MetricRule;
use crate::scanner::DEFAULT_SCAN_LIMIT;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the config file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".simstats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Custom metric rules.
    #[serde(default, rename = "metric", skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<MetricRule>,

    /// Named reports.
    #[serde(default, rename = "report")]
    pub reports: Vec<ReportConfig>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding one sub-directory per group.
    #[serde(default = "default_root")]
    pub root: String,

    /// Leading part of every run-log file name.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Highest run index probed per group.
    #[serde(default = "default_scan_limit")]
    pub scan_limit: usize,

    /// Replaces the decimal point in printed values.
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,

    /// Default output file; stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            file_prefix: default_file_prefix(),
            scan_limit: default_scan_limit(),
            decimal_separator: default_decimal_separator(),
            output: None,
            verbose: false,
        }
    }
}

fn default_root() -> String {
    ".".to_string()
}

fn default_file_prefix() -> String {
    "is2013".to_string()
}

fn default_scan_limit() -> usize {
    DEFAULT_SCAN_LIMIT
}

fn default_decimal_separator() -> String {
    ",".to_string()
}

/// A named aggregation declared in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub name: String,

    /// Groups combined into one average, in scan order.
    pub groups: Vec<String>,

    /// Metric rule name (custom or built-in).
    #[serde(default = "default_metric")]
    pub metric: String,

    /// Positions collapsed into each output value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_size: Option<usize>,

    /// Keep only the first N output values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

fn default_metric() -> String {
    "accumulated-return".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref root) = args.root {
            self.general.root = root.display().to_string();
        }
        if let Some(ref prefix) = args.prefix {
            self.general.file_prefix = prefix.clone();
        }
        if let Some(limit) = args.scan_limit {
            self.general.scan_limit = limit;
        }
        if let Some(ref separator) = args.separator {
            self.general.decimal_separator = separator.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check settings the CLI validation cannot see.
    pub fn validate(&self) -> Result<()> {
        if self.general.decimal_separator.is_empty() {
            bail!("decimal_separator must not be empty");
        }
        if self.general.scan_limit == 0 {
            bail!("scan_limit must be at least 1");
        }

        for report in &self.reports {
            if report.groups.is_empty() {
                bail!("Report '{}' has no groups", report.name);
            }
            if report.bucket_size == Some(0) {
                bail!("Report '{}': bucket_size must be at least 1", report.name);
            }
            if report.limit == Some(0) {
                bail!("Report '{}': limit must be at least 1", report.name);
            }
        }

        Ok(())
    }

    /// Find a configured report by name.
    pub fn report(&self, name: &str) -> Option<&ReportConfig> {
        self.reports.iter().find(|r| r.name == name)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config {
            general: GeneralConfig::default(),
            metrics: Vec::new(),
            reports: vec![ReportConfig {
                name: "returns".to_string(),
                groups: vec!["sarsa".to_string(), "unstructured".to_string()],
                metric: default_metric(),
                bucket_size: Some(10),
                limit: None,
            }],
        };
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
