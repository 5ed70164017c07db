//! Metric extraction rules.
//!
//! A rule decides which log lines carry a metric and pulls the number out
//! of them. Rules come from the built-in presets or from `[[metric]]`
//! entries in the config file.

use crate::error::{AggregateError, AggregateResult};
use serde::{Deserialize, Serialize};

/// Names of the built-in metric presets.
pub const BUILTIN_METRICS: &[&str] = &["accumulated-return", "last-return", "kl-divergence"];

const SIMULATOR_PREFIX: &str = "[Simulator] DEBUG: ";

/// How to find and parse one metric in a run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRule {
    /// Name used on the command line and in `[[report]]` entries.
    pub name: String,

    /// Display label; falls back to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Substring a line must contain to count as a metric line.
    pub pattern: String,

    /// Literal text stripped before the number is parsed.
    pub prefix: String,

    /// Lines longer than this are ignored even if they contain `pattern`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_line_len: Option<usize>,

    /// Skip values containing "NaN" instead of averaging them.
    #[serde(default)]
    pub skip_nan: bool,
}

/// Outcome of extracting a value from a matched line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extracted {
    Value(f64),
    /// A NaN sentinel the rule filters out.
    Skipped,
}

impl MetricRule {
    /// Rule for lines of the form `<prefix><number>`, matched on `pattern`.
    pub fn new(name: &str, label: &str, pattern: &str, prefix: &str) -> Self {
        Self {
            name: name.to_string(),
            label: Some(label.to_string()),
            pattern: pattern.to_string(),
            prefix: prefix.to_string(),
            max_line_len: None,
            skip_nan: false,
        }
    }

    pub fn with_skip_nan(mut self) -> Self {
        self.skip_nan = true;
        self
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Look up a built-in preset.
    pub fn builtin(name: &str) -> Option<Self> {
        let rule = match name {
            "accumulated-return" => Self::new(
                name,
                "accumulated return",
                "accumulated return: ",
                &format!("{}accumulated return: ", SIMULATOR_PREFIX),
            ),
            "last-return" => Self::new(
                name,
                "last return",
                "last return: ",
                &format!("{}last return: ", SIMULATOR_PREFIX),
            ),
            "kl-divergence" => Self::new(
                name,
                "K-L divergence",
                "K-L divergence: ",
                &format!("{}K-L divergence: ", SIMULATOR_PREFIX),
            )
            .with_skip_nan(),
            _ => return None,
        };
        Some(rule)
    }

    /// Resolve a metric name, preferring custom rules over presets.
    pub fn resolve(name: &str, custom: &[MetricRule]) -> AggregateResult<Self> {
        custom
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .or_else(|| Self::builtin(name))
            .ok_or_else(|| AggregateError::UnknownMetric(name.to_string()))
    }

    /// Whether a raw line carries this metric.
    pub fn matches(&self, line: &str) -> bool {
        if let Some(max) = self.max_line_len {
            if line.len() > max {
                return false;
            }
        }
        line.contains(&self.pattern)
    }

    /// Parse the value of a matched line.
    ///
    /// On failure returns the text that could not be parsed.
    pub fn extract(&self, line: &str) -> Result<Extracted, String> {
        let rest = match line.find(&self.prefix) {
            Some(start) => &line[start + self.prefix.len()..],
            None => return Err(line.trim().to_string()),
        };

        if self.skip_nan && rest.contains("NaN") {
            return Ok(Extracted::Skipped);
        }

        let token = rest.split_whitespace().next().unwrap_or("");
        token
            .parse::<f64>()
            .map(Extracted::Value)
            .map_err(|_| rest.trim().to_string())
    }
}
