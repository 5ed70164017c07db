//! Cross-run metric aggregation.
//!
//! One pass: enumerate groups, probe run indices, read each existing log,
//! scan its lines, accumulate per position, then reduce to means.
//!
//! Alignment is by position. The Kth matching line of every file is treated
//! as the same episode, so callers must only combine logs that emit the
//! metric in the same order (e.g. "return after episode K"). Nothing here
//! can check that.

use crate::analysis::metric::{Extracted, MetricRule};
use crate::error::{AggregateError, AggregateResult};
use crate::models::{AveragedSeries, LogFile, MetricSeries, RunLogSet, ScanStats};
use crate::report::format_value;
use crate::scanner::LogScanner;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Output options for an aggregation.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Keep only the first N output values.
    pub limit: Option<usize>,
    /// Replaces `.` in formatted numbers.
    pub decimal_separator: String,
    /// Draw a progress bar while reading logs.
    pub show_progress: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            limit: None,
            decimal_separator: ",".to_string(),
            show_progress: false,
        }
    }
}

/// Running state threaded through the scan.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    pub series: MetricSeries,
    pub stats: ScanStats,
}

impl Accumulator {
    pub fn new(label: &str) -> Self {
        Self {
            series: MetricSeries::new(label),
            stats: ScanStats::default(),
        }
    }
}

/// Everything one aggregation produced.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub series: AveragedSeries,
    pub formatted: Vec<String>,
    /// Samples per position before bucketing.
    pub counts: Vec<usize>,
    pub stats: ScanStats,
}

/// Fold one log file into the accumulator.
pub fn scan_file(acc: Accumulator, file: &LogFile, rule: &MetricRule) -> AggregateResult<Accumulator> {
    let mut acc = file
        .numbered_lines()
        .filter(|(_, line)| rule.matches(line))
        .enumerate()
        .try_fold(acc, |mut acc, (position, (line_no, line))| {
            acc.stats.lines_matched += 1;
            match rule.extract(line) {
                Ok(Extracted::Value(value)) => acc.series.record(position, value),
                Ok(Extracted::Skipped) => {
                    acc.series.touch(position);
                    acc.stats.nan_skipped += 1;
                }
                Err(text) => {
                    return Err(AggregateError::MalformedValue {
                        path: file.path.clone(),
                        line: line_no,
                        text,
                    })
                }
            }
            Ok(acc)
        })?;

    acc.stats.files_read += 1;
    Ok(acc)
}

/// Averages one metric across the run logs of several groups.
pub struct LogAggregator {
    scanner: LogScanner,
    options: AggregateOptions,
}

impl LogAggregator {
    pub fn new(scanner: LogScanner, options: AggregateOptions) -> Self {
        Self { scanner, options }
    }

    pub fn scanner(&self) -> &LogScanner {
        &self.scanner
    }

    /// Formatted per-position (or per-bucket) means, one string per line.
    #[allow(dead_code)]
    pub fn aggregate(
        &self,
        groups: &[String],
        rule: &MetricRule,
        bucket_size: Option<usize>,
    ) -> AggregateResult<Vec<String>> {
        Ok(self.run(groups, rule, bucket_size)?.formatted)
    }

    /// Full aggregation result, including scan counters.
    pub fn run(
        &self,
        groups: &[String],
        rule: &MetricRule,
        bucket_size: Option<usize>,
    ) -> AggregateResult<Aggregation> {
        if groups.is_empty() {
            return Err(AggregateError::NoGroups);
        }
        if bucket_size == Some(0) {
            return Err(AggregateError::InvalidBucketSize);
        }

        info!("Aggregating '{}' over groups: {}", rule.label(), groups.join(", "));

        let sets = self.scanner.resolve_all(groups);
        let acc = self.accumulate(&sets, rule)?;

        info!(
            "Read {} logs, {} matching lines ({} NaN skipped), {} positions",
            acc.stats.files_read,
            acc.stats.lines_matched,
            acc.stats.nan_skipped,
            acc.series.len()
        );

        let mut series = AveragedSeries::from_series(&acc.series, bucket_size)?;
        if let Some(limit) = self.options.limit {
            series.truncate(limit);
        }

        let formatted = series
            .values
            .iter()
            .map(|v| format_value(*v, &self.options.decimal_separator))
            .collect();

        Ok(Aggregation {
            counts: acc.series.counts(),
            stats: acc.stats,
            series,
            formatted,
        })
    }

    /// Scan every resolved log of every set, in group then index order.
    pub fn accumulate(&self, sets: &[RunLogSet], rule: &MetricRule) -> AggregateResult<Accumulator> {
        let total: usize = sets.iter().map(|s| s.paths.len()).sum();
        let progress = self.progress_bar(total as u64);

        let acc = sets
            .iter()
            .flat_map(|set| set.paths.iter())
            .try_fold(Accumulator::new(rule.label()), |acc, path| {
                debug!("Scanning {}", path.display());
                let file = LogFile::read(path)?;
                let acc = scan_file(acc, &file, rule)?;
                progress.inc(1);
                Ok::<_, AggregateError>(acc)
            });

        match acc {
            Ok(acc) => {
                progress.finish_and_clear();
                Ok(acc)
            }
            Err(e) => {
                progress.abandon();
                Err(e)
            }
        }
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} logs")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}
