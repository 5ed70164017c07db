//! Data models for run-log aggregation.
//!
//! This module contains the structures that flow through one aggregation
//! pass: resolved run-log groups, loaded log files, the per-position
//! accumulator, and the final averaged report.

use crate::error::{AggregateError, AggregateResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A named group of numbered run logs (one experimental condition).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunLogSet {
    /// Group name, e.g. "sarsa" or "unstructured".
    pub name: String,
    /// Directory holding the group's logs.
    pub dir: PathBuf,
    /// Highest candidate index probed (candidates are `1..=scan_limit`).
    pub scan_limit: usize,
    /// Indices whose log file exists, in ascending order.
    pub resolved: Vec<usize>,
    /// Paths of the resolved logs, parallel to `resolved`.
    pub paths: Vec<PathBuf>,
}

impl RunLogSet {
    /// Returns true if no run log of this group exists.
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Candidate indices with no file on disk.
    pub fn missing(&self) -> Vec<usize> {
        (1..=self.scan_limit)
            .filter(|i| self.resolved.binary_search(i).is_err())
            .collect()
    }
}

/// One run log, read whole into memory.
#[derive(Debug, Clone)]
pub struct LogFile {
    /// Path the log was read from.
    pub path: PathBuf,
    /// Raw file content.
    pub content: String,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Read a log file from disk.
    ///
    /// Invalid UTF-8 is replaced rather than rejected, so only matched lines
    /// can fail later.
    pub fn read(path: &Path) -> AggregateResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| AggregateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path, String::from_utf8_lossy(&bytes)))
    }

    /// Lines in file order, 1-indexed.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.content.lines().enumerate().map(|(i, l)| (i + 1, l))
    }
}

/// Sum and sample count at one position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub sum: f64,
    pub count: usize,
}

impl Bucket {
    /// Mean of the samples, or `None` if there are none.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Per-position accumulator for one metric across every scanned run.
///
/// The Nth matching line of any file lands in bucket N. `sum` and `count`
/// only ever move together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSeries {
    label: String,
    buckets: Vec<Bucket>,
}

impl MetricSeries {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            buckets: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Make sure a bucket exists at `position` without adding a sample.
    pub fn touch(&mut self, position: usize) {
        if self.buckets.len() <= position {
            self.buckets.resize(position + 1, Bucket::default());
        }
    }

    /// Add one sample at `position`.
    pub fn record(&mut self, position: usize, value: f64) {
        self.touch(position);
        let bucket = &mut self.buckets[position];
        bucket.sum += value;
        bucket.count += 1;
    }

    /// Sample counts per position.
    pub fn counts(&self) -> Vec<usize> {
        self.buckets.iter().map(|b| b.count).collect()
    }

    /// Mean per position. Fails on the first position without samples.
    pub fn means(&self) -> AggregateResult<Vec<f64>> {
        self.buckets
            .iter()
            .enumerate()
            .map(|(position, bucket)| {
                bucket
                    .mean()
                    .ok_or(AggregateError::EmptyBucket { position })
            })
            .collect()
    }
}

/// Final averaged values for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragedSeries {
    pub label: String,
    /// Positions collapsed into each value, if bucketing was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_size: Option<usize>,
    pub values: Vec<f64>,
}

impl AveragedSeries {
    /// Reduce an accumulated series.
    ///
    /// With a bucket size, each value is the plain mean of `size` consecutive
    /// per-position means. Trailing positions that do not fill a bucket are
    /// dropped.
    pub fn from_series(series: &MetricSeries, bucket_size: Option<usize>) -> AggregateResult<Self> {
        let means = series.means()?;
        let values = match bucket_size {
            None => means,
            Some(0) => return Err(AggregateError::InvalidBucketSize),
            Some(size) => means
                .chunks_exact(size)
                .map(|chunk| chunk.iter().sum::<f64>() / size as f64)
                .collect(),
        };

        Ok(Self {
            label: series.label().to_string(),
            bucket_size,
            values,
        })
    }

    /// Keep only the first `limit` values.
    pub fn truncate(&mut self, limit: usize) {
        self.values.truncate(limit);
    }

    /// 1-indexed position range covered by the value at `index`.
    pub fn position_range(&self, index: usize) -> (usize, usize) {
        let size = self.bucket_size.unwrap_or(1);
        (index * size + 1, (index + 1) * size)
    }
}

/// Counters gathered during the scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub files_read: usize,
    pub lines_matched: usize,
    pub nan_skipped: usize,
}

/// Metadata about an aggregation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Name of the configured report, if one was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_name: Option<String>,
    /// Metric label that was averaged.
    pub metric: String,
    /// Groups combined into the average.
    pub groups: Vec<String>,
    /// Root directory of the log corpus.
    pub root: String,
    pub stats: ScanStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_size: Option<usize>,
    pub generated_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

/// One aggregation result ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationReport {
    pub metadata: ReportMetadata,
    pub series: AveragedSeries,
    /// Formatted values, one per output line.
    pub formatted: Vec<String>,
    /// Samples per position before bucketing.
    pub counts: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_from_means(means: &[f64]) -> MetricSeries {
        let mut series = MetricSeries::new("test");
        for (i, m) in means.iter().enumerate() {
            series.record(i, *m);
        }
        series
    }

    #[test]
    fn test_record_grows_buckets() {
        let mut series = MetricSeries::new("accumulated return");
        series.record(2, 4.0);
        assert_eq!(series.len(), 3);
        assert_eq!(series.counts(), vec![0, 0, 1]);

        series.record(0, 1.0);
        series.record(1, 2.0);
        assert_eq!(series.means().unwrap(), vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_touch_adds_no_sample() {
        let mut series = MetricSeries::new("kl");
        series.touch(1);
        assert_eq!(series.counts(), vec![0, 0]);
        assert!(series.means().is_err());
    }

    #[test]
    fn test_means_rejects_empty_bucket() {
        let mut series = MetricSeries::new("x");
        series.record(0, 1.0);
        series.touch(1);
        match series.means() {
            Err(AggregateError::EmptyBucket { position }) => assert_eq!(position, 1),
            other => panic!("expected EmptyBucket, got {:?}", other),
        }
    }

    #[test]
    fn test_means_use_actual_counts() {
        let mut series = MetricSeries::new("x");
        series.record(0, 2.0);
        series.record(0, 4.0);
        series.record(1, 8.0);
        assert_eq!(series.means().unwrap(), vec![3.0, 8.0]);
    }

    #[test]
    fn test_bucketed_mean_of_means() {
        let series = series_from_means(&[1.0, 3.0, 5.0, 7.0]);
        let averaged = AveragedSeries::from_series(&series, Some(2)).unwrap();
        assert_eq!(averaged.values, vec![2.0, 6.0]);
    }

    #[test]
    fn test_bucketing_is_not_pooled() {
        // position 0: one sample of 0.0, position 1: three samples of 4.0
        let mut series = MetricSeries::new("x");
        series.record(0, 0.0);
        for _ in 0..3 {
            series.record(1, 4.0);
        }
        let averaged = AveragedSeries::from_series(&series, Some(2)).unwrap();
        // pooled would be 12 / 4 = 3.0
        assert_eq!(averaged.values, vec![2.0]);
    }

    #[test]
    fn test_bucketing_drops_remainder() {
        let series = series_from_means(&[1.0, 1.0, 1.0, 1.0, 9.0]);
        let averaged = AveragedSeries::from_series(&series, Some(4)).unwrap();
        assert_eq!(averaged.values, vec![1.0]);
    }

    #[test]
    fn test_zero_bucket_size_rejected() {
        let series = series_from_means(&[1.0]);
        assert!(matches!(
            AveragedSeries::from_series(&series, Some(0)),
            Err(AggregateError::InvalidBucketSize)
        ));
    }

    #[test]
    fn test_truncate_and_position_range() {
        let series = series_from_means(&[1.0, 3.0, 5.0, 7.0]);
        let mut averaged = AveragedSeries::from_series(&series, Some(2)).unwrap();
        assert_eq!(averaged.position_range(1), (3, 4));
        averaged.truncate(1);
        assert_eq!(averaged.values, vec![2.0]);
    }

    #[test]
    fn test_run_log_set_missing() {
        let set = RunLogSet {
            name: "sarsa".to_string(),
            dir: PathBuf::from("sarsa"),
            scan_limit: 4,
            resolved: vec![1, 3],
            paths: vec![PathBuf::from("a"), PathBuf::from("b")],
        };
        assert_eq!(set.missing(), vec![2, 4]);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_numbered_lines() {
        let file = LogFile::new("x.txt", "a\nb\n");
        let lines: Vec<_> = file.numbered_lines().collect();
        assert_eq!(lines, vec![(1, "a"), (2, "b")]);
    }

    #[test]
    fn test_read_tolerates_latin1_bytes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("is2013-sarsa-1.txt");
        std::fs::write(
            &path,
            b"[Simulator] DEBUG: user said: Bj\xF8rn\n[Simulator] DEBUG: accumulated return: 1.0\n",
        )
        .unwrap();

        let file = LogFile::read(&path).unwrap();
        let lines: Vec<_> = file.numbered_lines().map(|(_, l)| l).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Bj\u{FFFD}rn"));
        assert_eq!(lines[1], "[Simulator] DEBUG: accumulated return: 1.0");
    }
}
