//! Run-log discovery.
//!
//! Run logs live at `<root>/<group>/<prefix>-<group>-<n>.txt` for
//! `n` in `1..=scan_limit`. Indices are probed one by one; gaps are
//! expected and skipped without complaint.

use crate::models::RunLogSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Default highest run index probed per group.
pub const DEFAULT_SCAN_LIMIT: usize = 99;

/// Configuration for run-log discovery.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directory containing one sub-directory per group.
    pub root: PathBuf,
    /// Leading part of every log file name, e.g. "is2013".
    pub file_prefix: String,
    /// Highest run index probed.
    pub scan_limit: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            file_prefix: "is2013".to_string(),
            scan_limit: DEFAULT_SCAN_LIMIT,
        }
    }
}

impl From<&crate::config::GeneralConfig> for ScanConfig {
    fn from(config: &crate::config::GeneralConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root),
            file_prefix: config.file_prefix.clone(),
            scan_limit: config.scan_limit,
        }
    }
}

/// Resolves group names to the run logs present on disk.
#[derive(Debug, Clone)]
pub struct LogScanner {
    config: ScanConfig,
}

impl LogScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Directory holding a group's logs.
    pub fn group_dir(&self, group: &str) -> PathBuf {
        self.config.root.join(group)
    }

    /// Path of run `index` of `group`.
    pub fn run_log_path(&self, group: &str, index: usize) -> PathBuf {
        self.group_dir(group).join(format!(
            "{}-{}-{}.txt",
            self.config.file_prefix, group, index
        ))
    }

    /// Probe every candidate index of a group.
    pub fn resolve(&self, group: &str) -> RunLogSet {
        let mut resolved = Vec::new();
        let mut paths = Vec::new();

        for index in 1..=self.config.scan_limit {
            let path = self.run_log_path(group, index);
            if path.is_file() {
                resolved.push(index);
                paths.push(path);
            }
        }

        debug!(
            "Group {}: {} of {} candidate logs present",
            group,
            resolved.len(),
            self.config.scan_limit
        );

        RunLogSet {
            name: group.to_string(),
            dir: self.group_dir(group),
            scan_limit: self.config.scan_limit,
            resolved,
            paths,
        }
    }

    /// Resolve several groups in order.
    pub fn resolve_all(&self, groups: &[String]) -> Vec<RunLogSet> {
        let sets: Vec<RunLogSet> = groups.iter().map(|g| self.resolve(g)).collect();
        let total: usize = sets.iter().map(|s| s.resolved.len()).sum();
        info!("Resolved {} run logs across {} groups", total, sets.len());
        sets
    }

    /// `.txt` files in a group directory that the naming template never reaches.
    pub fn stray_files(&self, set: &RunLogSet) -> Vec<PathBuf> {
        if !set.dir.is_dir() {
            return Vec::new();
        }

        let mut stray: Vec<PathBuf> = WalkDir::new(&set.dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("txt"))
            .filter(|p| !set.paths.contains(p))
            .collect();

        stray.sort();
        stray
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scanner_for(dir: &TempDir, scan_limit: usize) -> LogScanner {
        LogScanner::new(ScanConfig {
            root: dir.path().to_path_buf(),
            file_prefix: "is2013".to_string(),
            scan_limit,
        })
    }

    #[test]
    fn test_run_log_path_template() {
        let scanner = LogScanner::new(ScanConfig {
            root: PathBuf::from("logs"),
            file_prefix: "is2013".to_string(),
            scan_limit: 99,
        });
        assert_eq!(
            scanner.run_log_path("sarsa", 7),
            PathBuf::from("logs/sarsa/is2013-sarsa-7.txt")
        );
    }

    #[test]
    fn test_resolve_skips_gaps() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sarsa")).unwrap();
        let scanner = scanner_for(&dir, 99);
        for i in [1, 2, 5] {
            fs::write(scanner.run_log_path("sarsa", i), "").unwrap();
        }

        let set = scanner.resolve("sarsa");
        assert_eq!(set.resolved, vec![1, 2, 5]);
        assert_eq!(set.paths.len(), 3);
        assert_eq!(set.missing().len(), 96);
    }

    #[test]
    fn test_resolve_respects_scan_limit() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sarsa")).unwrap();
        let scanner = scanner_for(&dir, 3);
        for i in [1, 4] {
            fs::write(scanner.run_log_path("sarsa", i), "").unwrap();
        }

        let set = scanner.resolve("sarsa");
        assert_eq!(set.resolved, vec![1]);
        assert_eq!(scanner.stray_files(&set), vec![scanner.run_log_path("sarsa", 4)]);
    }

    #[test]
    fn test_missing_group_is_empty() {
        let dir = TempDir::new().unwrap();
        let scanner = scanner_for(&dir, 99);
        let set = scanner.resolve("unstructured");
        assert!(set.is_empty());
        assert!(scanner.stray_files(&set).is_empty());
    }

    #[test]
    fn test_stray_files_ignore_other_extensions() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sarsa")).unwrap();
        let scanner = scanner_for(&dir, 99);
        fs::write(scanner.run_log_path("sarsa", 1), "").unwrap();
        fs::write(dir.path().join("sarsa/notes.txt"), "").unwrap();
        fs::write(dir.path().join("sarsa/plot.png"), "").unwrap();

        let set = scanner.resolve("sarsa");
        let stray = scanner.stray_files(&set);
        assert_eq!(stray, vec![dir.path().join("sarsa/notes.txt")]);
    }
}
