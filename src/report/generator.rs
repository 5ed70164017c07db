//! Text, Markdown and JSON report generation.

use crate::models::{AggregationReport, ReportMetadata};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate the plain spreadsheet output: one formatted value per line.
pub fn generate_text_report(report: &AggregationReport) -> String {
    report.formatted.join("\n")
}

/// Generate a Markdown report.
pub fn generate_markdown_report(report: &AggregationReport) -> String {
    let mut output = String::new();

    let title = report
        .metadata
        .report_name
        .as_deref()
        .unwrap_or(&report.metadata.metric);
    output.push_str(&format!("# simstats: {}\n\n", title));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_values_section(report));

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Metric:** {}\n", metadata.metric));
    section.push_str(&format!("- **Groups:** {}\n", metadata.groups.join(", ")));
    section.push_str(&format!("- **Log Root:** `{}`\n", metadata.root));
    section.push_str(&format!("- **Logs Read:** {}\n", metadata.stats.files_read));
    section.push_str(&format!(
        "- **Matching Lines:** {}\n",
        metadata.stats.lines_matched
    ));
    if metadata.stats.nan_skipped > 0 {
        section.push_str(&format!(
            "- **NaN Values Skipped:** {}\n",
            metadata.stats.nan_skipped
        ));
    }
    if let Some(size) = metadata.bucket_size {
        section.push_str(&format!("- **Bucket Size:** {}\n", size));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

/// Generate the table of averaged values.
fn generate_values_section(report: &AggregationReport) -> String {
    let mut section = String::new();

    section.push_str("## Values\n\n");

    if report.formatted.is_empty() {
        section.push_str("No matching values were found.\n");
        return section;
    }

    let bucketed = report.series.bucket_size.is_some();
    if bucketed {
        section.push_str("| Positions | Mean |\n");
        section.push_str("|:---:|---:|\n");
    } else {
        section.push_str("| Position | Mean | Samples |\n");
        section.push_str("|:---:|---:|:---:|\n");
    }

    for (i, value) in report.formatted.iter().enumerate() {
        if bucketed {
            let (first, last) = report.series.position_range(i);
            section.push_str(&format!("| {}-{} | {} |\n", first, last, value));
        } else {
            let samples = report.counts.get(i).copied().unwrap_or(0);
            section.push_str(&format!("| {} | {} | {} |\n", i + 1, value, samples));
        }
    }
    section.push('\n');

    section
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AggregationReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered output to a file, ending with a newline.
pub fn write_output(content: &str, path: &Path) -> Result<()> {
    let mut text = content.to_string();
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }

    std::fs::write(path, text)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AveragedSeries, ScanStats};
    use chrono::Utc;

    fn create_test_report(bucket_size: Option<usize>) -> AggregationReport {
        AggregationReport {
            metadata: ReportMetadata {
                report_name: None,
                metric: "accumulated return".to_string(),
                groups: vec!["sarsa".to_string(), "unstructured".to_string()],
                root: "logs".to_string(),
                stats: ScanStats {
                    files_read: 4,
                    lines_matched: 8,
                    nan_skipped: 0,
                },
                bucket_size,
                generated_at: Utc::now(),
                duration_seconds: 0.2,
            },
            series: AveragedSeries {
                label: "accumulated return".to_string(),
                bucket_size,
                values: vec![1.0, 2.5],
            },
            formatted: vec!["1,0".to_string(), "2,5".to_string()],
            counts: vec![4, 4, 4, 4],
        }
    }

    #[test]
    fn test_generate_text_report() {
        let report = create_test_report(None);
        assert_eq!(generate_text_report(&report), "1,0\n2,5");
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report(None);
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# simstats: accumulated return"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("sarsa, unstructured"));
        assert!(markdown.contains("| 2 | 2,5 | 4 |"));
        assert!(!markdown.contains("NaN Values Skipped"));
    }

    #[test]
    fn test_markdown_bucket_ranges() {
        let report = create_test_report(Some(2));
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("| Positions | Mean |"));
        assert!(markdown.contains("| 1-2 | 1,0 |"));
        assert!(markdown.contains("| 3-4 | 2,5 |"));
        assert!(markdown.contains("**Bucket Size:** 2"));
    }

    #[test]
    fn test_markdown_empty_values() {
        let mut report = create_test_report(None);
        report.formatted.clear();
        report.series.values.clear();
        let markdown = generate_markdown_report(&report);
        assert!(markdown.contains("No matching values were found."));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report(None);
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metric\""));
        assert!(json.contains("\"formatted\""));
        assert!(json.contains("\"files_read\": 4"));
        assert!(!json.contains("\"bucket_size\": null"));
    }

    #[test]
    fn test_write_output_adds_newline() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        write_output("1,0\n2,5", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1,0\n2,5\n");
    }
}
