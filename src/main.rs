//! simstats - Experiment log aggregator
//!
//! A CLI tool that averages one metric across numbered simulation run
//! logs, position by position, and prints the means ready for pasting
//! into a spreadsheet.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (malformed value, empty position, I/O, bad arguments)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod scanner;

use analysis::{AggregateOptions, LogAggregator, MetricRule, BUILTIN_METRICS};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{AggregationReport, ReportMetadata};
use scanner::{LogScanner, ScanConfig};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// One aggregation to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Job {
    name: Option<String>,
    groups: Vec<String>,
    metric: String,
    bucket_size: Option<usize>,
    limit: Option<usize>,
}

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(log_level(&args, &config), logs_to_stderr(args.format));

    debug!("simstats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args, config) {
        error!("Aggregation failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .simstats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the log root, file prefix, metrics and reports.");
    Ok(())
}

/// Pick the log level from the flags, then the config file.
fn log_level(args: &Args, config: &Config) -> tracing::Level {
    if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    }
}

/// Structured output formats must stay parseable on stdout.
fn logs_to_stderr(format: OutputFormat) -> bool {
    format != OutputFormat::Text
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level, to_stderr: bool) {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let result = if to_stderr {
        tracing::subscriber::set_global_default(builder.with_writer(std::io::stderr).finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    result.expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?.unwrap_or_default()
    };

    config.merge_with_args(args);
    config.validate()?;
    Ok(config)
}

/// Run every requested aggregation and emit the rendered output.
fn run(args: Args, config: Config) -> Result<()> {
    if args.list_metrics {
        print_metrics(&config);
        return Ok(());
    }

    let jobs = plan_jobs(&args, &config)?;
    let scanner = LogScanner::new(ScanConfig::from(&config.general));
    info!("Log root: {}", scanner.root().display());

    if args.dry_run {
        handle_dry_run(&scanner, &jobs);
        return Ok(());
    }

    let reports = jobs
        .iter()
        .map(|job| run_job(&scanner, &config, job, !args.quiet))
        .collect::<Result<Vec<_>>>()?;

    let output = render(&reports, args.format)?;

    match config.general.output {
        Some(ref path) => {
            report::write_output(&output, Path::new(path))?;
            info!("Report saved to: {}", path);
        }
        None => println!("{}", output),
    }

    Ok(())
}

/// Work out which aggregations to run.
///
/// CLI groups win, then `--report`, then every report in the config file.
fn plan_jobs(args: &Args, config: &Config) -> Result<Vec<Job>> {
    if !args.groups.is_empty() {
        return Ok(vec![Job {
            name: None,
            groups: args.groups.clone(),
            metric: args.metric.clone(),
            bucket_size: args.bucket_size,
            limit: args.limit,
        }]);
    }

    let selected: Vec<&config::ReportConfig> = match args.report {
        Some(ref name) => match config.report(name) {
            Some(report) => vec![report],
            None => bail!("Unknown report '{}' (not declared in config)", name),
        },
        None => config.reports.iter().collect(),
    };

    if selected.is_empty() {
        bail!(
            "No groups given. Use --group or declare [[report]] entries in {}",
            CONFIG_FILE_NAME
        );
    }

    Ok(selected
        .into_iter()
        .map(|report| Job {
            name: Some(report.name.clone()),
            groups: report.groups.clone(),
            metric: report.metric.clone(),
            bucket_size: args.bucket_size.or(report.bucket_size),
            limit: args.limit.or(report.limit),
        })
        .collect())
}

/// Run one aggregation and wrap it in a report.
fn run_job(scanner: &LogScanner, config: &Config, job: &Job, show_progress: bool) -> Result<AggregationReport> {
    let start_time = Instant::now();

    if let Some(ref name) = job.name {
        info!("Running report: {}", name);
    }

    let rule = MetricRule::resolve(&job.metric, &config.metrics)?;
    let options = AggregateOptions {
        limit: job.limit,
        decimal_separator: config.general.decimal_separator.clone(),
        show_progress,
    };

    let aggregator = LogAggregator::new(scanner.clone(), options);
    let result = aggregator.run(&job.groups, &rule, job.bucket_size)?;

    let metadata = ReportMetadata {
        report_name: job.name.clone(),
        metric: rule.label().to_string(),
        groups: job.groups.clone(),
        root: aggregator.scanner().root().display().to_string(),
        stats: result.stats,
        bucket_size: job.bucket_size,
        generated_at: Utc::now(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    Ok(AggregationReport {
        metadata,
        series: result.series,
        formatted: result.formatted,
        counts: result.counts,
    })
}

/// Render all reports in the chosen format.
fn render(reports: &[AggregationReport], format: OutputFormat) -> Result<String> {
    let output = match format {
        OutputFormat::Text => reports
            .iter()
            .map(report::generate_text_report)
            .collect::<Vec<_>>()
            .join("\n\n"),
        OutputFormat::Markdown => reports
            .iter()
            .map(report::generate_markdown_report)
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => match reports {
            [single] => report::generate_json_report(single)?,
            many => serde_json::to_string_pretty(many)?,
        },
    };

    Ok(output)
}

/// Handle --dry-run: resolve groups, print what would be read, exit.
fn handle_dry_run(scanner: &LogScanner, jobs: &[Job]) {
    println!("\n🔍 Dry run: resolving run logs (no aggregation)...\n");

    let mut seen: Vec<&String> = Vec::new();
    for group in jobs.iter().flat_map(|j| j.groups.iter()) {
        if seen.contains(&group) {
            continue;
        }
        seen.push(group);

        let set = scanner.resolve(group);
        if set.is_empty() {
            println!("   📂 {}: no run logs found in {}", set.name, set.dir.display());
        } else {
            println!(
                "   📂 {}: {} run logs (indices {}), {} missing",
                set.name,
                set.resolved.len(),
                format_indices(&set.resolved),
                set.missing().len()
            );
        }

        let stray: Vec<PathBuf> = scanner.stray_files(&set);
        for path in &stray {
            println!("     ⚠️  not matched by the naming template: {}", path.display());
        }
    }

    println!("\n✅ Dry run complete. No logs were aggregated.");
}

/// Compact index list, e.g. `1-3, 7, 9-10`.
fn format_indices(indices: &[usize]) -> String {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for &i in indices {
        match ranges.last_mut() {
            Some((_, end)) if *end + 1 == i => *end = i,
            _ => ranges.push((i, i)),
        }
    }

    ranges
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{}-{}", start, end)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Handle --list-metrics.
fn print_metrics(config: &Config) {
    println!("Built-in metrics:");
    for name in BUILTIN_METRICS {
        if let Some(rule) = MetricRule::builtin(name) {
            let nan = if rule.skip_nan { " (NaN skipped)" } else { "" };
            println!("  {:<20} {:?}{}", name, rule.prefix, nan);
        }
    }

    if !config.metrics.is_empty() {
        println!("\nConfigured metrics:");
        for rule in &config.metrics {
            println!("  {:<20} {:?}", rule.name, rule.prefix);
        }
    }
}
