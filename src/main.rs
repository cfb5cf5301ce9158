//! hashwatch - snapshot-diff file integrity monitor.
//!
//! Usage:
//!   hashwatch [check]          Compare the tree with the baseline and alert
//!   hashwatch init             Write a fresh baseline without alerting
//!   hashwatch diff             Show what changed, without alerting or saving
//!   hashwatch --help           Show help

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use hashwatch_alert::{AlertReport, Monitor, OutputFormat, RunReport, RunRequest};
use hashwatch_core::WatchConfig;

const EXIT_ALERT: u8 = 2;
const EXIT_ALERT_UNDELIVERED: u8 = 3;

#[derive(Parser)]
#[command(
    name = "hashwatch",
    version,
    about = "Snapshot-diff file integrity monitor",
    long_about = "hashwatch hashes every file below the configured include paths, \
                  compares the result with the stored baseline and raises an alert \
                  when files were added, removed or changed.\n\n\
                  Run it from cron; the exit status is 0 when all is clear, 2 when an \
                  alert was raised and 3 when an alert could not be delivered everywhere.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Config file (defaults to <config dir>/hashwatch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Access secret, required when the config sets one
    #[arg(short, long, global = true, env = "HASHWATCH_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(flatten)]
    check: CheckArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Compare with the baseline, alert and update the baseline (default)
    Check(CheckArgs),

    /// Scan and write the baseline unconditionally
    Init,

    /// Show the diff and fingerprint without alerting or saving
    Diff {
        /// Fingerprint this run is expected to produce
        #[arg(short, long)]
        expected_fingerprint: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: Format,
    },
}

#[derive(Args, Clone, Default)]
struct CheckArgs {
    /// Fingerprint this run is expected to produce; a mismatch raises an alert
    #[arg(short, long)]
    expected_fingerprint: Option<String>,

    /// Console rendering of alerts
    #[arg(short, long, default_value = "text")]
    format: Format,

    /// Keep the baseline even if an alert is raised
    #[arg(long)]
    no_update: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum Format {
    #[default]
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => WatchConfig::default_path()?,
    };
    let config = WatchConfig::load(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    init_logging(&config)?;
    tracing::debug!("Loaded config {}", config_path.display());

    let password = cli.password.as_deref();
    match cli.command.unwrap_or(Command::Check(cli.check)) {
        Command::Check(args) => run_check(config, password, args),
        Command::Init => run_init(config, password),
        Command::Diff {
            expected_fingerprint,
            format,
        } => run_diff(config, password, expected_fingerprint, format),
    }
}

/// Install the tracing subscriber, appending to the log file when one is set.
fn init_logging(config: &WatchConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .with_context(|| format!("Invalid log_level '{}'", config.log_level))?;
    let timer = ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string());
    let registry = tracing_subscriber::registry().with(filter);

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    fmt::layer()
                        .with_timer(timer)
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            registry
                .with(
                    fmt::layer()
                        .with_timer(timer)
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    Ok(())
}

/// Full run with alerting.
fn run_check(config: WatchConfig, password: Option<&str>, args: CheckArgs) -> Result<ExitCode> {
    let monitor = Monitor::new(config, args.format.into())?;

    let mut request = RunRequest::new();
    request.password = password.map(str::to_string);
    request.expected_fingerprint = args.expected_fingerprint;
    request.update_baseline = !args.no_update;

    let report = monitor.check(&request).context("Check failed")?;
    print_summary(&report);

    for failed in report.failed_deliveries() {
        eprintln!(
            "Alert not delivered via {}: {}",
            failed.sink,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }

    let code = if !report.triggered() {
        ExitCode::SUCCESS
    } else if report.delivery_failed() {
        ExitCode::from(EXIT_ALERT_UNDELIVERED)
    } else {
        ExitCode::from(EXIT_ALERT)
    };
    Ok(code)
}

/// Scan and replace the baseline.
fn run_init(config: WatchConfig, password: Option<&str>) -> Result<ExitCode> {
    let monitor = Monitor::new(config, OutputFormat::Text)?;
    let outcome = monitor.init_baseline(password).context("Init failed")?;

    eprintln!(
        "Baseline {} written: {} files, {} hashed in {:.2}s",
        monitor.store().path().display(),
        outcome.snapshot.len(),
        format_size(outcome.stats.bytes_hashed),
        outcome.duration.as_secs_f64()
    );
    Ok(ExitCode::SUCCESS)
}

/// Print the diff without acting on it.
fn run_diff(
    config: WatchConfig,
    password: Option<&str>,
    expected_fingerprint: Option<String>,
    format: Format,
) -> Result<ExitCode> {
    let monitor = Monitor::new(config, format.into())?;

    let mut request = RunRequest::new();
    request.password = password.map(str::to_string);
    request.expected_fingerprint = expected_fingerprint;

    let report = monitor.preview(&request).context("Diff failed")?;

    match format {
        Format::Text => {
            let rendering = AlertReport::new(
                report.diff.clone(),
                report.fingerprint.clone(),
                report.decision.reasons.clone(),
            );
            print!("{}", rendering.render_text());
        }
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    print_summary(&report);

    Ok(if report.triggered() {
        ExitCode::from(EXIT_ALERT)
    } else {
        ExitCode::SUCCESS
    })
}

fn print_summary(report: &RunReport) {
    eprintln!();
    eprintln!("{}", "─".repeat(60));
    eprintln!(
        " {} files hashed ({}) in {:.2}s, {} excluded",
        report.stats.files_hashed,
        format_size(report.stats.bytes_hashed),
        report.scan_duration.as_secs_f64(),
        report.stats.paths_excluded + report.stats.files_skipped
    );
    eprintln!(
        " {} added, {} removed, {} changed",
        report.diff.added.len(),
        report.diff.removed.len(),
        report.diff.changed.len()
    );
    eprintln!(" Fingerprint {}", report.fingerprint);
    if report.triggered() {
        eprintln!(
            " ALERT{}",
            if report.baseline_updated {
                ", baseline updated"
            } else {
                ""
            }
        );
    } else {
        eprintln!(" Everything OK");
    }
    eprintln!("{}", "─".repeat(60));
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
