use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{Table, Tabled};

use vitalrs::logging::init_logging;
use vitalrs::{
    AppConfig, DayOrder, InMemorySampleProvider, InsightEngine, LogConfig, LogLevel, MetricKind,
    MetricSample, TomlGoalStore, VitalError, WindowResult,
};

/// vitalrs - Health metrics insight CLI
///
/// Aggregates wearable samples into daily windows, zones, trends and goal
/// progress.
#[derive(Parser)]
#[command(name = "vitalrs")]
#[command(version, about = "Health metrics aggregation and insight CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON file containing an array of samples
    #[arg(short, long, value_name = "FILE")]
    samples: Option<PathBuf>,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// UTC offset used to assign samples to calendar days, e.g. +05:30 or -8
    #[arg(long, allow_hyphen_values = true, value_parser = parse_utc_offset)]
    utc_offset: Option<FixedOffset>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily aggregates over a window
    Window {
        #[arg(short, long)]
        metric: MetricKind,

        /// Window length in days
        #[arg(short, long, default_value = "7")]
        days: usize,

        /// Newest day first
        #[arg(long)]
        desc: bool,
    },

    /// Recent against prior trend
    Trend {
        #[arg(short, long)]
        metric: MetricKind,

        #[arg(short, long, default_value = "7")]
        days: usize,
    },

    /// Time in zone for a day
    Zones {
        #[arg(short, long, default_value = "heart_rate")]
        metric: MetricKind,

        /// Day to break down (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Today's goal progress
    Goal {
        #[arg(short, long, default_value = "steps")]
        metric: MetricKind,
    },

    /// Goal attainment over a window
    History {
        #[arg(short, long, default_value = "steps")]
        metric: MetricKind,

        #[arg(short, long, default_value = "7")]
        days: usize,
    },

    /// Classify a single value
    Classify {
        #[arg(short, long)]
        metric: MetricKind,

        #[arg(long, allow_negative_numbers = true)]
        value: f64,
    },

    /// Show or change configuration
    Config {
        /// Print the active configuration
        #[arg(long)]
        show: bool,

        /// Set a goal, e.g. steps=12000
        #[arg(long, value_name = "METRIC=VALUE")]
        set_goal: Option<String>,
    },
}

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
    #[tabled(rename = "Samples")]
    samples: usize,
    #[tabled(rename = "Zone")]
    zone: String,
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Hours")]
    hours: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<VitalError>() {
            Some(vital) => {
                vital.log();
                eprintln!("{} {}", "error:".red().bold(), vital.user_message());
            }
            None => eprintln!("{} {:#}", "error:".red().bold(), e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    let config = if config_path.exists() {
        AppConfig::load_from_file(&config_path)?
    } else {
        AppConfig::default()
    };

    let log_config = LogConfig {
        level: LogLevel::from_verbosity(cli.verbose, config.logging.level),
        ..config.logging.clone()
    };
    init_logging(&log_config)?;

    let offset = cli.utc_offset.unwrap_or_else(|| Local::now().offset().fix());
    let today = cli.today.unwrap_or_else(|| today_in(offset, Utc::now()));

    let provider = load_provider(cli.samples.as_ref(), offset)?;
    let goal_store = Arc::new(TomlGoalStore::new(config_path.clone()));
    let engine =
        InsightEngine::from_config(Arc::new(provider), goal_store, &config).with_anchor(today);

    match cli.command {
        Commands::Window { metric, days, desc } => {
            let window = engine.get_window(metric, days).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&window)?);
            } else {
                let order = if desc { DayOrder::Descending } else { DayOrder::Ascending };
                print_window(&engine, &window, order);
            }
        }

        Commands::Trend { metric, days } => {
            let trend = engine.get_trend(metric, days).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&trend)?);
            } else {
                demo_banner(trend.is_synthetic);
                println!("{} trend over {} days", metric.to_string().cyan().bold(), days);
                println!("  Prior average:  {:.1} {}", trend.prior_average, metric.unit());
                println!("  Recent average: {:.1} {}", trend.recent_average, metric.unit());
                println!("  Change:         {:+.1}% ({})", trend.percent_delta, trend.direction);
            }
        }

        Commands::Zones { metric, date } => {
            let day = date.unwrap_or_else(|| engine.today());
            let breakdown = engine.get_zone_breakdown(metric, day).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&breakdown)?);
            } else {
                let table = vitalrs::table_for(metric);
                let rows: Vec<ZoneRow> = breakdown
                    .zones
                    .iter()
                    .enumerate()
                    .map(|(i, zt)| ZoneRow {
                        zone: zt.zone.label.to_string(),
                        range: table.describe_range(i),
                        hours: format!("{:.2}", zt.hours),
                    })
                    .collect();
                println!("{} zones on {}", metric.to_string().cyan().bold(), day);
                println!("{}", Table::new(rows));
                println!("  Total: {:.2} h from {} samples", breakdown.total_hours, breakdown.sample_count);
            }
        }

        Commands::Goal { metric } => {
            let progress = engine.get_goal_progress(metric).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&progress)?);
            } else {
                let status = if progress.met_goal {
                    "goal met".green().bold()
                } else {
                    "in progress".yellow()
                };
                println!(
                    "{}: {} / {} ({:.0}%) {}",
                    metric.to_string().cyan().bold(),
                    progress.current,
                    progress.goal,
                    progress.percent * 100.0,
                    status
                );
            }
        }

        Commands::History { metric, days } => {
            let history = engine.get_goal_history(metric, days).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                demo_banner(history.is_synthetic);
                println!(
                    "{}: goal met on {} of {} days, average {:.0} {}",
                    metric.to_string().cyan().bold(),
                    history.met_count,
                    history.window_days,
                    history.average,
                    metric.unit()
                );
            }
        }

        Commands::Classify { metric, value } => {
            let zone = engine.classify(metric, value);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(zone)?);
            } else {
                let label = zone.label.color(zone.severity.color()).bold();
                println!("{} {} {}: {} - {}", metric, value, metric.unit(), label, zone.description);
            }
        }

        Commands::Config { show, set_goal } => {
            if let Some(assignment) = set_goal {
                let (metric, goal) = parse_goal_assignment(&assignment)?;
                engine.goals().set_goal(metric, goal)?;
                println!("{} {} goal set to {}", "✓".green(), metric, goal);
            }
            if show {
                let current = AppConfig::load_or_default(&config_path);
                println!("# {}", config_path.display());
                println!("{}", toml::to_string_pretty(&current)?);
            }
        }
    }

    Ok(())
}

fn load_provider(path: Option<&PathBuf>, offset: FixedOffset) -> Result<InMemorySampleProvider> {
    let Some(path) = path else {
        return Ok(InMemorySampleProvider::with_offset(offset));
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read samples file: {}", path.display()))?;
    let samples: Vec<MetricSample> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse samples file: {}", path.display()))?;

    let provider = InMemorySampleProvider::from_samples(samples, offset);
    tracing::info!(samples = provider.sample_count(), path = %path.display(), "Samples loaded");
    Ok(provider)
}

/// Parse `+HH:MM`, `-HH:MM` or a whole number of hours
fn parse_utc_offset(s: &str) -> std::result::Result<FixedOffset, String> {
    let invalid = || format!("invalid UTC offset '{}', expected +HH:MM or hours", s);
    let trimmed = s.trim();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..60).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Calendar date at `now` under the offset samples are bucketed with
fn today_in(offset: FixedOffset, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

fn parse_goal_assignment(assignment: &str) -> Result<(MetricKind, i64)> {
    let (metric, value) = assignment
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected METRIC=VALUE, got '{}'", assignment))?;
    let metric: MetricKind = metric.trim().parse().map_err(|e: String| anyhow!(e))?;
    let goal: i64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid goal value: {}", value))?;
    Ok((metric, goal))
}

fn demo_banner(is_synthetic: bool) {
    if is_synthetic {
        println!(
            "{}",
            "Demo data: no samples recorded for this period, values are placeholders".yellow().bold()
        );
    }
}

fn print_window(engine: &InsightEngine, window: &WindowResult, order: DayOrder) {
    let fmt = |v: Option<f64>| v.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".to_string());

    demo_banner(window.is_synthetic);

    let rows: Vec<DayRow> = window
        .ordered(order)
        .into_iter()
        .map(|d| DayRow {
            day: d.day.to_string(),
            mean: fmt(d.mean),
            min: fmt(d.min),
            max: fmt(d.max),
            samples: d.sample_count,
            zone: d
                .mean
                .map(|m| engine.classify(window.metric, m).label.to_string())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    println!("{} ({})", window.metric.to_string().cyan().bold(), window.metric.unit());
    println!("{}", Table::new(rows));
    println!(
        "  Mean {}  Min {}  Max {}  Days with data {}/{}",
        fmt(window.summary.mean),
        fmt(window.summary.min),
        fmt(window.summary.max),
        window.summary.days_with_data,
        window.len()
    );
}
