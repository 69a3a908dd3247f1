use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Local, NaiveDateTime, Timelike};
use clap::Parser;
use livegantt::{
    process::{date_parser::parse_timestamp, load_csv},
    sanitize_with, select_window,
    window::{reference_end, Window},
    SanitizeConfig, SchemaMapping,
};
use std::{
    io::{self, Write},
    path::PathBuf,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Clean a scheduler accounting export and select the jobs of its last N hours"
)]
struct Args {
    /// Accounting export (CSV with a header row)
    #[arg(short, long)]
    input: PathBuf,
    /// Window length, counted back from the export's last record
    #[arg(long, default_value_t = 72)]
    hours: i64,
    /// Cluster name shown in the chart title
    #[arg(long, default_value = "cluster")]
    cluster: String,
    /// Reference instant for unfinished jobs (YYYY-MM-DDTHH:MM:SS); defaults to now
    #[arg(long)]
    now: Option<String>,
    /// Built-in export dialect, ignored when the config carries one
    #[arg(long, default_value = "sacct-2022")]
    dialect: String,
    /// YAML file with sanitize settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the windowed jobs as JSON lines on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SanitizeConfig::from_yaml_file(path)?,
        None => SanitizeConfig::default(),
    };
    let mapping = match &config.dialect {
        Some(m) => m.clone(),
        None => SchemaMapping::builtin(&args.dialect)
            .ok_or_else(|| anyhow!("unknown dialect `{}`", args.dialect))?,
    };
    let now = match &args.now {
        Some(s) => parse_timestamp(s).ok_or_else(|| anyhow!("--now: bad timestamp `{}`", s))?,
        None => {
            let local = Local::now().naive_local();
            local.with_nanosecond(0).unwrap_or(local)
        }
    };

    let raw = load_csv(&args.input)?;

    let end = reference_end(&raw, &mapping, &config.sentinel)?.unwrap_or(now);
    let window = chart_window(end, args.hours)?;
    info!(start = %window.start, end = %window.end, "chart window");

    let sanitized = sanitize_with(&raw, &mapping, now, &config)
        .with_context(|| format!("sanitizing {}", args.input.display()))?;
    let windowed = select_window(&sanitized.table, window.start, window.end);

    info!(
        title = %format!("Status for cluster {}", args.cluster),
        raw = raw.len(),
        cleaned = sanitized.table.len(),
        dropped = sanitized.rejections.len(),
        malformed = sanitized.malformed_count(),
        windowed = windowed.len(),
        "ready for rendering"
    );

    if args.json {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for job in &windowed {
            serde_json::to_writer(&mut out, job)?;
            writeln!(out)?;
        }
        out.flush()?;
    }

    Ok(())
}

/// The last `hours` before `end`.
fn chart_window(end: NaiveDateTime, hours: i64) -> Result<Window> {
    if hours <= 0 {
        return Err(anyhow!("--hours must be positive, got {}", hours));
    }
    Duration::try_hours(hours)
        .and_then(|length| Window::trailing(end, length))
        .ok_or_else(|| anyhow!("--hours out of range: {}", hours))
}
