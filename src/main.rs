use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use usage_meter::config::get_config;
use usage_meter::logging::init_logging;
use usage_meter::models::ReportMeta;
use usage_meter::pipeline::{CollectOptions, Pipeline};
use usage_meter::report::ReportWriter;
use usage_meter::storage::local::LocalSource;
use usage_meter::window::TimeRange;

#[derive(Parser)]
#[command(name = "usage-meter")]
#[command(about = "Aggregate per-resource usage events into a billing report archive")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect usage for a billing period into a report archive
    Collect {
        /// Account whose usage is collected
        #[arg(long)]
        account: String,
        /// Root directory holding partitioned event data
        #[arg(long)]
        root: PathBuf,
        /// Billing period as a calendar month (YYYY-MM)
        #[arg(long, conflicts_with_all = ["start", "end"])]
        month: Option<String>,
        /// Period start date (YYYY-MM-DD, inclusive)
        #[arg(long, requires = "end")]
        start: Option<String>,
        /// Period end date (YYYY-MM-DD, exclusive)
        #[arg(long, requires = "start")]
        end: Option<String>,
        /// Output archive path (default: usage-<account>-<start>.tgz)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Permit collection for an in-progress period
        #[arg(long)]
        allow_incomplete: bool,
        /// Aggregation window size in hours
        #[arg(long)]
        window_hours: Option<i64>,
        /// Maximum simultaneous object fetches
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            account,
            root,
            month,
            start,
            end,
            out,
            allow_incomplete,
            window_hours,
            concurrency,
        } => {
            let config = get_config();
            let range = resolve_period(month.as_deref(), start.as_deref(), end.as_deref())?;

            let allow_incomplete = allow_incomplete || config.collect.allow_incomplete;
            if range.end > Utc::now() && !allow_incomplete {
                bail!(
                    "billing period ends in the future ({}); pass --allow-incomplete to collect anyway",
                    range.end.format("%Y-%m-%d")
                );
            }

            let out = out.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "usage-{}-{}.tgz",
                    account,
                    range.start.format("%Y-%m-%d")
                ))
            });

            let opts = CollectOptions::new(&account)
                .with_window(Duration::hours(
                    window_hours.unwrap_or(config.collect.window_hours),
                ))
                .with_concurrency(concurrency.unwrap_or(config.collect.concurrency));

            if let Err(e) = collect(&account, root, range, &out, opts).await {
                // Never leave a partial archive behind.
                let _ = std::fs::remove_file(&out);
                eprintln!("Error: {e}");
                process::exit(1);
            }
            println!("Wrote {}", out.display());
            Ok(())
        }
    }
}

async fn collect(
    account: &str,
    root: PathBuf,
    range: TimeRange,
    out: &PathBuf,
    opts: CollectOptions,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let source = Arc::new(LocalSource::new(root));
    let pipeline = Pipeline::new(source, opts);

    let meta = ReportMeta {
        account: account.to_string(),
        time_range: range.truncated(),
        collected_at: Utc::now(),
    };

    let file = std::fs::File::create(out)
        .with_context(|| format!("creating output file {}", out.display()))?;
    let gz = GzEncoder::new(file, Compression::default());
    let mut writer = ReportWriter::new(meta, gz)?;

    pipeline.run(range, &mut writer, &cancel).await?;

    let gz = writer.close()?;
    gz.finish().context("finalizing archive")?;
    Ok(())
}

/// Resolve the billing period: a calendar month or an explicit start/end
/// date pair (end exclusive), all UTC.
fn resolve_period(
    month: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<TimeRange> {
    match (month, start, end) {
        (Some(month), None, None) => {
            let (year, mon) = parse_month(month)?;
            let start = first_of_month(year, mon)?;
            let end = if mon == 12 {
                first_of_month(year + 1, 1)?
            } else {
                first_of_month(year, mon + 1)?
            };
            Ok(TimeRange::new(start, end)?)
        }
        (None, Some(start), Some(end)) => {
            let start = parse_date(start)?;
            let end = parse_date(end)?;
            Ok(TimeRange::new(start, end)?)
        }
        _ => bail!("specify either --month or both --start and --end"),
    }
}

fn parse_month(s: &str) -> Result<(i32, u32)> {
    let (year, mon) = s
        .split_once('-')
        .with_context(|| format!("invalid month {s:?}, want YYYY-MM"))?;
    let year: i32 = year.parse().with_context(|| format!("invalid year in {s:?}"))?;
    let mon: u32 = mon.parse().with_context(|| format!("invalid month in {s:?}"))?;
    if !(1..=12).contains(&mon) {
        bail!("month out of range in {s:?}");
    }
    Ok((year, mon))
}

fn first_of_month(year: i32, month: u32) -> Result<chrono::DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("invalid calendar month {year}-{month:02}"))?;
    Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).context("invalid time")?))
}

fn parse_date(s: &str) -> Result<chrono::DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date {s:?}, want YYYY-MM-DD"))?;
    Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).context("invalid time")?))
}
