//! CLI entry point for the trip status tool.
//!
//! Loads a static GTFS schedule, reads one GTFS-RT feed and prints every
//! alert and every stop where a trip of the selected category is running
//! later than the configured threshold.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use trip_status::{
    archive::extract_archive,
    classify::Classifier,
    config::ClassifierConfig,
    fetch::{Authenticated, BasicClient, FeedAuth, load_feed_bytes},
    output::{OutputFormat, log_summary, write_events},
    parser::parse_feed,
    schedule::{ScheduleIndex, VehicleType},
    summary::FeedSummary,
};

const DEFAULT_FEED_URL: &str = "https://gtfsrt.api.translink.com.au/Feed/SEQ";

#[derive(Parser)]
#[command(name = "trip_status")]
#[command(version, about = "Reports transit trips running late from GTFS and GTFS-RT data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one GTFS-RT feed against a static GTFS schedule
    Run {
        /// GTFS static data zip
        #[arg(long, default_value = "data/gtfs.zip")]
        gtfs: PathBuf,

        /// Already-extracted GTFS directory, used instead of --gtfs
        #[arg(long)]
        gtfs_dir: Option<PathBuf>,

        /// GTFS-RT feed file or URL
        #[arg(long = "gtfs-rt", value_name = "FILE_OR_URL", default_value = DEFAULT_FEED_URL)]
        gtfs_rt: String,

        /// JSON file with classifier settings
        #[arg(short, long)]
        config: Option<String>,

        /// Vehicle category to report on (overrides the config file)
        #[arg(long, value_enum)]
        vehicle_type: Option<VehicleType>,

        /// Delay in seconds above which a stop is reported (overrides the config file)
        #[arg(long)]
        slow_threshold_secs: Option<i32>,

        /// Output format for reported events
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Send GTFS_RT_API_KEY in this HTTP header
        #[arg(long, conflicts_with = "api_key_param")]
        api_key_header: Option<String>,

        /// Send GTFS_RT_API_KEY as this URL query parameter
        #[arg(long)]
        api_key_param: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/trip_status.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("trip_status.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            gtfs,
            gtfs_dir,
            gtfs_rt,
            config,
            vehicle_type,
            slow_threshold_secs,
            format,
            api_key_header,
            api_key_param,
        } => {
            let config = match config {
                Some(path) => ClassifierConfig::load(&path)?,
                None => ClassifierConfig::default(),
            }
            .with_overrides(vehicle_type, slow_threshold_secs);

            let auth = feed_auth(api_key_header.as_deref(), api_key_param.as_deref())?;

            let index = tokio::task::spawn_blocking(move || load_schedule(gtfs_dir, gtfs))
                .await
                .context("schedule loading task failed")??;

            run(&index, config, &gtfs_rt, auth, format).await?;
        }
    }

    Ok(())
}

/// Builds the schedule index from a directory, or from the zip after
/// extracting it into a scratch directory that is removed afterwards.
fn load_schedule(gtfs_dir: Option<PathBuf>, gtfs_zip: PathBuf) -> Result<ScheduleIndex> {
    let index = match gtfs_dir {
        Some(dir) => ScheduleIndex::build(&dir)
            .with_context(|| format!("could not load GTFS schedule from {}", dir.display()))?,
        None => {
            let work_dir = extract_archive(&gtfs_zip)
                .with_context(|| format!("could not extract GTFS data {}", gtfs_zip.display()))?;
            ScheduleIndex::build(work_dir.path()).context("could not load GTFS schedule")?
        }
    };

    if index.is_empty() {
        warn!("Schedule index is empty, only alerts and unreferenced trips can be reported");
    } else {
        info!(trips = index.len(), "Schedule index built");
    }
    Ok(index)
}

fn feed_auth(header: Option<&str>, param: Option<&str>) -> Result<Option<FeedAuth>> {
    let auth = match (header, param) {
        (Some(name), _) => Some(FeedAuth::header(name, &api_key()?)?),
        (None, Some(name)) => Some(FeedAuth::query_param(name, &api_key()?)),
        (None, None) => None,
    };
    Ok(auth)
}

fn api_key() -> Result<String> {
    std::env::var("GTFS_RT_API_KEY")
        .context("GTFS_RT_API_KEY must be set when an api key option is given")
}

/// Fetches, decodes and classifies one feed, then prints the events.
#[tracing::instrument(skip(index, auth, format))]
async fn run(
    index: &ScheduleIndex,
    config: ClassifierConfig,
    source: &str,
    auth: Option<FeedAuth>,
    format: OutputFormat,
) -> Result<()> {
    let client = BasicClient::new()?;
    let bytes = match auth {
        Some(auth) => {
            let client = Authenticated {
                inner: client,
                auth,
            };
            load_feed_bytes(&client, source).await
        }
        None => load_feed_bytes(&client, source).await,
    }
    .context("could not access feed")?;

    let feed = parse_feed(&bytes).context("could not unmarshal feed")?;

    let classifier = Classifier::new(index, config);
    info!(
        vehicle_type = ?classifier.config().relevant_vehicle_type,
        slow_threshold_seconds = classifier.config().slow_threshold_seconds,
        "Classifier configured"
    );
    let events = classifier.classify(&feed);

    write_events(std::io::stdout().lock(), &events, format)?;

    let summary = FeedSummary::from_feed(&feed).record(&events);
    info!(
        entities = summary.total_entities,
        trip_updates = summary.trip_updates,
        alerts = summary.alert_events,
        slow_trips = summary.slow_trip_events,
        feed_age_secs = summary.feed_age_seconds(Utc::now()),
        "Feed classified"
    );
    log_summary(&summary)?;

    Ok(())
}
