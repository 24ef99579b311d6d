//! Forecast plotter.
//!
//! Renders the map products of a prepared forecast run, one PNG per step,
//! into the output subfolder of the selected projection.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use clap::Parser;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use forecast_plotter::{load_run, plot_run, ChunkStatus, PlotterConfig, SyntheticRun};

#[derive(Parser, Debug)]
#[command(name = "forecast-plotter")]
#[command(about = "Render forecast map frames for a model run")]
struct Args {
    /// Map projection (default from the configuration)
    projection: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "PLOTTER_CONFIG", default_value = "config/plotter.yaml")]
    config: PathBuf,

    /// Prepared run (JSON)
    #[arg(short, long, required_unless_present = "synthetic")]
    input: Option<PathBuf>,

    /// Render a generated run covering this many hours instead of --input
    #[arg(long, conflicts_with = "input")]
    synthetic: Option<i64>,

    /// Product to render; repeat for several (default: all)
    #[arg(short, long = "product")]
    products: Vec<String>,

    /// Override the configured worker pool size
    #[arg(long, env = "PLOTTER_POOL_SIZE")]
    pool_size: Option<usize>,

    /// Override the configured frames per chunk
    #[arg(long, env = "PLOTTER_CHUNK_SIZE")]
    chunk_size: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json)?;

    let config = PlotterConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?
        .with_overrides(args.pool_size, args.chunk_size)
        .context("Invalid command-line override")?;

    let series = match (&args.input, args.synthetic) {
        (Some(path), _) => load_run(path)?,
        (None, Some(hours)) => {
            let midnight = Utc::now()
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .context("Failed to compute run start")?;
            let run = Utc.from_utc_datetime(&midnight);
            SyntheticRun {
                hours,
                ..SyntheticRun::default()
            }
            .generate(run)
            .context("Failed to generate synthetic run")?
        }
        (None, None) => bail!("either --input or --synthetic is required"),
    };
    if series.is_empty() {
        warn!("run has no frames, nothing to plot");
        return Ok(());
    }

    info!(
        frames = series.len(),
        pool_size = config.pool_size,
        "starting forecast plotter"
    );
    let runs = plot_run(&config, args.projection.as_deref(), &series, &args.products)?;

    let mut failed = 0;
    for run in &runs {
        for report in &run.reports {
            match &report.status {
                ChunkStatus::Completed => {}
                ChunkStatus::Failed { lead_hours, error } => error!(
                    variable = %run.variable,
                    chunk_start = report.range.start,
                    chunk_end = report.range.end,
                    lead_hours = ?lead_hours,
                    error = %error,
                    "chunk failed"
                ),
                ChunkStatus::Crashed { message } => error!(
                    variable = %run.variable,
                    chunk_start = report.range.start,
                    chunk_end = report.range.end,
                    panic = %message,
                    "chunk crashed"
                ),
            }
        }
        failed += run.failed_chunks();
        info!(
            variable = %run.variable,
            files = run.files_written(),
            chunks = run.reports.len(),
            failed = run.failed_chunks(),
            "product finished"
        );
    }

    if failed > 0 {
        bail!("{} chunk(s) failed", failed);
    }
    Ok(())
}
