mod recording;

use anyhow::{Context, Result};
use clap::Parser;
use form_vision::parallel_pipeline::SessionPool;
use form_vision::pipeline::SessionConfig;
use form_vision::summary::SessionSummary;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "form_tester")]
#[command(about = "Replays recorded pose keypoints through the form engine and prints session summaries")]
struct Args {
    /// JSON-lines keypoint recordings, one frame per line.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// JSON file with session parameters. Flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame rate of the recordings.
    #[arg(long)]
    fps: Option<f64>,

    /// Temporal window duration in seconds.
    #[arg(long)]
    window_seconds: Option<f64>,

    /// Consecutive frames a new label must win before it is displayed.
    #[arg(long)]
    stability_threshold: Option<u32>,

    /// "auto", or an activity name to force.
    #[arg(long)]
    mode: Option<String>,

    /// Print every frame's assessment as well as the summary.
    #[arg(long)]
    per_frame: bool,

    /// Number of session workers. Defaults to the number of logical CPUs.
    #[arg(long)]
    workers: Option<usize>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Serialize)]
struct Report<'a> {
    input: &'a Path,
    summary: &'a SessionSummary,
}

fn session_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => SessionConfig::default(),
    };

    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    if let Some(window_seconds) = args.window_seconds {
        config.window_seconds = window_seconds;
    }
    if let Some(threshold) = args.stability_threshold {
        config.stability_threshold = threshold;
    }
    if let Some(mode) = &args.mode {
        config.mode = mode.clone();
    }
    Ok(config)
}

async fn replay(pool: &SessionPool, input: &Path, config: SessionConfig, per_frame: bool) -> Result<SessionSummary> {
    let frames = recording::load_recording(input).await?;
    let session = pool.open(config).await?;
    info!(input = %input.display(), frames = frames.len(), session, "replaying recording");

    for (index, frame) in frames.iter().enumerate() {
        let assessment = pool.submit(session, frame.keypoints(), frame.frame_size()).await?;
        if per_frame {
            println!("{}", json!({ "input": input, "frame": index, "assessment": assessment }));
        }
    }

    Ok(pool.close(session).await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Argument Parsing & Logging ---
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .with_writer(std::io::stderr)
        .init();

    // --- 2. Session Configuration ---
    let config = session_config(&args)?;
    info!(?config, inputs = args.inputs.len(), "starting replay");

    // --- 3. Worker Pool ---
    let pool = match args.workers {
        Some(workers) => SessionPool::new(workers),
        None => SessionPool::with_default_workers(),
    };

    // --- 4. Concurrent Replay ---
    let replays = args
        .inputs
        .iter()
        .map(|input| replay(&pool, input, config.clone(), args.per_frame));
    let results = futures::future::join_all(replays).await;

    // --- 5. Reporting ---
    let mut failures = 0;
    for (input, result) in args.inputs.iter().zip(results) {
        match result {
            Ok(summary) => {
                let report = Report { input, summary: &summary };
                println!("{}", serde_json::to_string(&report)?);
            }
            Err(error) => {
                warn!(input = %input.display(), "replay failed: {error:#}");
                failures += 1;
            }
        }
    }

    pool.shutdown().await;

    if failures > 0 {
        anyhow::bail!("{failures} of {} recordings failed", args.inputs.len());
    }
    Ok(())
}
