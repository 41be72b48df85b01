mod runtime;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use robohead_core::RoboheadConfig;
use robohead_expression::EyeAnimator;
use robohead_limbic::{CadenceConfig, CatalogSink, MoodEngine};
use robohead_perception::{EnvironmentAggregator, GazeTracker};
use runtime::{Clock, RenderLoop, TraceRenderer};
use scenario::{Scenario, ScriptedCamera};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file (defaults are used only if it is missing)
    #[arg(short, long, env = "ROBOHEAD_CONFIG", default_value = "robohead.toml")]
    config: String,

    /// Seed every random source for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    duration_secs: Option<f64>,

    /// Scripted scene fed to the perception thread
    #[arg(long, value_enum, default_value_t = Scenario::Day)]
    scenario: Scenario,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout is reserved for the final status line
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // A file that exists must load cleanly; only a missing one means defaults
    let config_path = Path::new(&args.config);
    let config_found = config_path.exists();
    let config = if config_found {
        RoboheadConfig::load(config_path)?
    } else {
        RoboheadConfig::from_env()?
    };
    init_tracing(&config.logging.level);
    if config_found {
        info!("Loaded config from {}", args.config);
    } else {
        info!("No config file at {}, running on defaults", args.config);
    }
    info!("Starting robohead (scenario={:?}, seed={:?})", args.scenario, args.seed);

    let duration = match args.duration_secs {
        Some(secs) if secs.is_finite() && secs >= 0.0 => Some(Duration::from_secs_f64(secs)),
        Some(secs) => anyhow::bail!("--duration-secs must be a non-negative number, got {}", secs),
        None => None,
    };

    let clock = Clock::start();

    // 1. Perception side
    let aggregator = Arc::new(
        EnvironmentAggregator::new(&config.environment).context("Invalid [environment] config")?,
    );
    let tracker = GazeTracker::new(&config.tracking).context("Invalid [tracking] config")?;
    let gaze = tracker.subscribe();
    let camera = ScriptedCamera::new(
        args.scenario,
        clock,
        config.tracking.frame_width,
        config.tracking.frame_height,
        args.seed.map(|s| s.wrapping_add(2)),
    );

    // 2. Expression and mood
    let animator = match args.seed {
        Some(seed) => EyeAnimator::seeded(config.animation.clone(), seed),
        None => EyeAnimator::from_entropy(config.animation.clone()),
    }
    .context("Invalid [animation] config")?;

    let catalog = config.sink.catalog().context("Invalid [sink] config")?;
    info!("Mood sink accepts {} moods", catalog.len());
    let sink = CatalogSink::new(catalog);
    let engine = match args.seed {
        Some(seed) => MoodEngine::seeded(config.mood_engine.clone(), sink, seed.wrapping_add(1)),
        None => MoodEngine::from_entropy(config.mood_engine.clone(), sink),
    }
    .context("Invalid [mood_engine] config")?;

    // 3. Run
    let running = Arc::new(AtomicBool::new(true));
    let perception = runtime::spawn_perception(
        camera,
        tracker,
        Arc::clone(&aggregator),
        Arc::clone(&running),
        clock,
    )
    .context("Failed to start perception thread")?;

    let cadence = CadenceConfig::from_display(&config.display);
    info!(
        "Render loop at {:.0} fps, mood tick every {:.2}s",
        1.0 / cadence.frame_interval.as_secs_f64(),
        cadence.mood_interval.as_secs_f64()
    );
    let mut render = RenderLoop {
        cadence,
        animator,
        engine,
        renderer: TraceRenderer::new(u64::from(config.display.fps_target.max(1)) * 10),
        aggregator,
        gaze,
        clock,
    };
    let outcome = render.run(duration).await;

    running.store(false, Ordering::Relaxed);
    perception
        .join()
        .map_err(|_| anyhow::anyhow!("Perception thread panicked"))?;
    outcome?;

    // 4. Report
    let now = clock.now();
    let status = render.engine.status(now);
    info!(
        "Stopped after {} frames, {} mood changes, {} rejected",
        render.renderer.frames(),
        render.engine.sink().changes(),
        render.engine.sink().rejections()
    );
    println!("{}", serde_json::to_string(&status)?);

    Ok(())
}
