//! Probe Runner
//!
//! Command-line host for the probe engine: loads configuration, wires the
//! simulated backend, streams engine events into the log and prints periodic
//! statistics until interrupted or the requested duration elapses.

use anyhow::Context;
use clap::Parser;
use probe_engine::{
    transport_for, AlphabetMode, EngineConfig, EventLog, LogLevel, LogNotifier, NoopNotifier,
    Notifier, ProbeEngine, SimulationProfile, StatsSnapshot,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

pub mod logging;

#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Length of generated codes
    #[arg(long)]
    pub length: Option<usize>,

    /// Alphabet mode: digits, lowercase, alphanumeric or custom
    #[arg(long)]
    pub alphabet: Option<AlphabetMode>,

    /// Characters used when the alphabet mode is custom
    #[arg(long)]
    pub custom_alphabet: Option<String>,

    /// Probability that a simulated probe reports valid
    #[arg(long)]
    pub hit_probability: Option<f64>,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop after this many seconds (runs until Ctrl-C when unset)
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Seconds between statistics reports
    #[arg(long, default_value_t = 5)]
    pub report_interval_secs: u64,

    /// Number of recent engine events printed on exit
    #[arg(long, default_value_t = 10)]
    pub tail: usize,

    /// Print statistics as JSON
    #[arg(long)]
    pub json: bool,
}

/// On-disk configuration: engine settings plus the simulated backend profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    #[serde(flatten)]
    pub engine: EngineConfig,
    pub simulation: SimulationProfile,
}

/// Resolve configuration: defaults, then the config file, then CLI flags
pub fn load_config(args: &Args) -> anyhow::Result<RunnerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str::<RunnerConfig>(&raw)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        }
        None => RunnerConfig::default(),
    };

    if let Some(workers) = args.workers {
        config.engine.workers = workers;
    }
    if let Some(length) = args.length {
        config.engine.code_length = length;
    }
    if let Some(alphabet) = args.alphabet {
        config.engine.alphabet = alphabet;
    }
    if let Some(custom) = &args.custom_alphabet {
        config.engine.custom_alphabet = custom.clone();
    }
    if let Some(probability) = args.hit_probability {
        config.simulation.hit_probability = probability;
    }
    if let Some(seed) = args.seed {
        config.engine.seed = Some(seed);
    }

    config.engine.validate()?;
    if !(0.0..=1.0).contains(&config.simulation.hit_probability) {
        anyhow::bail!("hit_probability must be within [0, 1]");
    }
    Ok(config)
}

/// Build an engine for the given configuration
pub fn build_engine(config: &RunnerConfig) -> anyhow::Result<ProbeEngine> {
    let transport = transport_for(&config.engine, config.simulation.clone())?;
    let notifier: Arc<dyn Notifier> = if config.engine.alert.is_configured() {
        Arc::new(LogNotifier)
    } else {
        Arc::new(NoopNotifier)
    };
    Ok(ProbeEngine::new(transport, notifier))
}

pub async fn run(args: Args) -> anyhow::Result<StatsSnapshot> {
    let duration = args.duration_secs.map(Duration::from_secs);
    let shutdown = async move {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl-C: {}", e);
                }
            }
        }
    };
    run_until(args, shutdown).await
}

/// Run the engine until `shutdown` resolves, then stop it and return the final stats
pub async fn run_until<F>(args: Args, shutdown: F) -> anyhow::Result<StatsSnapshot>
where
    F: Future<Output = ()>,
{
    let config = load_config(&args)?;
    let engine = build_engine(&config)?;

    let history = Arc::new(Mutex::new(EventLog::default()));
    let mut events = engine.subscribe();
    let collector = {
        let history = history.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Ok(mut log) = history.lock() {
                            log.push(event);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Event history skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    tracing::info!("Starting probe runner...");
    tracing::info!("  Workers:  {}", config.engine.workers);
    tracing::info!(
        "  Codes:    {} chars, {:?} alphabet",
        config.engine.code_length,
        config.engine.alphabet
    );
    tracing::info!("  Backend:  {}", config.engine.transport);

    engine.start(config.engine.clone()).await?;

    let mut report = tokio::time::interval(Duration::from_secs(args.report_interval_secs.max(1)));
    report.tick().await;
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = report.tick() => print_snapshot(&engine.snapshot().await, args.json)?,
        }
    }

    engine.stop().await;
    let snapshot = engine.snapshot().await;
    // Dropping the engine closes the event stream and lets the collector drain.
    drop(engine);
    if let Err(e) = collector.await {
        tracing::debug!("Event collector ended abnormally: {}", e);
    }

    if let Ok(log) = history.lock() {
        let skip = log.len().saturating_sub(args.tail);
        for event in log.iter().skip(skip) {
            if event.level != LogLevel::Debug {
                println!("[{}] {}", event.timestamp.format("%H:%M:%S"), event.message);
            }
        }
    }
    print_snapshot(&snapshot, args.json)?;
    Ok(snapshot)
}

fn print_snapshot(snapshot: &StatsSnapshot, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
    } else {
        println!(
            "tested={} valid={} rate={}/min session={}",
            snapshot.tested,
            snapshot.valid,
            snapshot.rate_per_minute,
            if snapshot.session_active { "ACTIVE" } else { "NONE" }
        );
    }
    Ok(())
}
