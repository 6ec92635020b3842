//! Worker pool and run lifecycle
//!
//! `start` spawns one task per configured worker. Each task runs the probe
//! loop until the run's cancellation token fires; `stop` cancels and then
//! joins every task, so when it returns no worker is left running.

use crate::error::{ProbeError, ProbeResult};
use crate::events::EventBus;
use crate::generator::CodeGenerator;
use crate::session::SessionManager;
use crate::stats::StatsAggregator;
use crate::traits::{Notifier, Transport};
use crate::types::{EngineConfig, LogEvent, RunState, StatsSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Concurrent probing engine
pub struct ProbeEngine {
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    session: Arc<SessionManager>,
    stats: Arc<StatsAggregator>,
    events: EventBus,
    state: Arc<RwLock<RunState>>,
    active_run: Mutex<Option<ActiveRun>>,
}

/// Internal state of the current run
struct ActiveRun {
    id: Uuid,
    config: Arc<EngineConfig>,
    cancel_token: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

impl ProbeEngine {
    /// Create an engine around a transport and a notifier
    pub fn new(transport: Arc<dyn Transport>, notifier: Arc<dyn Notifier>) -> Self {
        let events = EventBus::default();
        Self {
            session: Arc::new(SessionManager::new(transport.clone(), events.clone())),
            transport,
            notifier,
            stats: Arc::new(StatsAggregator::new()),
            events,
            state: Arc::new(RwLock::new(RunState::Idle)),
            active_run: Mutex::new(None),
        }
    }

    /// Start a run.
    ///
    /// Returns `Ok(false)` without touching anything if a run is already in
    /// progress. The configuration is frozen for the lifetime of the run.
    pub async fn start(&self, config: EngineConfig) -> ProbeResult<bool> {
        config.validate()?;

        let mut active_run = self.active_run.lock().await;
        if active_run.is_some() {
            warn!("Start ignored, engine is not idle");
            return Ok(false);
        }

        let config = Arc::new(config);
        let run_id = Uuid::new_v4();
        let cancel_token = CancellationToken::new();

        *self.state.write().await = RunState::Running;
        self.stats.reset();

        info!(
            "Starting run {} with {} workers via {} transport",
            run_id,
            config.workers,
            self.transport.name()
        );
        self.events.info(format!("Starting {} threads...", config.workers));

        let workers = (0..config.workers)
            .map(|index| {
                let worker = Worker {
                    index,
                    generator: match config.seed {
                        Some(seed) => CodeGenerator::with_seed(&config, seed.wrapping_add(index as u64)),
                        None => CodeGenerator::new(&config),
                    },
                    pacing_rng: match config.seed {
                        Some(seed) => StdRng::seed_from_u64(seed.rotate_left(17) ^ index as u64),
                        None => StdRng::from_entropy(),
                    },
                    config: config.clone(),
                    transport: self.transport.clone(),
                    notifier: self.notifier.clone(),
                    session: self.session.clone(),
                    stats: self.stats.clone(),
                    events: self.events.clone(),
                    cancel_token: cancel_token.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        *active_run = Some(ActiveRun {
            id: run_id,
            config,
            cancel_token,
            workers,
        });
        Ok(true)
    }

    /// Stop the current run and wait for every worker to exit.
    ///
    /// In-flight probes finish before their worker exits. Returns `false` if
    /// there was nothing to stop.
    pub async fn stop(&self) -> bool {
        let mut active_run = self.active_run.lock().await;
        let Some(run) = active_run.take() else {
            return false;
        };

        *self.state.write().await = RunState::Stopping;
        self.events.info("Stopping...");
        run.cancel_token.cancel();

        for handle in run.workers {
            if let Err(e) = handle.await {
                error!("Worker task failed during shutdown: {}", e);
            }
        }

        self.session.clear().await;
        *self.state.write().await = RunState::Idle;

        let snapshot = self.stats.snapshot();
        info!(
            "Run {} stopped: tested={} valid={}",
            run.id, snapshot.tested, snapshot.valid
        );
        self.events.info("Stopped.");
        true
    }

    pub async fn state(&self) -> RunState {
        *self.state.read().await
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        let mut snapshot = self.stats.snapshot();
        snapshot.session_active = self.session.current().await.is_some();
        snapshot
    }

    /// Subscribe to engine log events
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.events.subscribe()
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Configuration of the current run, if any
    pub async fn config(&self) -> Option<EngineConfig> {
        self.active_run
            .lock()
            .await
            .as_ref()
            .map(|run| run.config.as_ref().clone())
    }
}

/// One probe loop
struct Worker {
    index: usize,
    config: Arc<EngineConfig>,
    generator: CodeGenerator,
    pacing_rng: StdRng,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    session: Arc<SessionManager>,
    stats: Arc<StatsAggregator>,
    events: EventBus,
    cancel_token: CancellationToken,
}

impl Worker {
    async fn run(mut self) {
        debug!("Worker {} started", self.index);
        let sample_every = self.config.debug_sample_every.max(1);
        let backoff = Duration::from_millis(self.config.session_retry_backoff_ms);
        let mut attempts: u64 = 0;
        let mut failures: u64 = 0;

        loop {
            if self.cancel_token.is_cancelled() {
                break;
            }

            let Some(session_id) = self.session.ensure_session().await else {
                if self.pause(backoff).await {
                    break;
                }
                continue;
            };

            let code = self.generator.generate();
            let valid = match self.transport.validate(&code, &session_id).await {
                Ok(valid) => valid,
                Err(e) => {
                    if let ProbeError::SessionUnavailable { .. } = e {
                        self.session.invalidate(&session_id).await;
                    }
                    if failures % sample_every == 0 {
                        self.events.error(format!("Worker {}: probe failed: {}", self.index, e));
                    }
                    failures += 1;
                    false
                }
            };

            self.stats.record_attempt();
            attempts += 1;

            if valid {
                self.stats.record_valid();
                self.events.success(format!("VALID CODE: {}", code));
                let meta = format!("Session: {}", session_id);
                match self.notifier.notify_valid(&code, &meta).await {
                    Ok(()) => self.events.success(format!("Alert sent for {}", code)),
                    Err(e) => self.events.error(format!("Alert delivery failed: {}", e)),
                }
            }

            if attempts % sample_every == 0 {
                self.events.debug(format!(
                    "Worker {} tested {} ({} attempts)",
                    self.index, code, attempts
                ));
            }

            let pacing = self.pacing_delay();
            if self.pause(pacing).await {
                break;
            }
        }
        debug!("Worker {} exited after {} attempts", self.index, attempts);
    }

    fn pacing_delay(&mut self) -> Duration {
        let pacing = self.config.pacing;
        Duration::from_millis(self.pacing_rng.gen_range(pacing.min_ms..=pacing.max_ms))
    }

    /// Sleep unless the run is cancelled first. Returns true on cancellation.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel_token.cancelled() => true,
            _ = tokio::time::sleep(duration) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::NoopNotifier;
    use crate::transport::{SimulatedTransport, SimulationProfile};

    fn engine() -> ProbeEngine {
        let transport = SimulatedTransport::with_seed(
            SimulationProfile { hit_probability: 0.0, ..Default::default() },
            9,
        );
        ProbeEngine::new(Arc::new(transport), Arc::new(NoopNotifier))
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_transitions() {
        let engine = engine();
        assert_eq!(engine.state().await, RunState::Idle);

        assert!(engine.start(EngineConfig { workers: 2, ..Default::default() }).await.unwrap());
        assert_eq!(engine.state().await, RunState::Running);
        assert_eq!(engine.config().await.unwrap().workers, 2);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(engine.snapshot().await.session_active);

        assert!(engine.stop().await);
        assert_eq!(engine.state().await, RunState::Idle);
        assert!(!engine.snapshot().await.session_active);
        assert!(engine.config().await.is_none());
        assert!(!engine.stop().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_running_is_noop() {
        let engine = engine();
        assert!(engine.start(EngineConfig { workers: 1, ..Default::default() }).await.unwrap());
        let started = engine.start(EngineConfig { workers: 9, ..Default::default() }).await.unwrap();
        assert!(!started);
        assert_eq!(engine.config().await.unwrap().workers, 1);
        engine.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_config_rejected() {
        let engine = engine();
        let err = engine
            .start(EngineConfig { workers: 0, ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::InvalidConfig { .. }));
        assert_eq!(engine.state().await, RunState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_stats() {
        let engine = engine();
        engine.start(EngineConfig { workers: 2, ..Default::default() }).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        engine.stop().await;
        assert!(engine.snapshot().await.tested > 0);

        engine.start(EngineConfig { workers: 1, ..Default::default() }).await.unwrap();
        assert_eq!(engine.snapshot().await.tested, 0);
        engine.stop().await;
    }
}
