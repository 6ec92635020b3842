//! Simulated transport
//!
//! Stands in for a network backend: every validation sleeps a random
//! latency and succeeds with a small fixed probability. Session tokens are
//! synthesized locally.

use crate::error::{ProbeError, ProbeResult};
use crate::traits::Transport;
use crate::types::{EngineConfig, TransportMode};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Latency and hit-rate profile of the simulated backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationProfile {
    /// Lower latency bound (inclusive)
    pub min_delay_ms: u64,
    /// Upper latency bound (exclusive)
    pub max_delay_ms: u64,
    /// Probability in [0, 1] that a probe reports valid
    pub hit_probability: f64,
    /// Latency of a session fetch
    pub session_delay_ms: u64,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            min_delay_ms: 200,
            max_delay_ms: 700,
            hit_probability: 0.0001,
            session_delay_ms: 0,
        }
    }
}

pub struct SimulatedTransport {
    profile: SimulationProfile,
    rng: Mutex<StdRng>,
}

impl SimulatedTransport {
    pub fn new(profile: SimulationProfile) -> Self {
        Self {
            profile,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(profile: SimulationProfile, seed: u64) -> Self {
        Self {
            profile,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn profile(&self) -> &SimulationProfile {
        &self.profile
    }

    /// Draw latency and outcome together so the lock is never held across an await
    fn roll(&self) -> (Duration, bool) {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let delay_ms = if self.profile.max_delay_ms > self.profile.min_delay_ms {
            rng.gen_range(self.profile.min_delay_ms..self.profile.max_delay_ms)
        } else {
            self.profile.min_delay_ms
        };
        let hit = rng.gen_bool(self.profile.hit_probability.clamp(0.0, 1.0));
        (Duration::from_millis(delay_ms), hit)
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(SimulationProfile::default())
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn validate(&self, _code: &str, _session_id: &str) -> ProbeResult<bool> {
        let (delay, hit) = self.roll();
        tokio::time::sleep(delay).await;
        Ok(hit)
    }

    async fn acquire_session(&self) -> ProbeResult<Option<String>> {
        if self.profile.session_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.profile.session_delay_ms)).await;
        }
        Ok(Some(format!("sim-{}", Uuid::new_v4())))
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

/// Build the transport selected by `config.transport`.
///
/// Only the simulated backend ships with this crate; other modes are rejected.
pub fn transport_for(
    config: &EngineConfig,
    profile: SimulationProfile,
) -> ProbeResult<Arc<dyn Transport>> {
    match config.transport {
        TransportMode::Simulated => {
            let transport = match config.seed {
                Some(seed) => SimulatedTransport::with_seed(profile, seed),
                None => SimulatedTransport::new(profile),
            };
            Ok(Arc::new(transport))
        }
        mode => Err(ProbeError::UnsupportedTransport {
            mode: mode.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_validate_latency_within_profile() {
        let transport = SimulatedTransport::with_seed(SimulationProfile::default(), 3);
        for _ in 0..10 {
            let started = tokio::time::Instant::now();
            transport.validate("123456", "sid").await.unwrap();
            let elapsed = started.elapsed();
            assert!(elapsed >= Duration::from_millis(200));
            assert!(elapsed < Duration::from_millis(700));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_probability_extremes() {
        let never = SimulatedTransport::with_seed(
            SimulationProfile { hit_probability: 0.0, ..Default::default() },
            1,
        );
        let always = SimulatedTransport::with_seed(
            SimulationProfile { hit_probability: 1.0, ..Default::default() },
            1,
        );
        for _ in 0..5 {
            assert!(!never.validate("0000", "sid").await.unwrap());
            assert!(always.validate("0000", "sid").await.unwrap());
        }
    }

    #[test]
    fn test_transport_for_rejects_real_mode() {
        let config = EngineConfig {
            transport: TransportMode::Real,
            ..Default::default()
        };
        let err = transport_for(&config, SimulationProfile::default()).err().unwrap();
        assert!(matches!(err, ProbeError::UnsupportedTransport { ref mode } if mode == "real"));

        let transport = transport_for(&EngineConfig::default(), SimulationProfile::default()).unwrap();
        assert_eq!(transport.name(), "simulated");
    }

    #[tokio::test]
    async fn test_session_ids_are_synthetic_and_distinct() {
        let transport = SimulatedTransport::default();
        let a = transport.acquire_session().await.unwrap().unwrap();
        let b = transport.acquire_session().await.unwrap().unwrap();
        assert!(a.starts_with("sim-"));
        assert_ne!(a, b);
    }
}
