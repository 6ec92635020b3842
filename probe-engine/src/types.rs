//! Core data types for the probe engine

use crate::error::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};

/// Which transport backs a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Simulated,
    Real,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportMode::Simulated => write!(f, "simulated"),
            TransportMode::Real => write!(f, "real"),
        }
    }
}

/// Character set used by the code generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlphabetMode {
    Digits,
    Lowercase,
    Alphanumeric,
    Custom,
}

impl std::str::FromStr for AlphabetMode {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "digits" | "numeric" => Ok(AlphabetMode::Digits),
            "lowercase" | "alpha" => Ok(AlphabetMode::Lowercase),
            "alphanumeric" => Ok(AlphabetMode::Alphanumeric),
            "custom" => Ok(AlphabetMode::Custom),
            other => Err(ProbeError::invalid_config(
                "alphabet",
                &format!("unknown alphabet mode '{}'", other),
            )),
        }
    }
}

/// Credentials for the alert channel. Both must be set for alerts to fire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub token: String,
    pub chat_id: String,
}

impl AlertConfig {
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.chat_id.is_empty()
    }
}

/// Per-worker sleep between probes, in milliseconds (inclusive bounds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self { min_ms: 0, max_ms: 100 }
    }
}

/// Immutable-per-run engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub transport: TransportMode,
    pub use_proxy: bool,
    pub proxy_url: String,
    pub target_url: String,
    pub session_fetch_url: String,
    pub workers: usize,
    pub code_length: usize,
    pub alphabet: AlphabetMode,
    pub custom_alphabet: String,
    pub alert: AlertConfig,
    pub pacing: PacingConfig,
    pub session_retry_backoff_ms: u64,
    /// Emit one debug event every N attempts per worker
    pub debug_sample_every: u64,
    /// Base seed for per-worker generators; entropy when unset
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transport: TransportMode::Simulated,
            use_proxy: false,
            proxy_url: String::new(),
            target_url: String::new(),
            session_fetch_url: String::new(),
            workers: 5,
            code_length: 6,
            alphabet: AlphabetMode::Digits,
            custom_alphabet: String::new(),
            alert: AlertConfig::default(),
            pacing: PacingConfig::default(),
            session_retry_backoff_ms: 5000,
            debug_sample_every: 50,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Check the invariants a run depends on
    pub fn validate(&self) -> ProbeResult<()> {
        if self.workers == 0 {
            return Err(ProbeError::invalid_config("workers", "must be at least 1"));
        }
        if self.code_length == 0 {
            return Err(ProbeError::invalid_config("code_length", "must be at least 1"));
        }
        if self.pacing.min_ms > self.pacing.max_ms {
            return Err(ProbeError::invalid_config(
                "pacing",
                "min_ms must not exceed max_ms",
            ));
        }
        if self.use_proxy && self.proxy_url.is_empty() {
            return Err(ProbeError::invalid_config(
                "proxy_url",
                "proxy enabled without a proxy url",
            ));
        }
        Ok(())
    }
}

/// Severity of an engine log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Error,
    Debug,
}

/// Single event emitted by the engine for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub message: String,
    pub level: LogLevel,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            message: message.into(),
            level,
        }
    }
}

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Running,
    Stopping,
}

/// Snapshot of the shared session holder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Option<String>,
    pub acquired_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Point-in-time view of run statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub tested: u64,
    pub valid: u64,
    /// Attempts per minute, floored
    pub rate_per_minute: u64,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub elapsed_ms: u64,
    pub session_active: bool,
}
