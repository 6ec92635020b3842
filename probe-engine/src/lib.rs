//! Probe Engine - Concurrent code probing against a pluggable backend
//!
//! A pool of symmetric workers repeatedly generates candidate codes, checks
//! each one through a [`Transport`], aggregates throughput statistics and
//! reports hits through a [`Notifier`]. All workers share a single session
//! token acquired with single-flight semantics.

pub mod types;
pub mod traits;
pub mod error;
pub mod generator;
pub mod transport;
pub mod notifier;
pub mod session;
pub mod stats;
pub mod events;
pub mod engine;

#[cfg(test)]
mod tests;

pub use types::{
    AlertConfig, AlphabetMode, EngineConfig, LogEvent, LogLevel, PacingConfig, RunState,
    SessionState, StatsSnapshot, TransportMode,
};

pub use traits::{Notifier, Transport};

pub use error::{ErrorCategory, ErrorSeverity, ProbeError, ProbeResult};

pub use generator::{resolve_alphabet, CodeGenerator};

pub use transport::{transport_for, SimulatedTransport, SimulationProfile};

pub use notifier::{format_alert, LogNotifier, NoopNotifier};

pub use session::SessionManager;

pub use stats::StatsAggregator;

pub use events::{EventBus, EventLog, EVENT_LOG_CAPACITY};

pub use engine::ProbeEngine;
