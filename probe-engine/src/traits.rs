//! Core traits for the probe engine

use crate::error::ProbeResult;
use async_trait::async_trait;

/// Backend that validates codes and hands out session tokens
#[async_trait]
pub trait Transport: Send + Sync {
    /// Check a single code against the backend.
    ///
    /// `Ok(bool)` is a completed probe; `Err` is a transport failure the
    /// caller treats as "not valid".
    async fn validate(&self, code: &str, session_id: &str) -> ProbeResult<bool>;

    /// Fetch a fresh session token. `Ok(None)` means the backend answered
    /// but no token could be extracted.
    async fn acquire_session(&self) -> ProbeResult<Option<String>>;

    /// Short name used in log lines
    fn name(&self) -> &'static str;
}

/// Sink for "valid code found" alerts
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one alert. Called at most once per hit, never retried.
    async fn notify_valid(&self, code: &str, meta: &str) -> ProbeResult<()>;
}
