//! Hit notification

use crate::error::ProbeResult;
use crate::traits::Notifier;
use async_trait::async_trait;
use tracing::info;

/// Render the HTML alert body for a hit
pub fn format_alert(code: &str, meta: &str) -> String {
    format!("<b>VALID CODE FOUND</b>: <code>{}</code>\n{}", code, meta)
}

/// Writes alerts to the tracing subscriber
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_valid(&self, code: &str, meta: &str) -> ProbeResult<()> {
        info!(target: "probe_engine::alert", alert = %format_alert(code, meta), "Valid code alert");
        Ok(())
    }
}

/// Drops every alert. Used when no alert channel is configured.
#[derive(Debug, Default, Clone)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify_valid(&self, _code: &str, _meta: &str) -> ProbeResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_format() {
        assert_eq!(
            format_alert("4821", "Session: sim-1"),
            "<b>VALID CODE FOUND</b>: <code>4821</code>\nSession: sim-1"
        );
    }

    #[tokio::test]
    async fn test_builtin_notifiers_succeed() {
        assert!(LogNotifier.notify_valid("1", "m").await.is_ok());
        assert!(NoopNotifier.notify_valid("1", "m").await.is_ok());
    }
}
