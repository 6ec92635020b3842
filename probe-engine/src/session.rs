//! Shared session token with single-flight acquisition
//!
//! All workers share one token. When it is missing, the first caller to take
//! the refresh lock fetches it; everyone queued behind that caller reuses the
//! outcome instead of issuing their own fetch.

use crate::events::EventBus;
use crate::traits::Transport;
use crate::types::SessionState;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

pub struct SessionManager {
    transport: Arc<dyn Transport>,
    state: RwLock<SessionState>,
    refresh_lock: Mutex<()>,
    /// Fetches that have finished, successful or not
    completed_fetches: AtomicU64,
    /// Fetches that have been started
    acquire_count: AtomicU64,
    events: EventBus,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>, events: EventBus) -> Self {
        Self {
            transport,
            state: RwLock::new(SessionState::default()),
            refresh_lock: Mutex::new(()),
            completed_fetches: AtomicU64::new(0),
            acquire_count: AtomicU64::new(0),
            events,
        }
    }

    /// Return the current token, fetching it if absent.
    ///
    /// `None` means acquisition failed; the caller is expected to back off
    /// before asking again.
    pub async fn ensure_session(&self) -> Option<String> {
        if let Some(id) = self.current().await {
            return Some(id);
        }

        let seen = self.completed_fetches.load(Ordering::SeqCst);
        let _guard = self.refresh_lock.lock().await;

        if let Some(id) = self.current().await {
            return Some(id);
        }
        if self.completed_fetches.load(Ordering::SeqCst) != seen {
            // A fetch finished while we waited and left no token behind.
            debug!("Session fetch failed while queued, sharing outcome");
            return None;
        }

        self.acquire_count.fetch_add(1, Ordering::SeqCst);
        self.events.info("Fetching new session...");
        let outcome = self.transport.acquire_session().await;

        let result = match outcome {
            Ok(Some(id)) => {
                let mut state = self.state.write().await;
                state.id = Some(id.clone());
                state.acquired_at = Some(chrono::Utc::now());
                self.events.success(format!("Session acquired: {}", id));
                Some(id)
            }
            Ok(None) => {
                self.events.info("No session id found, retrying shortly");
                None
            }
            Err(e) => {
                self.events.info(format!("Session fetch failed ({}), retrying shortly", e));
                None
            }
        };
        self.completed_fetches.fetch_add(1, Ordering::SeqCst);
        result
    }

    pub async fn current(&self) -> Option<String> {
        self.state.read().await.id.clone()
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Drop the token if it is still `id`, e.g. after the backend reports expiry
    pub async fn invalidate(&self, id: &str) -> bool {
        let mut state = self.state.write().await;
        if state.id.as_deref() == Some(id) {
            *state = SessionState::default();
            self.events.info("Session invalidated");
            true
        } else {
            false
        }
    }

    pub async fn clear(&self) {
        *self.state.write().await = SessionState::default();
    }

    /// Number of fetches issued against the transport
    pub fn acquire_count(&self) -> u64 {
        self.acquire_count.load(Ordering::SeqCst)
    }
}
