//! Engine event stream
//!
//! The engine only emits [`LogEvent`]s onto a broadcast channel. Consumers
//! that want scrollback keep their own [`EventLog`], which holds the most
//! recent [`EVENT_LOG_CAPACITY`] entries.

use crate::types::{LogEvent, LogLevel};
use std::collections::VecDeque;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

pub const EVENT_LOG_CAPACITY: usize = 100;

/// Fan-out of engine events to any number of subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LogEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.sender.subscribe()
    }

    /// Publish an event and mirror it into tracing
    pub fn emit(&self, level: LogLevel, message: impl Into<String>) {
        let event = LogEvent::new(level, message);
        match event.level {
            LogLevel::Info | LogLevel::Success => info!("{}", event.message),
            LogLevel::Error => error!("{}", event.message),
            LogLevel::Debug => debug!("{}", event.message),
        }
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(LogLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogLevel::Error, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.emit(LogLevel::Debug, message);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Bounded scrollback, oldest entries evicted first
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LogEvent>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, event: LogEvent) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEvent> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Render as plain text lines, `[timestamp] [LEVEL] message`
    pub fn export_text(&self) -> String {
        self.entries
            .iter()
            .map(|e| {
                format!(
                    "[{}] [{}] {}",
                    e.timestamp.format("%H:%M:%S"),
                    format!("{:?}", e.level).to_uppercase(),
                    e.message
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(EVENT_LOG_CAPACITY)
    }
}
