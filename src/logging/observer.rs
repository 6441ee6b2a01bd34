//! Injected log sink used by the analysis layer

use std::sync::Mutex;

use tracing::Level;

/// Structured fields attached to an analysis log line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogContext {
    pub product_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub detail: Option<String>,
}

impl LogContext {
    pub fn for_product(product_id: &str) -> Self {
        Self {
            product_id: Some(product_id.to_string()),
            ..Self::default()
        }
    }

    pub fn with_window(mut self, start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self.end_date = Some(end_date.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

pub trait AnalysisObserver: Send + Sync {
    fn log(&self, level: Level, message: &str, context: &LogContext);
}

/// Forwards to the process-wide `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl AnalysisObserver for TracingObserver {
    fn log(&self, level: Level, message: &str, context: &LogContext) {
        let product_id = context.product_id.as_deref().unwrap_or("");
        let start_date = context.start_date.as_deref().unwrap_or("");
        let end_date = context.end_date.as_deref().unwrap_or("");
        let detail = context.detail.as_deref().unwrap_or("");

        // tracing needs the level at compile time
        match level {
            Level::ERROR => tracing::error!(product_id, start_date, end_date, detail, "{}", message),
            Level::WARN => tracing::warn!(product_id, start_date, end_date, detail, "{}", message),
            Level::INFO => tracing::info!(product_id, start_date, end_date, detail, "{}", message),
            Level::DEBUG => tracing::debug!(product_id, start_date, end_date, detail, "{}", message),
            Level::TRACE => tracing::trace!(product_id, start_date, end_date, detail, "{}", message),
        }
    }
}

/// A single captured log call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    pub context: LogContext,
}

/// Keeps every log call in memory; used by tests to assert on log output
#[derive(Debug, Default)]
pub struct RecordingObserver {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn entries_at(&self, level: Level) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .collect()
    }
}

impl AnalysisObserver for RecordingObserver {
    fn log(&self, level: Level, message: &str, context: &LogContext) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry {
                level,
                message: message.to_string(),
                context: context.clone(),
            });
        }
    }
}
