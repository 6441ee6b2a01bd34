//! Logging initialization with environment-based formatters
//!
//! - Production: Structured JSON logs for cloud monitoring
//! - Sandbox: Colorful, human-readable logs for development
//!
//! Analysis code never logs through the global subscriber directly; it goes
//! through an [`AnalysisObserver`] so callers and tests can swap the sink.

pub mod observer;

pub use observer::{AnalysisObserver, LogContext, RecordingObserver, TracingObserver};

use crate::config::{get_environment, is_production};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Initialize logging based on the environment
///
/// - Production: JSON structured logs (suitable for log aggregation systems)
/// - Sandbox/Development: Colorful, human-readable logs
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stdout);
    let registry = tracing_subscriber::registry().with(env_filter);

    if is_production(&get_environment()) {
        registry.with(layer.json()).init();
    } else {
        registry.with(layer.with_ansi(true)).init();
    }
}
