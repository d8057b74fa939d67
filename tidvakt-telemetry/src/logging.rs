//! ## tidvakt-telemetry::logging
//! **Structured logging with `tracing`**
//!
//! The scheduler and resolver emit their own `tracing` events; this module
//! owns subscriber installation plus a helper for hosts that want to record
//! simulation lifecycle events through the same pipe.

use tracing::info_span;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. Honors `RUST_LOG`, defaulting to
    /// `info`.
    pub fn init() {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_thread_names(true)
            .with_span_events(FmtSpan::ENTER)
            .init()
    }

    /// Records a host-level simulation event with structured metadata.
    pub fn log_event(event_type: &str, metadata: &[(&str, String)]) {
        let span = info_span!("simulation_event", event_type = event_type);
        let _guard = span.enter();
        tracing::info!(metadata = ?metadata, "Simulation event recorded");
    }
}
