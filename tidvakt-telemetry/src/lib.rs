//! # Tidvakt Telemetry
//!
//! Crate for logging and metrics functionality.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
