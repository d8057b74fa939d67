use thiserror::Error;

use tidvakt_config::ConfigError;
use tidvakt_core::{QueueError, StateError};
use tidvakt_registry::RegistryError;

/// Engine error conditions.
///
/// Configuration and registration errors surface before a simulation is
/// constructed. Everything else aborts the run that raised it; the engine
/// never retries; whether to re-run a simulation from scratch is the host
/// program's call.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registration error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Scheduling error: {0}")]
    Queue(#[from] QueueError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Module '{module}' failed while handling '{kind}': {source}")]
    Handler {
        module: String,
        kind: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Trace validation failed!\nExpected: {expected}\nActual: {actual}")]
    TraceMismatch { expected: String, actual: String },

    #[error("Simulation has already run; build a fresh one to run again")]
    AlreadyRun,
}
