use thiserror::Error;

use crate::time::SimTime;

/// Errors raised by [`crate::state::SimulationState`] lookups and clock moves.
///
/// Lookup failures are hard dependency failures: the engine does not swallow
/// them, they propagate out of the run unmodified.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("undefined simulation object: '{0}'")]
    UndefinedObject(String),

    #[error("simulation object '{name}' is not a {expected}")]
    ObjectTypeMismatch { name: String, expected: &'static str },

    #[error("undefined parameter '{name}' for module '{module}'")]
    UndefinedParameter { module: String, name: String },

    #[error("clock regression: at {clock}, cannot move back to {requested}")]
    ClockRegression { clock: SimTime, requested: SimTime },
}
