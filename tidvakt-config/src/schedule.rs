//! Schedule bounds for a simulation run.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::ConfigError;

/// Start/end of simulated time plus the diagnostic time unit.
///
/// Simulated time is unitless inside the engine; `time_unit` only labels
/// logs and reports. Fractional bounds are allowed; time is subdividable.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ScheduleConfig {
    /// Simulated time at which every module's `init` event fires.
    #[serde(default)]
    pub start_time: f64,

    /// Simulated time bound. Events scheduled strictly beyond it are
    /// dropped, never executed.
    #[serde(default = "default_end_time")]
    pub end_time: f64,

    /// Human-readable unit label ("tick", "year", ...). Diagnostic only.
    #[serde(default = "default_time_unit")]
    pub time_unit: String,
}

fn default_end_time() -> f64 {
    10.0
}

fn default_time_unit() -> String {
    "tick".into()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            end_time: default_end_time(),
            time_unit: default_time_unit(),
        }
    }
}

impl ScheduleConfig {
    /// Cross-field check: the run must not end before it starts.
    pub fn ensure_ordered(&self) -> Result<(), ConfigError> {
        if self.end_time < self.start_time {
            return Err(ConfigError::InvalidSchedule {
                start: self.start_time,
                end: self.end_time,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_ordered() {
        ScheduleConfig::default().ensure_ordered().unwrap();
    }

    #[test]
    fn zero_length_run_is_allowed() {
        let schedule = ScheduleConfig {
            start_time: 3.0,
            end_time: 3.0,
            ..Default::default()
        };
        schedule.ensure_ordered().unwrap();
    }
}
