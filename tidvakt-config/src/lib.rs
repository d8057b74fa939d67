//! # Tidvakt Configuration System
//!
//! Hierarchical configuration management for tidvakt simulation runs.
//!
//! ## Features
//! - **Unified Configuration**: one document describes a run: schedule
//!   bounds, module selection, and parameter overrides
//! - **Validation**: runtime validation of critical parameters before a
//!   simulation is constructed
//! - **Environment Awareness**: `TIDVAKT_ENV` selects an overlay file and
//!   `TIDVAKT_*` variables override individual fields

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod manifest;
mod schedule;

pub use error::ConfigError;
pub use manifest::ModuleManifest;
pub use schedule::ScheduleConfig;

/// Top-level configuration for one simulation run.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct SimulationConfig {
    /// Schedule bounds: start time, end time, and the diagnostic time unit.
    #[validate(nested)]
    pub schedule: ScheduleConfig,

    /// Modules to activate, in listing order. Listing order is meaningful:
    /// it breaks ties between modules with no dependency relation.
    #[serde(default)]
    pub modules: Vec<String>,

    /// Run-level parameter overrides applied to every module.
    #[serde(default)]
    pub global_params: BTreeMap<String, serde_yaml::Value>,

    /// Run-level parameter overrides applied per module.
    #[serde(default)]
    pub module_params: BTreeMap<String, BTreeMap<String, serde_yaml::Value>>,

    /// Expected dispatch-trace digest for replay validation. When set, a
    /// completed run whose trace diverges from it fails.
    #[serde(default)]
    pub expected_trace: Option<String>,
}

impl SimulationConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/tidvakt.yaml` - base settings. If missing, defaults are used.
    /// 3. `config/<environment>.yaml` - environment-specific overrides.
    /// 4. `TIDVAKT_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Start with defaults.
        let mut figment = Figment::from(Serialized::defaults(SimulationConfig::default()));

        if Path::new("config/tidvakt.yaml").exists() {
            figment = figment.merge(Yaml::file("config/tidvakt.yaml"));
        } else {
            println!("config/tidvakt.yaml not found, using default configuration");
        }

        let env = std::env::var("TIDVAKT_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        figment
            .merge(Env::prefixed("TIDVAKT_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.ensure_valid()?;
                Ok(config)
            })
    }

    /// Load configuration from a specific path for testing/validation.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(
                path.to_string_lossy().to_string(),
            )));
        }

        Figment::from(Serialized::defaults(SimulationConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("TIDVAKT_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.ensure_valid()?;
                Ok(config)
            })
    }

    /// Field validation plus the cross-field schedule check.
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        self.validate()?;
        self.schedule.ensure_ordered()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = SimulationConfig::default();
        config.ensure_valid().expect("Default config should validate");
    }

    #[test]
    fn environment_override() {
        // Override a field via environment variable.
        std::env::set_var("TIDVAKT_SCHEDULE__END_TIME", "25.5");
        let config = SimulationConfig::load().unwrap();
        assert_eq!(config.schedule.end_time, 25.5);
        std::env::remove_var("TIDVAKT_SCHEDULE__END_TIME");
    }

    #[test]
    fn reversed_schedule_is_rejected() {
        let mut config = SimulationConfig::default();
        config.schedule.start_time = 5.0;
        config.schedule.end_time = 1.0;
        assert!(matches!(
            config.ensure_valid(),
            Err(ConfigError::InvalidSchedule { .. })
        ));
    }
}
