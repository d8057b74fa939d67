//! Module manifests: descriptor lists loadable from YAML.
//!
//! Handlers are code and must be registered by the host program; the
//! descriptors themselves are plain data. A manifest lets diagnostics
//! tooling (and hosts that keep module metadata in files) register
//! descriptors without touching code.

use std::path::{Path, PathBuf};

use figment::providers::{Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use tidvakt_registry::{ModuleDescriptor, ModuleRegistry, RegistryError};

use crate::ConfigError;

/// A list of module descriptors, in listing order.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct ModuleManifest {
    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,
}

impl ModuleManifest {
    /// Load a manifest from a YAML file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(
                path.to_string_lossy().to_string(),
            )));
        }

        Figment::new()
            .merge(Yaml::file(path))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Parse a manifest from a YAML string.
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        Figment::new()
            .merge(Yaml::string(source))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Registers every listed descriptor, preserving listing order.
    pub fn register_into(&self, registry: &mut ModuleRegistry) -> Result<(), RegistryError> {
        for descriptor in &self.modules {
            registry.register(descriptor.clone())?;
        }
        Ok(())
    }

    /// Module names in listing order.
    pub fn names(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.name.clone()).collect()
    }
}
