//! Module metadata: name, parameters, declared inputs and outputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named, type-tagged entry on the shared data bus.
///
/// The `kind` tag is diagnostic: the engine stores objects opaquely and
/// only the producing and consuming modules agree on the concrete type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub name: String,
    #[serde(default)]
    pub kind: String,
}

impl ObjectSpec {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// Immutable description of a module: its name, parameter defaults, and the
/// data-bus objects it consumes and produces.
///
/// Created once at registration and never mutated afterwards. The dependency
/// resolver derives edges purely from `inputs`/`outputs` name matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<ObjectSpec>,
    #[serde(default)]
    pub outputs: Vec<ObjectSpec>,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_yaml::Value>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.inputs.push(ObjectSpec::new(name, kind));
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.outputs.push(ObjectSpec::new(name, kind));
        self
    }

    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        default: serde_yaml::Value,
    ) -> Self {
        self.parameters.insert(name.into(), default);
        self
    }

    /// Whether this module declares `object` among its outputs.
    pub fn produces(&self, object: &str) -> bool {
        self.outputs.iter().any(|output| output.name == object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_declarations() {
        let descriptor = ModuleDescriptor::new("fire")
            .with_input("landscape", "raster")
            .with_output("burn_map", "raster")
            .with_parameter("spread", serde_yaml::Value::from(0.23));

        assert_eq!(descriptor.name, "fire");
        assert!(descriptor.produces("burn_map"));
        assert!(!descriptor.produces("landscape"));
        assert!(descriptor.parameters.contains_key("spread"));
    }

    #[test]
    fn deserializes_from_yaml() {
        let descriptor: ModuleDescriptor = serde_yaml::from_str(
            r#"
            name: growth
            inputs:
              - name: climate
                kind: table
            outputs:
              - name: biomass
                kind: raster
            parameters:
              rate: 0.05
            "#,
        )
        .unwrap();

        assert_eq!(descriptor.name, "growth");
        assert_eq!(descriptor.inputs[0].name, "climate");
        assert!(descriptor.produces("biomass"));
    }
}
