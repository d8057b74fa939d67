//! Module registry and the stable topological resolver.
//!
//! Edges run producer → consumer, derived from declared-output /
//! declared-input name matching. Resolution is a stable variant of Kahn's
//! algorithm: among modules whose dependencies are all satisfied, the one
//! listed earliest activates first. Absent any dependencies the activation
//! order therefore equals the listing order, which is the documented
//! contract hosts rely on.

use std::collections::HashMap;

use tracing::warn;

use crate::descriptor::ModuleDescriptor;
use crate::error::RegistryError;

/// A producer → consumer edge, labelled with the shared object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub producer: String,
    pub consumer: String,
    pub object: String,
}

/// A declared input with no registered producer among the selected modules.
///
/// Not fatal: the object may be supplied externally before init. Reported as
/// a warning-level diagnostic so misconfigurations stay visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedInput {
    pub module: String,
    pub object: String,
}

/// Read-only structural view of one run's module dependencies.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    order: Vec<String>,
    edges: Vec<DependencyEdge>,
    unmatched: Vec<UnmatchedInput>,
}

impl DependencyGraph {
    /// The dependency-respecting activation order.
    pub fn activation_order(&self) -> &[String] {
        &self.order
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn unmatched_inputs(&self) -> &[UnmatchedInput] {
        &self.unmatched
    }

    /// Renders the graph in DOT form for external visualization tooling.
    pub fn to_dot(&self) -> String {
        use std::fmt::Write;

        let mut out = String::from("digraph tidvakt {\n");
        for module in &self.order {
            let _ = writeln!(out, "    \"{module}\";");
        }
        for edge in &self.edges {
            let _ = writeln!(
                out,
                "    \"{}\" -> \"{}\" [label=\"{}\"];",
                edge.producer, edge.consumer, edge.object
            );
        }
        out.push_str("}\n");
        out
    }
}

/// Holds every registered module's descriptor in registration order.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
    index: HashMap<String, usize>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module descriptor. Fails with
    /// [`RegistryError::DuplicateModule`] if the name is already taken.
    pub fn register(&mut self, descriptor: ModuleDescriptor) -> Result<(), RegistryError> {
        if self.index.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateModule(descriptor.name.clone()));
        }
        self.index.insert(descriptor.name.clone(), self.modules.len());
        self.modules.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.index.get(name).map(|&i| &self.modules[i])
    }

    /// Registered module names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Computes the activation order for `selected` modules.
    ///
    /// Shorthand for [`ModuleRegistry::build_graph`] when only the order is
    /// needed.
    pub fn resolve_order(&self, selected: &[String]) -> Result<Vec<String>, RegistryError> {
        self.build_graph(selected).map(|graph| graph.order)
    }

    /// Builds the dependency graph over `selected` modules and topologically
    /// sorts it.
    ///
    /// Fails with [`RegistryError::UnknownModule`] if a selected name was
    /// never registered, [`RegistryError::DuplicateModule`] if a name is
    /// listed twice, and [`RegistryError::CyclicDependency`] (naming the
    /// participants) if the graph has a cycle. Inputs with no producer are
    /// collected as warning diagnostics, not errors.
    pub fn build_graph(&self, selected: &[String]) -> Result<DependencyGraph, RegistryError> {
        let mut descriptors = Vec::with_capacity(selected.len());
        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(selected.len());
        for (pos, name) in selected.iter().enumerate() {
            let descriptor = self
                .get(name)
                .ok_or_else(|| RegistryError::UnknownModule(name.clone()))?;
            if positions.insert(name.as_str(), pos).is_some() {
                return Err(RegistryError::DuplicateModule(name.clone()));
            }
            descriptors.push(descriptor);
        }

        // Producers per object name, in listing order.
        let mut producers: HashMap<&str, Vec<usize>> = HashMap::new();
        for (pos, descriptor) in descriptors.iter().enumerate() {
            for output in &descriptor.outputs {
                producers.entry(output.name.as_str()).or_default().push(pos);
            }
        }

        let n = descriptors.len();
        let mut edges = Vec::new();
        let mut unmatched = Vec::new();
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut indegree = vec![0usize; n];
        for (consumer, descriptor) in descriptors.iter().enumerate() {
            for input in &descriptor.inputs {
                let Some(sources) = producers.get(input.name.as_str()) else {
                    warn!(
                        module = %descriptor.name,
                        object = %input.name,
                        "declared input has no producer; expecting it to be supplied before init"
                    );
                    unmatched.push(UnmatchedInput {
                        module: descriptor.name.clone(),
                        object: input.name.clone(),
                    });
                    continue;
                };
                for &producer in sources {
                    // A module feeding itself carries state across time, not
                    // an ordering constraint.
                    if producer == consumer {
                        continue;
                    }
                    if !successors[producer].contains(&consumer) {
                        successors[producer].push(consumer);
                        indegree[consumer] += 1;
                    }
                    edges.push(DependencyEdge {
                        producer: descriptors[producer].name.clone(),
                        consumer: descriptor.name.clone(),
                        object: input.name.clone(),
                    });
                }
            }
        }

        // Stable Kahn: each round takes the earliest-listed ready module.
        let mut emitted = vec![false; n];
        let mut order = Vec::with_capacity(n);
        while order.len() < n {
            let Some(next) = (0..n).find(|&pos| !emitted[pos] && indegree[pos] == 0) else {
                let cycle: Vec<String> = (0..n)
                    .filter(|&pos| !emitted[pos])
                    .map(|pos| descriptors[pos].name.clone())
                    .collect();
                return Err(RegistryError::CyclicDependency(cycle));
            };
            emitted[next] = true;
            order.push(descriptors[next].name.clone());
            for &consumer in &successors[next] {
                indegree[consumer] -= 1;
            }
        }

        Ok(DependencyGraph {
            order,
            edges,
            unmatched,
        })
    }
}
