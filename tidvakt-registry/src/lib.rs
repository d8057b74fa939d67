//! # tidvakt-registry
//!
//! Module registration and inter-module dependency resolution.
//!
//! A module declares the named, type-tagged objects it consumes and
//! produces. Matching declared outputs against declared inputs induces a
//! directed dependency graph, and the resolver turns that graph into a
//! stable activation order: every producer precedes its consumers, and
//! modules with no dependency relation keep the order they were listed in.
//! Cycles are a configuration error caught at resolution time, never at run
//! time.

pub mod descriptor;
pub mod error;
pub mod graph;

pub use descriptor::{ModuleDescriptor, ObjectSpec};
pub use error::RegistryError;
pub use graph::{DependencyEdge, DependencyGraph, ModuleRegistry, UnmatchedInput};
