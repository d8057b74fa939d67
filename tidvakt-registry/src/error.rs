use thiserror::Error;

/// Registration and dependency-resolution error conditions.
///
/// All of these are configuration errors: they are raised before a
/// simulation is constructed and must name the offending modules precisely
/// enough to fix the registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("module '{0}' is already registered")]
    DuplicateModule(String),

    #[error("module '{0}' is not registered")]
    UnknownModule(String),

    #[error("cyclic dependency among modules: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),
}
