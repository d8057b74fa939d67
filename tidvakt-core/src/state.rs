//! ## tidvakt-core::state
//! **Shared simulation state: object store, parameter table, clock**
//!
//! `SimulationState` is the single mutable resource shared by all modules:
//! the inter-module data bus. Any module may read any object; by convention
//! only the declared producer writes one, but that is a scheduling
//! discipline, not a lock: execution is single-threaded, so correctness
//! rests on producers being dispatched before consumers at each instant.
//!
//! Writes are last-writer-wins and immediately visible to every handler
//! dispatched afterwards, including within the same simulated time instant.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};

use crate::error::StateError;
use crate::time::SimTime;

/// Parameter values are configuration data, carried in YAML form.
pub type ParamValue = serde_yaml::Value;

/// Per-module parameter resolution table, frozen at initialization.
///
/// Lookup order: per-module run override, then global run override, then the
/// module-declared default. A miss at every layer is an error.
#[derive(Debug, Default, Clone)]
pub struct ParamTable {
    defaults: BTreeMap<String, BTreeMap<String, ParamValue>>,
    module_overrides: BTreeMap<String, BTreeMap<String, ParamValue>>,
    global_overrides: BTreeMap<String, ParamValue>,
}

impl ParamTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a module's declared parameter defaults.
    pub fn set_defaults(&mut self, module: impl Into<String>, defaults: BTreeMap<String, ParamValue>) {
        self.defaults.insert(module.into(), defaults);
    }

    /// Records run-level overrides for one module.
    pub fn set_module_overrides(
        &mut self,
        module: impl Into<String>,
        overrides: BTreeMap<String, ParamValue>,
    ) {
        self.module_overrides.insert(module.into(), overrides);
    }

    /// Records run-level overrides that apply to every module.
    pub fn set_global_overrides(&mut self, overrides: BTreeMap<String, ParamValue>) {
        self.global_overrides = overrides;
    }

    pub fn resolve(&self, module: &str, name: &str) -> Result<&ParamValue, StateError> {
        self.module_overrides
            .get(module)
            .and_then(|params| params.get(name))
            .or_else(|| self.global_overrides.get(name))
            .or_else(|| self.defaults.get(module).and_then(|params| params.get(name)))
            .ok_or_else(|| StateError::UndefinedParameter {
                module: module.to_string(),
                name: name.to_string(),
            })
    }
}

/// The shared mutable simulation state handed to every dispatched handler.
///
/// Owned by the `Simulation` instance for the simulation's entire lifetime;
/// there are no hidden globals. The clock is advanced only by the scheduler,
/// immediately before dispatching an event.
pub struct SimulationState {
    clock: SimTime,
    objects: HashMap<String, Box<dyn Any + Send>>,
    params: ParamTable,
}

impl SimulationState {
    pub fn new(start: SimTime, params: ParamTable) -> Self {
        Self {
            clock: start,
            objects: HashMap::new(),
            params,
        }
    }

    /// The current simulated time.
    #[inline]
    pub fn clock(&self) -> SimTime {
        self.clock
    }

    /// Advances the clock. Fails with [`StateError::ClockRegression`] if the
    /// target lies in the past; advancing to the current time is a no-op.
    pub fn advance_clock_to(&mut self, time: SimTime) -> Result<(), StateError> {
        if time < self.clock {
            return Err(StateError::ClockRegression {
                clock: self.clock,
                requested: time,
            });
        }
        self.clock = time;
        Ok(())
    }

    /// Stores an object under `name`, overwriting unconditionally.
    pub fn put<T: Any + Send>(&mut self, name: impl Into<String>, value: T) {
        self.objects.insert(name.into(), Box::new(value));
    }

    /// Reads the object stored under `name`.
    pub fn get<T: Any>(&self, name: &str) -> Result<&T, StateError> {
        self.objects
            .get(name)
            .ok_or_else(|| StateError::UndefinedObject(name.to_string()))?
            .downcast_ref()
            .ok_or_else(|| StateError::ObjectTypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Mutable access to the object stored under `name`.
    pub fn get_mut<T: Any>(&mut self, name: &str) -> Result<&mut T, StateError> {
        self.objects
            .get_mut(name)
            .ok_or_else(|| StateError::UndefinedObject(name.to_string()))?
            .downcast_mut()
            .ok_or_else(|| StateError::ObjectTypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Resolves a parameter for `module`: per-module override, then global
    /// override, then the module's declared default.
    pub fn param(&self, module: &str, name: &str) -> Result<&ParamValue, StateError> {
        self.params.resolve(module, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(value: &str) -> ParamValue {
        serde_yaml::from_str(value).unwrap()
    }

    #[test]
    fn objects_overwrite_last_writer_wins() {
        let mut state = SimulationState::new(SimTime::ZERO, ParamTable::new());
        state.put("r", 1.0f64);
        state.put("r", 2.0f64);
        assert_eq!(*state.get::<f64>("r").unwrap(), 2.0);
    }

    #[test]
    fn missing_object_is_an_error() {
        let state = SimulationState::new(SimTime::ZERO, ParamTable::new());
        assert!(matches!(
            state.get::<f64>("absent"),
            Err(StateError::UndefinedObject(_))
        ));
    }

    #[test]
    fn wrong_type_is_an_error() {
        let mut state = SimulationState::new(SimTime::ZERO, ParamTable::new());
        state.put("r", 1.0f64);
        assert!(matches!(
            state.get::<String>("r"),
            Err(StateError::ObjectTypeMismatch { .. })
        ));
    }

    #[test]
    fn clock_never_regresses() {
        let mut state = SimulationState::new(SimTime::new(2.0), ParamTable::new());
        state.advance_clock_to(SimTime::new(3.5)).unwrap();
        state.advance_clock_to(SimTime::new(3.5)).unwrap();
        assert!(matches!(
            state.advance_clock_to(SimTime::new(3.0)),
            Err(StateError::ClockRegression { .. })
        ));
        assert_eq!(state.clock(), SimTime::new(3.5));
    }

    #[test]
    fn param_resolution_prefers_overrides() {
        let mut params = ParamTable::new();
        params.set_defaults(
            "fire",
            [("spread".to_string(), yaml("0.1"))].into_iter().collect(),
        );
        params.set_global_overrides([("spread".to_string(), yaml("0.2"))].into_iter().collect());
        params.set_module_overrides(
            "fire",
            [("spread".to_string(), yaml("0.3"))].into_iter().collect(),
        );

        let state = SimulationState::new(SimTime::ZERO, params);
        assert_eq!(state.param("fire", "spread").unwrap(), &yaml("0.3"));
    }

    #[test]
    fn param_falls_back_to_global_then_default() {
        let mut params = ParamTable::new();
        params.set_defaults(
            "fire",
            [("interval".to_string(), yaml("1.0"))].into_iter().collect(),
        );
        params.set_global_overrides([("seed".to_string(), yaml("99"))].into_iter().collect());

        let state = SimulationState::new(SimTime::ZERO, params);
        assert_eq!(state.param("fire", "seed").unwrap(), &yaml("99"));
        assert_eq!(state.param("fire", "interval").unwrap(), &yaml("1.0"));
    }

    #[test]
    fn unresolved_param_is_an_error() {
        let state = SimulationState::new(SimTime::ZERO, ParamTable::new());
        assert!(matches!(
            state.param("fire", "spread"),
            Err(StateError::UndefinedParameter { .. })
        ));
    }
}
