//! The per-dispatch view a handler gets of the running simulation.

use std::any::Any;

use tidvakt_core::{Event, EventQueue, ParamValue, QueueError, SimTime, SimulationState, StateError};

/// Handed to a module handler for the duration of one dispatch.
///
/// Gives the handler the shared [`SimulationState`] and the ability to
/// schedule its module's future events. Scheduling into the past is a
/// causality violation and fails; scheduling at the current instant is
/// allowed and fires after every event already queued for that instant.
pub struct ModuleContext<'a> {
    module: &'a str,
    state: &'a mut SimulationState,
    queue: &'a mut EventQueue,
}

impl<'a> ModuleContext<'a> {
    pub(crate) fn new(
        module: &'a str,
        state: &'a mut SimulationState,
        queue: &'a mut EventQueue,
    ) -> Self {
        Self {
            module,
            state,
            queue,
        }
    }

    /// The module being dispatched.
    pub fn module(&self) -> &str {
        self.module
    }

    /// The current simulated time.
    pub fn now(&self) -> SimTime {
        self.state.clock()
    }

    /// Read access to the shared simulation state.
    pub fn state(&self) -> &SimulationState {
        self.state
    }

    /// Write access to the shared simulation state.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        self.state
    }

    /// Resolves a parameter for this module: per-module override, global
    /// override, then declared default.
    pub fn param(&self, name: &str) -> Result<&ParamValue, StateError> {
        self.state.param(self.module, name)
    }

    /// Schedules a future event for this module.
    pub fn schedule(&mut self, kind: &str, at: SimTime) -> Result<(), QueueError> {
        self.queue.insert(Event::new(at, self.module, kind))
    }

    /// Schedules a future event for this module, carrying a payload the
    /// handler can downcast back out with [`Event::payload`].
    pub fn schedule_with<P: Any + Send>(
        &mut self,
        kind: &str,
        at: SimTime,
        payload: P,
    ) -> Result<(), QueueError> {
        self.queue
            .insert(Event::new(at, self.module, kind).with_payload(payload))
    }
}
