//! The scheduler main loop.
//!
//! Life of a run: `Uninitialized -> Seeded -> Running ->
//! Drained | TimeLimitReached -> Finished`. Seeding inserts one `init`
//! event per module at the start time, in resolved activation order, so the
//! queue's FIFO tie-break fires earlier-resolved modules first. The loop
//! then pops events in `(time, insertion)` order, advances the clock,
//! raises the queue's causality floor, and dispatches.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use tidvakt_core::{Event, EventQueue, QueueError, SimTime, SimulationState, INIT_EVENT};
use tidvakt_telemetry::MetricsRecorder;

use crate::context::ModuleContext;
use crate::error::EngineError;
use crate::handler::{Dispatch, ModuleHandler};

/// Scheduler life-cycle states.
///
/// `Drained` and `TimeLimitReached` name the two ways a run ends normally;
/// both lead to `Finished`, after which the simulation accepts no further
/// work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Uninitialized,
    Seeded,
    Running,
    Drained,
    TimeLimitReached,
    Finished,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// How the run ended: `Drained` (queue empty) or `TimeLimitReached`
    /// (next event lay beyond the end time and was dropped).
    pub outcome: RunState,
    /// Events popped and dispatched, unrecognized kinds included.
    pub events_dispatched: u64,
    /// Dispatches that landed on an unrecognized event kind.
    pub warnings: u64,
    /// Clock position after the last dispatched event.
    pub final_clock: SimTime,
    /// Hex digest over every dispatched `(time, module, kind)`. Identical
    /// registrations and handler logic produce identical digests.
    pub trace_digest: String,
}

pub(crate) struct Scheduler {
    state: SimulationState,
    queue: EventQueue,
    handlers: HashMap<String, Box<dyn ModuleHandler>>,
    activation_order: Vec<String>,
    start_time: SimTime,
    end_time: SimTime,
    run_state: RunState,
    trace: blake3::Hasher,
    metrics: MetricsRecorder,
    dispatched: u64,
    warnings: u64,
}

impl Scheduler {
    pub(crate) fn new(
        state: SimulationState,
        queue: EventQueue,
        handlers: HashMap<String, Box<dyn ModuleHandler>>,
        activation_order: Vec<String>,
        start_time: SimTime,
        end_time: SimTime,
        metrics: MetricsRecorder,
    ) -> Self {
        Self {
            state,
            queue,
            handlers,
            activation_order,
            start_time,
            end_time,
            run_state: RunState::Uninitialized,
            trace: blake3::Hasher::new(),
            metrics,
            dispatched: 0,
            warnings: 0,
        }
    }

    pub(crate) fn run_state(&self) -> RunState {
        self.run_state
    }

    pub(crate) fn state(&self) -> &SimulationState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub(crate) fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    /// Hex digest over every `(time, module, kind)` dispatched so far.
    pub(crate) fn trace_digest(&self) -> String {
        hex::encode(self.trace.finalize().as_bytes())
    }

    /// Schedules every module's `init` event at the start time, in
    /// activation order.
    pub(crate) fn seed(&mut self) -> Result<(), EngineError> {
        for name in &self.activation_order {
            self.queue
                .insert(Event::new(self.start_time, name.clone(), INIT_EVENT))?;
        }
        debug!(
            modules = self.activation_order.len(),
            start = %self.start_time,
            "Seeded init events"
        );
        self.run_state = RunState::Seeded;
        Ok(())
    }

    /// Drives the main loop to a terminal state.
    pub(crate) fn run(&mut self) -> Result<RunReport, EngineError> {
        self.run_state = RunState::Running;
        info!(
            start = %self.start_time,
            end = %self.end_time,
            modules = self.activation_order.len(),
            "Simulation loop started"
        );

        let outcome = loop {
            let event = match self.queue.pop_min() {
                Ok(event) => event,
                Err(QueueError::Empty) => break RunState::Drained,
                Err(err) => {
                    self.run_state = RunState::Finished;
                    return Err(err.into());
                }
            };

            if event.time() > self.end_time {
                debug!(
                    time = %event.time(),
                    module = event.module(),
                    kind = event.kind(),
                    "Event beyond end time dropped"
                );
                break RunState::TimeLimitReached;
            }

            if let Err(err) = self.dispatch(event) {
                self.run_state = RunState::Finished;
                return Err(err);
            }
        };

        let report = RunReport {
            outcome,
            events_dispatched: self.dispatched,
            warnings: self.warnings,
            final_clock: self.state.clock(),
            trace_digest: self.trace_digest(),
        };
        self.run_state = RunState::Finished;
        info!(
            outcome = ?report.outcome,
            events = report.events_dispatched,
            warnings = report.warnings,
            clock = %report.final_clock,
            "Simulation finished"
        );
        Ok(report)
    }

    fn dispatch(&mut self, event: Event) -> Result<(), EngineError> {
        self.state.advance_clock_to(event.time())?;
        self.queue.raise_floor(event.time());

        self.trace.update(&event.time().value().to_le_bytes());
        self.trace.update(event.module().as_bytes());
        self.trace.update(&[0]);
        self.trace.update(event.kind().as_bytes());
        self.trace.update(&[0]);

        let started = Instant::now();
        let outcome = match self.handlers.get_mut(event.module()) {
            Some(handler) => {
                let mut ctx = ModuleContext::new(event.module(), &mut self.state, &mut self.queue);
                handler.dispatch(&mut ctx, &event)?
            }
            None => {
                // Events only name modules selected at build time, so this
                // arm is unreachable through the public surface.
                warn!(module = event.module(), "No handler registered for module");
                Dispatch::Unhandled
            }
        };
        self.metrics
            .handler_latency
            .observe(started.elapsed().as_nanos() as f64);

        self.dispatched += 1;
        self.metrics.dispatched_events.inc();
        match outcome {
            Dispatch::Handled => {
                trace!(
                    module = event.module(),
                    kind = event.kind(),
                    time = %event.time(),
                    "Event dispatched"
                );
            }
            Dispatch::Unhandled => {
                self.warnings += 1;
                self.metrics.dispatch_warnings.inc();
                warn!(
                    module = event.module(),
                    kind = event.kind(),
                    time = %event.time(),
                    "Module does not handle this event kind"
                );
            }
        }
        Ok(())
    }
}
