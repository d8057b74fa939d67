//! Building and running simulations.
//!
//! `SimulationBuilder` collects module registrations (descriptor plus
//! handler); `build` resolves the dependency graph against a run
//! configuration and produces a `Simulation`: a fresh state container and a
//! seeded-on-run scheduler. Configuration errors (unknown module, duplicate
//! name, cycle, bad schedule) fail `build` outright; a `Simulation` is never
//! partially constructed.

use std::collections::HashMap;

use tracing::{error, info, warn};

use tidvakt_config::SimulationConfig;
use tidvakt_core::{EventQueue, ParamTable, SimTime, SimulationState};
use tidvakt_registry::{DependencyGraph, ModuleDescriptor, ModuleRegistry, RegistryError};
use tidvakt_telemetry::MetricsRecorder;

use crate::error::EngineError;
use crate::handler::ModuleHandler;
use crate::scheduler::{RunReport, RunState, Scheduler};

/// Collects module registrations ahead of building a [`Simulation`].
#[derive(Default)]
pub struct SimulationBuilder {
    registry: ModuleRegistry,
    handlers: HashMap<String, Box<dyn ModuleHandler>>,
}

impl SimulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module: its descriptor and its dispatch handler.
    /// Fails with a duplicate-module error if the name is already taken.
    pub fn register<H>(&mut self, descriptor: ModuleDescriptor, handler: H) -> Result<(), EngineError>
    where
        H: ModuleHandler + 'static,
    {
        let name = descriptor.name.clone();
        self.registry.register(descriptor)?;
        self.handlers.insert(name, Box::new(handler));
        Ok(())
    }

    /// The registered module descriptors.
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Resolves the dependency graph for `config.modules` and produces a
    /// runnable [`Simulation`] with a fresh state container.
    pub fn build(self, config: &SimulationConfig) -> Result<Simulation, EngineError> {
        config.ensure_valid()?;
        if config.modules.is_empty() {
            warn!("No modules selected; the run will drain immediately");
        }

        let graph = self.registry.build_graph(&config.modules)?;

        let mut params = ParamTable::new();
        for name in &config.modules {
            let descriptor = self
                .registry
                .get(name)
                .ok_or_else(|| RegistryError::UnknownModule(name.clone()))?;
            params.set_defaults(name.clone(), descriptor.parameters.clone());
        }
        for (module, overrides) in &config.module_params {
            params.set_module_overrides(module.clone(), overrides.clone());
        }
        params.set_global_overrides(config.global_params.clone());

        let start = SimTime::new(config.schedule.start_time);
        let end = SimTime::new(config.schedule.end_time);
        let state = SimulationState::new(start, params);
        let queue = EventQueue::new(start);
        let scheduler = Scheduler::new(
            state,
            queue,
            self.handlers,
            graph.activation_order().to_vec(),
            start,
            end,
            MetricsRecorder::new(),
        );

        info!(
            time_unit = %config.schedule.time_unit,
            order = ?graph.activation_order(),
            "Simulation initialized"
        );
        Ok(Simulation {
            scheduler,
            graph,
            time_unit: config.schedule.time_unit.clone(),
            expected_trace: config.expected_trace.clone(),
        })
    }
}

/// One runnable simulation: scheduler, shared state, and the resolved
/// dependency graph. Runs exactly once; build a fresh one to re-run.
pub struct Simulation {
    scheduler: Scheduler,
    graph: DependencyGraph,
    time_unit: String,
    expected_trace: Option<String>,
}

impl Simulation {
    /// Seeds every module's `init` event and drives the scheduler to
    /// `Finished`. A second call fails with [`EngineError::AlreadyRun`].
    ///
    /// When the configuration carries an expected trace digest, the
    /// completed run is validated against it.
    pub fn run(&mut self) -> Result<RunReport, EngineError> {
        if self.scheduler.run_state() != RunState::Uninitialized {
            return Err(EngineError::AlreadyRun);
        }
        self.scheduler.seed()?;
        let report = self.scheduler.run()?;

        if let Some(expected) = &self.expected_trace {
            if *expected != report.trace_digest {
                error!(expected = %expected, actual = %report.trace_digest, "Trace mismatch");
                return Err(EngineError::TraceMismatch {
                    expected: expected.clone(),
                    actual: report.trace_digest,
                });
            }
            info!("Trace validation successful");
        }
        Ok(report)
    }

    /// Hex digest over every event dispatched so far; stable once the run
    /// has finished. Identical registrations and handler logic produce
    /// identical digests, so hosts can assert run-for-run determinism.
    pub fn trace_digest(&self) -> String {
        self.scheduler.trace_digest()
    }

    /// Read-only structural view of the resolved module dependencies.
    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// The shared simulation state, e.g. for reading results after a run.
    pub fn state(&self) -> &SimulationState {
        self.scheduler.state()
    }

    /// Mutable state access, e.g. for supplying externally-produced objects
    /// before the run.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        self.scheduler.state_mut()
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        self.scheduler.metrics()
    }

    /// The diagnostic time-unit label from the run configuration.
    pub fn time_unit(&self) -> &str {
        &self.time_unit
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use tidvakt_core::{QueueError, SimTime, StateError};
    use tidvakt_registry::ModuleDescriptor;

    use super::*;
    use crate::handler::{handler_fn, Dispatch};

    fn run_config(modules: &[&str], start: f64, end: f64) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.schedule.start_time = start;
        config.schedule.end_time = end;
        config.modules = modules.iter().map(|s| s.to_string()).collect();
        config
    }

    #[test]
    fn init_events_follow_resolved_order_not_listing_order() {
        let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let mut builder = SimulationBuilder::new();

        for descriptor in [
            ModuleDescriptor::new("consumer").with_input("r", "raster"),
            ModuleDescriptor::new("producer").with_output("r", "raster"),
            ModuleDescriptor::new("standalone"),
        ] {
            let log = log.clone();
            builder
                .register(
                    descriptor,
                    handler_fn(move |ctx, _event| {
                        log.borrow_mut().push(ctx.module().to_string());
                        Ok(Dispatch::Handled)
                    }),
                )
                .unwrap();
        }

        let config = run_config(&["consumer", "producer", "standalone"], 0.0, 1.0);
        let mut sim = builder.build(&config).unwrap();
        sim.run().unwrap();

        assert_eq!(*log.borrow(), vec!["producer", "consumer", "standalone"]);
        assert_eq!(
            sim.dependency_graph().activation_order(),
            vec!["producer".to_string(), "consumer".into(), "standalone".into()]
        );
    }

    #[test]
    fn self_rescheduling_respects_the_end_time_boundary() {
        let plotted: Rc<RefCell<Vec<f64>>> = Rc::new(RefCell::new(Vec::new()));
        let mut builder = SimulationBuilder::new();

        let log = plotted.clone();
        builder
            .register(
                ModuleDescriptor::new("plotter"),
                handler_fn(move |ctx, event| match event.kind() {
                    "init" => {
                        ctx.schedule("plot", ctx.now())?;
                        Ok(Dispatch::Handled)
                    }
                    "plot" => {
                        log.borrow_mut().push(ctx.now().value());
                        ctx.schedule("plot", ctx.now() + 1.5)?;
                        Ok(Dispatch::Handled)
                    }
                    _ => Ok(Dispatch::Unhandled),
                }),
            )
            .unwrap();

        let config = run_config(&["plotter"], 1.0, 4.0);
        let mut sim = builder.build(&config).unwrap();
        let report = sim.run().unwrap();

        // Plot fires at 1.0, 2.5, and exactly at the 4.0 boundary; the 5.5
        // follow-up lies strictly beyond the end time and is dropped.
        assert_eq!(*plotted.borrow(), vec![1.0, 2.5, 4.0]);
        assert_eq!(report.outcome, RunState::TimeLimitReached);
        assert_eq!(report.final_clock, SimTime::new(4.0));
    }

    #[test]
    fn same_time_events_dispatch_in_insertion_order() {
        let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let mut builder = SimulationBuilder::new();

        for name in ["a", "b"] {
            let log = log.clone();
            builder
                .register(
                    ModuleDescriptor::new(name),
                    handler_fn(move |ctx, event| match event.kind() {
                        "init" => {
                            ctx.schedule("fire", SimTime::new(5.0))?;
                            Ok(Dispatch::Handled)
                        }
                        "fire" => {
                            log.borrow_mut().push(ctx.module().to_string());
                            Ok(Dispatch::Handled)
                        }
                        _ => Ok(Dispatch::Unhandled),
                    }),
                )
                .unwrap();
        }

        let config = run_config(&["a", "b"], 0.0, 10.0);
        let mut sim = builder.build(&config).unwrap();
        let report = sim.run().unwrap();

        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert_eq!(report.outcome, RunState::Drained);
    }

    #[test]
    fn scheduling_into_the_past_aborts_the_run() {
        let witnessed: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let mut builder = SimulationBuilder::new();

        builder
            .register(
                ModuleDescriptor::new("violator"),
                handler_fn(|ctx, _event| {
                    ctx.schedule("past", SimTime::new(0.5))?;
                    Ok(Dispatch::Handled)
                }),
            )
            .unwrap();
        let log = witnessed.clone();
        builder
            .register(
                ModuleDescriptor::new("witness"),
                handler_fn(move |ctx, _event| {
                    log.borrow_mut().push(ctx.module().to_string());
                    Ok(Dispatch::Handled)
                }),
            )
            .unwrap();

        let config = run_config(&["violator", "witness"], 1.0, 10.0);
        let mut sim = builder.build(&config).unwrap();
        let err = sim.run().unwrap_err();

        assert!(matches!(
            err,
            EngineError::Queue(QueueError::CausalityViolation { .. })
        ));
        // The abort is immediate: the witness init never dispatches.
        assert!(witnessed.borrow().is_empty());
    }

    #[test]
    fn missing_parameter_aborts_the_run() {
        let mut builder = SimulationBuilder::new();
        builder
            .register(
                ModuleDescriptor::new("needy"),
                handler_fn(|ctx, _event| {
                    let _ = ctx.param("tuning")?;
                    Ok(Dispatch::Handled)
                }),
            )
            .unwrap();

        let config = run_config(&["needy"], 0.0, 1.0);
        let mut sim = builder.build(&config).unwrap();
        let err = sim.run().unwrap_err();
        assert!(matches!(
            err,
            EngineError::State(StateError::UndefinedParameter { .. })
        ));
    }

    #[test]
    fn params_resolve_through_overrides_and_defaults() {
        let seen: Rc<RefCell<Vec<(f64, u64)>>> = Rc::new(RefCell::new(Vec::new()));
        let mut builder = SimulationBuilder::new();

        let log = seen.clone();
        builder
            .register(
                ModuleDescriptor::new("fire")
                    .with_parameter("spread", serde_yaml::Value::from(0.1)),
                handler_fn(move |ctx, _event| {
                    let spread = ctx.param("spread")?.as_f64().unwrap_or_default();
                    let seed = ctx.param("seed")?.as_u64().unwrap_or_default();
                    log.borrow_mut().push((spread, seed));
                    Ok(Dispatch::Handled)
                }),
            )
            .unwrap();

        let mut config = run_config(&["fire"], 0.0, 1.0);
        config
            .global_params
            .insert("seed".into(), serde_yaml::Value::from(7u64));
        config.module_params.insert(
            "fire".into(),
            [("spread".to_string(), serde_yaml::Value::from(0.9))]
                .into_iter()
                .collect(),
        );

        let mut sim = builder.build(&config).unwrap();
        sim.run().unwrap();
        assert_eq!(*seen.borrow(), vec![(0.9, 7)]);
    }

    #[test]
    fn objects_flow_from_producer_to_consumer() {
        let observed: Rc<RefCell<Vec<f64>>> = Rc::new(RefCell::new(Vec::new()));
        let mut builder = SimulationBuilder::new();

        builder
            .register(
                ModuleDescriptor::new("producer").with_output("r", "scalar"),
                handler_fn(|ctx, event| match event.kind() {
                    "init" => {
                        ctx.state_mut().put("r", 0.0f64);
                        ctx.schedule("emit", SimTime::new(1.0))?;
                        Ok(Dispatch::Handled)
                    }
                    "emit" => {
                        let now = ctx.now().value();
                        ctx.state_mut().put("r", now * 10.0);
                        Ok(Dispatch::Handled)
                    }
                    _ => Ok(Dispatch::Unhandled),
                }),
            )
            .unwrap();
        let log = observed.clone();
        builder
            .register(
                ModuleDescriptor::new("consumer").with_input("r", "scalar"),
                handler_fn(move |ctx, event| match event.kind() {
                    "init" => {
                        // Offset past the producer's emit at the same step.
                        ctx.schedule("read", SimTime::new(1.1))?;
                        Ok(Dispatch::Handled)
                    }
                    "read" => {
                        log.borrow_mut().push(*ctx.state().get::<f64>("r")?);
                        Ok(Dispatch::Handled)
                    }
                    _ => Ok(Dispatch::Unhandled),
                }),
            )
            .unwrap();

        let config = run_config(&["consumer", "producer"], 0.0, 2.0);
        let mut sim = builder.build(&config).unwrap();
        sim.run().unwrap();
        assert_eq!(*observed.borrow(), vec![10.0]);
    }

    #[test]
    fn unknown_event_kind_warns_and_continues() {
        let mut builder = SimulationBuilder::new();
        builder
            .register(
                ModuleDescriptor::new("partial"),
                handler_fn(|ctx, event| match event.kind() {
                    "init" => {
                        ctx.schedule("mystery", SimTime::new(1.0))?;
                        ctx.schedule("known", SimTime::new(2.0))?;
                        Ok(Dispatch::Handled)
                    }
                    "known" => Ok(Dispatch::Handled),
                    _ => Ok(Dispatch::Unhandled),
                }),
            )
            .unwrap();

        let config = run_config(&["partial"], 0.0, 5.0);
        let mut sim = builder.build(&config).unwrap();
        let report = sim.run().unwrap();

        // The mystery event warns; the known event after it still runs.
        assert_eq!(report.outcome, RunState::Drained);
        assert_eq!(report.events_dispatched, 3);
        assert_eq!(report.warnings, 1);
        assert_eq!(sim.metrics().dispatch_warnings.get(), 1.0);
    }

    #[test]
    fn payloads_round_trip_through_the_queue() {
        let received: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
        let mut builder = SimulationBuilder::new();

        let log = received.clone();
        builder
            .register(
                ModuleDescriptor::new("courier"),
                handler_fn(move |ctx, event| match event.kind() {
                    "init" => {
                        ctx.schedule_with("deliver", SimTime::new(1.0), 42u32)?;
                        Ok(Dispatch::Handled)
                    }
                    "deliver" => {
                        if let Some(value) = event.payload::<u32>() {
                            log.borrow_mut().push(*value);
                        }
                        Ok(Dispatch::Handled)
                    }
                    _ => Ok(Dispatch::Unhandled),
                }),
            )
            .unwrap();

        let config = run_config(&["courier"], 0.0, 2.0);
        let mut sim = builder.build(&config).unwrap();
        sim.run().unwrap();
        assert_eq!(*received.borrow(), vec![42]);
    }

    #[test]
    fn identical_runs_produce_identical_trace_digests() {
        fn build() -> Simulation {
            let mut builder = SimulationBuilder::new();
            builder
                .register(
                    ModuleDescriptor::new("ticker"),
                    handler_fn(|ctx, event| match event.kind() {
                        "init" | "tick" => {
                            ctx.schedule("tick", ctx.now() + 0.5)?;
                            Ok(Dispatch::Handled)
                        }
                        _ => Ok(Dispatch::Unhandled),
                    }),
                )
                .unwrap();
            builder
                .register(
                    ModuleDescriptor::new("observer"),
                    handler_fn(|ctx, event| match event.kind() {
                        "init" => {
                            ctx.schedule("watch", ctx.now() + 0.6)?;
                            Ok(Dispatch::Handled)
                        }
                        "watch" => Ok(Dispatch::Handled),
                        _ => Ok(Dispatch::Unhandled),
                    }),
                )
                .unwrap();
            builder
                .build(&run_config(&["ticker", "observer"], 0.0, 3.0))
                .unwrap()
        }

        let first = build().run_to_report();
        let second = build().run_to_report();
        assert_eq!(first.trace_digest, second.trace_digest);
        assert_eq!(first.events_dispatched, second.events_dispatched);
    }

    #[test]
    fn expected_trace_gates_the_run() {
        fn build(expected: Option<String>) -> Simulation {
            let mut builder = SimulationBuilder::new();
            builder
                .register(
                    ModuleDescriptor::new("ticker"),
                    handler_fn(|ctx, event| match event.kind() {
                        "init" | "tick" => {
                            ctx.schedule("tick", ctx.now() + 1.0)?;
                            Ok(Dispatch::Handled)
                        }
                        _ => Ok(Dispatch::Unhandled),
                    }),
                )
                .unwrap();
            let mut config = run_config(&["ticker"], 0.0, 3.0);
            config.expected_trace = expected;
            builder.build(&config).unwrap()
        }

        let reference = build(None).run_to_report().trace_digest;

        // A matching digest validates; a divergent one fails the run.
        build(Some(reference.clone())).run_to_report();
        let err = build(Some("deadbeef".into())).run().unwrap_err();
        assert!(matches!(err, EngineError::TraceMismatch { .. }));
    }

    #[test]
    fn a_simulation_runs_exactly_once() {
        let mut builder = SimulationBuilder::new();
        builder
            .register(
                ModuleDescriptor::new("lone"),
                handler_fn(|_ctx, _event| Ok(Dispatch::Handled)),
            )
            .unwrap();

        let mut sim = builder.build(&run_config(&["lone"], 0.0, 1.0)).unwrap();
        sim.run().unwrap();
        assert!(matches!(sim.run(), Err(EngineError::AlreadyRun)));
    }

    #[test]
    fn empty_module_selection_drains_immediately() {
        let builder = SimulationBuilder::new();
        let mut sim = builder.build(&run_config(&[], 0.0, 1.0)).unwrap();
        let report = sim.run().unwrap();
        assert_eq!(report.outcome, RunState::Drained);
        assert_eq!(report.events_dispatched, 0);
    }

    #[test]
    fn externally_supplied_objects_are_visible_at_init() {
        let observed: Rc<RefCell<Vec<i64>>> = Rc::new(RefCell::new(Vec::new()));
        let mut builder = SimulationBuilder::new();

        let log = observed.clone();
        builder
            .register(
                ModuleDescriptor::new("consumer").with_input("boundary", "scalar"),
                handler_fn(move |ctx, _event| {
                    log.borrow_mut().push(*ctx.state().get::<i64>("boundary")?);
                    Ok(Dispatch::Handled)
                }),
            )
            .unwrap();

        let mut sim = builder.build(&run_config(&["consumer"], 0.0, 1.0)).unwrap();
        // No registered producer: the input arrives from outside before run.
        assert_eq!(sim.dependency_graph().unmatched_inputs().len(), 1);
        sim.state_mut().put("boundary", 17i64);
        sim.run().unwrap();
        assert_eq!(*observed.borrow(), vec![17]);
    }

    impl Simulation {
        fn run_to_report(mut self) -> RunReport {
            self.run().unwrap()
        }
    }
}
