/*!
# Tidvakt Engine

The scheduler core: seeds each module's `init` event in dependency order,
then drives the main loop: pop the earliest event, advance the clock,
dispatch to the owning module's handler, let the handler mutate shared state
and schedule follow-up events, repeat until the queue drains or the end time
is reached.

Execution is strictly single-threaded and cooperative. A handler runs to
completion before the next event is popped; there is no preemption, no
parallel module execution, and no way to cancel a queued event. Determinism
for a fixed registration order and fixed handler logic is a contract: events
are totally ordered by `(time, insertion sequence)`, and every dispatched
event is folded into a trace digest hosts can compare across runs.
*/

pub mod context;
pub mod error;
pub mod handler;
mod scheduler;
pub mod simulation;

pub use context::ModuleContext;
pub use error::EngineError;
pub use handler::{handler_fn, Dispatch, FnHandler, ModuleHandler};
pub use scheduler::{RunReport, RunState};
pub use simulation::{Simulation, SimulationBuilder};
