//! # tidvakt-core
//!
//! Foundation layer for the tidvakt discrete-event simulation scheduler.
//! Built with determinism, safety, and maintainability as primary design constraints.
//!
//! ### Key Submodules:
//! - `time`: `SimTime`, the real-valued simulated clock type
//! - `events`: `Event` records and the `(time, insertion)`-ordered `EventQueue`
//! - `state`: `SimulationState`, the shared object store and parameter table
//!
//! Execution is strictly single-threaded: the scheduler in `tidvakt-engine`
//! drives one event at a time to completion, so nothing in this crate needs
//! interior locking. Determinism comes from total event ordering by
//! `(time, insertion sequence)` and from the monotone clock.

pub mod error;
pub mod events;
pub mod state;
pub mod time;

pub mod prelude {
    pub use crate::error::StateError;
    pub use crate::events::{Event, EventQueue, QueueError, INIT_EVENT};
    pub use crate::state::{ParamTable, ParamValue, SimulationState};
    pub use crate::time::SimTime;
}

pub use error::StateError;
pub use events::{Event, EventQueue, QueueError, INIT_EVENT};
pub use state::{ParamTable, ParamValue, SimulationState};
pub use time::SimTime;
