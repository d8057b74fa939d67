//! ## tidvakt-core::events
//! **Event records and the priority event queue**
//!
//! An [`Event`] is an immutable `(time, module, kind)` record with an opaque
//! optional payload. The [`EventQueue`] orders events by
//! `(time, insertion sequence)`: earlier times first, and at equal times the
//! event inserted first fires first. That FIFO tie-break is a documented
//! contract, not an accident: it is what makes a run reproducible for a
//! fixed module registration order.

use std::any::Any;
use std::fmt;

use crate::time::SimTime;

pub mod queue;

pub use queue::{EventQueue, QueueError};

/// The reserved event kind every module must handle. The scheduler seeds one
/// `init` event per module at the configured start time.
pub const INIT_EVENT: &str = "init";

/// A scheduled unit of future work: at `time`, dispatch `kind` to `module`.
///
/// Events are immutable once created. Rescheduling means inserting a new
/// event; there is no cancellation, so a module wishing to suppress a queued
/// action tracks that in its own state and no-ops in the handler.
pub struct Event {
    time: SimTime,
    module: String,
    kind: String,
    payload: Option<Box<dyn Any + Send>>,
}

impl Event {
    pub fn new(time: SimTime, module: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            time,
            module: module.into(),
            kind: kind.into(),
            payload: None,
        }
    }

    /// Attaches an opaque payload. The engine never inspects it; the owning
    /// module downcasts it back out with [`Event::payload`].
    pub fn with_payload<P: Any + Send>(mut self, payload: P) -> Self {
        self.payload = Some(Box::new(payload));
        self
    }

    #[inline]
    pub fn time(&self) -> SimTime {
        self.time
    }

    #[inline]
    pub fn module(&self) -> &str {
        &self.module
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The payload, if one was attached and is of type `P`.
    pub fn payload<P: Any>(&self) -> Option<&P> {
        self.payload.as_deref().and_then(|p| p.downcast_ref())
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("time", &self.time)
            .field("module", &self.module)
            .field("kind", &self.kind)
            .field("payload", &self.payload.as_ref().map(|_| "<opaque>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_downcasts_to_original_type() {
        let event = Event::new(SimTime::new(1.0), "producer", "emit").with_payload(7u32);
        assert_eq!(event.payload::<u32>(), Some(&7));
        assert_eq!(event.payload::<String>(), None);
    }

    #[test]
    fn payload_is_optional() {
        let event = Event::new(SimTime::ZERO, "producer", INIT_EVENT);
        assert_eq!(event.payload::<u32>(), None);
    }
}
