//! The module handler trait the scheduler dispatches through.

use tidvakt_core::Event;

use crate::context::ModuleContext;
use crate::error::EngineError;

/// What a handler did with a dispatched event.
///
/// `Unhandled` marks an event kind the module does not recognize. The
/// scheduler logs it as a warning and keeps going; it is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    Unhandled,
}

/// A module's event-dispatch function, polymorphic over the module's event
/// kinds.
///
/// The conventional shape is a `match` on [`Event::kind`] with one arm per
/// declared kind (the reserved `"init"` kind included) and a final
/// `_ => Ok(Dispatch::Unhandled)` arm. Handlers run synchronously to
/// completion and must not block; all effects go through the context:
/// state mutation and scheduling of future events.
pub trait ModuleHandler {
    fn dispatch(
        &mut self,
        ctx: &mut ModuleContext<'_>,
        event: &Event,
    ) -> Result<Dispatch, EngineError>;
}

/// Adapter letting a closure serve as a [`ModuleHandler`].
pub struct FnHandler<F>(F);

impl<F> ModuleHandler for FnHandler<F>
where
    F: FnMut(&mut ModuleContext<'_>, &Event) -> Result<Dispatch, EngineError>,
{
    fn dispatch(
        &mut self,
        ctx: &mut ModuleContext<'_>,
        event: &Event,
    ) -> Result<Dispatch, EngineError> {
        (self.0)(ctx, event)
    }
}

/// Wraps a closure as a [`ModuleHandler`].
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: FnMut(&mut ModuleContext<'_>, &Event) -> Result<Dispatch, EngineError>,
{
    FnHandler(f)
}
