//! Context handlers driven by the [`Dispatcher`](crate::Dispatcher).
//!
//! Every handler is bound to one live target location and sees only the
//! events that belong to its context. The answer to each event is a
//! [`Signal`] telling the dispatcher how to change the handler stack.
//!
//! Targets are held as `NonNull` pointers obtained from the exclusive borrow
//! the dispatcher was created with. A handler only dereferences its pointer
//! while it is on top of the stack, so at most one `&mut` into the target
//! tree is live at any time.

mod array;
mod ignore;
mod map;
mod object;
mod value;

use alloc::{boxed::Box, string::String, string::ToString};

pub(crate) use array::{ArrayHandler, MatrixHandler, ObjectsHandler};
pub(crate) use ignore::IgnoreHandler;
pub(crate) use map::MapHandler;
pub(crate) use object::ObjectHandler;
pub(crate) use value::{CustomCapture, CustomHandler, ValueHandler};

use crate::{error::Mismatch, event::Event, options::ImportOptions};

pub(crate) type BoxedHandler<'a> = Box<dyn Handler<'a> + 'a>;

/// How the dispatcher should change the stack after an event.
pub(crate) enum Signal<'a> {
    Continue,
    Push(BoxedHandler<'a>),
    Pop,
    /// Drop this handler and the one below it.
    Pop2,
    Fail(Mismatch),
}

pub(crate) trait Handler<'a> {
    fn handle(&mut self, event: &Event<'_>, options: &ImportOptions) -> Signal<'a>;

    /// Human readable context for diagnostics.
    fn role(&self) -> String;
}

#[inline]
pub(crate) fn unexpected<'a>(event: &Event<'_>) -> Signal<'a> {
    Signal::Fail(Mismatch::UnexpectedEvent(event.to_string()))
}

#[inline]
pub(crate) fn duplicate_start<'a>(event: &Event<'_>) -> Signal<'a> {
    Signal::Fail(Mismatch::DuplicateStart(event.to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    use alloc::vec::Vec;

    use super::*;

    /// What a handler answered, without the pushed handler itself.
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Answer {
        Continue,
        Push(String),
        Pop,
        Pop2,
        Fail(Mismatch),
    }

    impl From<Signal<'_>> for Answer {
        fn from(signal: Signal<'_>) -> Self {
            match signal {
                Signal::Continue => Answer::Continue,
                Signal::Push(handler) => Answer::Push(handler.role()),
                Signal::Pop => Answer::Pop,
                Signal::Pop2 => Answer::Pop2,
                Signal::Fail(m) => Answer::Fail(m),
            }
        }
    }

    /// Feed `events` to one handler, collecting its answers.
    pub(crate) fn drive<'a>(handler: &mut dyn Handler<'a>, events: &[Event<'_>]) -> Vec<Answer> {
        let options = ImportOptions::default();
        events
            .iter()
            .map(|event| handler.handle(event, &options).into())
            .collect()
    }
}
