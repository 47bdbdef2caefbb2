use alloc::{boxed::Box, format, string::String};
use core::ptr::NonNull;

use bstr::ByteSlice;

use super::{Handler, IgnoreHandler, Signal, duplicate_start, unexpected};
use crate::{error::Mismatch, event::Event, options::ImportOptions, schema::Schema};

/// Routes the members of one object to the handlers its schema builds.
pub(crate) struct ObjectHandler<'a, T> {
    target: NonNull<T>,
    schema: &'a Schema<T>,
    started: bool,
}

impl<'a, T> ObjectHandler<'a, T> {
    pub(crate) fn new(target: NonNull<T>, schema: &'a Schema<T>) -> Self {
        Self {
            target,
            schema,
            started: false,
        }
    }

    /// A handler whose `{` was already consumed by the array containing it.
    pub(crate) fn started(target: NonNull<T>, schema: &'a Schema<T>) -> Self {
        Self {
            started: true,
            ..Self::new(target, schema)
        }
    }
}

impl<'a, T: 'static> Handler<'a> for ObjectHandler<'a, T> {
    fn handle(&mut self, event: &Event<'_>, options: &ImportOptions) -> Signal<'a> {
        match *event {
            Event::ObjectStart if !self.started => {
                self.started = true;
                Signal::Continue
            }
            Event::ObjectStart => duplicate_start(event),
            Event::Key(key) if self.started => {
                let schema: &'a Schema<T> = self.schema;
                if let Some((name, factory)) = schema.lookup(key) {
                    // SAFETY: `target` was derived from the exclusive borrow
                    // held by the dispatcher and this handler does not touch it
                    // again until the child has been popped.
                    Signal::Push(unsafe { factory.make(name, self.target) })
                } else if options.sentinel.matches(key) {
                    Signal::Push(Box::new(IgnoreHandler::new()))
                } else {
                    Signal::Fail(Mismatch::UnexpectedKey(key.to_str_lossy().into_owned()))
                }
            }
            Event::ObjectEnd if self.started => Signal::Pop,
            _ => unexpected(event),
        }
    }

    fn role(&self) -> String {
        format!("object {}", self.schema.name())
    }
}
