use alloc::{boxed::Box, format, string::String, vec::Vec};
use core::ptr::NonNull;

use super::{Handler, ObjectHandler, Signal, duplicate_start, unexpected};
use crate::{
    error::Mismatch,
    event::Event,
    options::ImportOptions,
    schema::Schema,
    storer::{Store, Storer, short_type_name},
};

fn check_len<'a>(expected: usize, found: usize) -> Signal<'a> {
    if expected == 0 || expected == found {
        Signal::Pop
    } else {
        Signal::Fail(Mismatch::SizeMismatch { expected, found })
    }
}

/// An array whose elements are objects of one schema.
pub(crate) struct ObjectsHandler<'a, E> {
    name: &'a str,
    target: NonNull<Vec<E>>,
    schema: &'a Schema<E>,
    expected: usize,
    started: bool,
}

impl<'a, E> ObjectsHandler<'a, E> {
    pub(crate) fn new(
        name: &'a str,
        target: NonNull<Vec<E>>,
        schema: &'a Schema<E>,
        expected: usize,
    ) -> Self {
        Self {
            name,
            target,
            schema,
            expected,
            started: false,
        }
    }
}

impl<'a, E: Default + 'static> Handler<'a> for ObjectsHandler<'a, E> {
    fn handle(&mut self, event: &Event<'_>, _options: &ImportOptions) -> Signal<'a> {
        // SAFETY: the handler is on top of the stack, so no element handler
        // holds a pointer into the vector right now.
        let items = unsafe { self.target.as_mut() };
        match event {
            Event::ArrayStart if !self.started => {
                self.started = true;
                items.clear();
                Signal::Continue
            }
            Event::ArrayStart => duplicate_start(event),
            Event::ObjectStart if self.started => {
                items.push(E::default());
                let last = items.len() - 1;
                let item = NonNull::from(&mut items[last]);
                Signal::Push(Box::new(ObjectHandler::started(item, self.schema)))
            }
            Event::ArrayEnd if self.started => check_len(self.expected, items.len()),
            _ => unexpected(event),
        }
    }

    fn role(&self) -> String {
        format!("array {:?} of {}", self.name, self.schema.name())
    }
}

/// An array of scalars of one kind.
pub(crate) struct ArrayHandler<'a, F> {
    name: &'a str,
    target: NonNull<Vec<F>>,
    storer: Storer<'a>,
    expected: usize,
    started: bool,
}

impl<'a, F> ArrayHandler<'a, F> {
    pub(crate) fn new(
        name: &'a str,
        target: NonNull<Vec<F>>,
        storer: Storer<'a>,
        expected: usize,
    ) -> Self {
        Self {
            name,
            target,
            storer,
            expected,
            started: false,
        }
    }
}

impl<'a, F: 'a> Handler<'a> for ArrayHandler<'a, F> {
    fn handle(&mut self, event: &Event<'_>, options: &ImportOptions) -> Signal<'a> {
        match event {
            Event::ArrayStart if !self.started => {
                self.started = true;
                // SAFETY: only this handler and its storer reach the vector.
                unsafe { self.target.as_mut() }.clear();
                Signal::Continue
            }
            Event::ArrayStart => duplicate_start(event),
            Event::ArrayEnd if self.started => {
                // SAFETY: as above.
                check_len(self.expected, unsafe { self.target.as_ref() }.len())
            }
            _ if self.started => match self.storer.store(event, options) {
                Store::Captured => Signal::Continue,
                Store::WrongKind => unexpected(event),
                Store::Rejected(mismatch) => Signal::Fail(mismatch),
            },
            _ => unexpected(event),
        }
    }

    fn role(&self) -> String {
        format!("array {:?} of {}", self.name, self.storer.target())
    }
}

/// An array of arrays of scalars, e.g. `[[1, 2], [3]]`.
pub(crate) struct MatrixHandler<'a, F> {
    name: &'a str,
    target: NonNull<Vec<Vec<F>>>,
    storer: Storer<'a>,
    /// 0 before the outer `[`, 1 between rows, 2 inside a row.
    depth: u8,
}

impl<'a, F> MatrixHandler<'a, F> {
    pub(crate) fn new(name: &'a str, target: NonNull<Vec<Vec<F>>>, storer: Storer<'a>) -> Self {
        Self {
            name,
            target,
            storer,
            depth: 0,
        }
    }
}

impl<'a, F: 'a> Handler<'a> for MatrixHandler<'a, F> {
    fn handle(&mut self, event: &Event<'_>, options: &ImportOptions) -> Signal<'a> {
        match (self.depth, event) {
            (0, Event::ArrayStart) => {
                // SAFETY: only this handler and its storer reach the rows.
                unsafe { self.target.as_mut() }.clear();
                self.depth = 1;
                Signal::Continue
            }
            (1, Event::ArrayStart) => {
                // SAFETY: as above.
                unsafe { self.target.as_mut() }.push(Vec::new());
                self.depth = 2;
                Signal::Continue
            }
            (2, Event::ArrayEnd) => {
                self.depth = 1;
                Signal::Continue
            }
            (1, Event::ArrayEnd) => Signal::Pop,
            (2, _) => match self.storer.store(event, options) {
                Store::Captured => Signal::Continue,
                Store::WrongKind => unexpected(event),
                Store::Rejected(mismatch) => Signal::Fail(mismatch),
            },
            _ => unexpected(event),
        }
    }

    fn role(&self) -> String {
        format!("array {:?} of arrays of {}", self.name, short_type_name::<F>())
    }
}
