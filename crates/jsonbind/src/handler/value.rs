use alloc::{borrow::Cow, format, string::String};
use core::ptr::NonNull;

use super::{Handler, Signal, unexpected};
use crate::{
    error::Mismatch,
    event::Event,
    options::ImportOptions,
    storer::{Store, Storer, short_type_name},
};

/// Caller-supplied decoding of one value into a field. `Ok(false)` means the
/// event is not a value this capture understands.
pub(crate) type CustomCapture<F> =
    dyn Fn(&mut F, &Event<'_>) -> Result<bool, Mismatch> + Send + Sync;

/// Captures exactly one scalar and pops.
pub(crate) struct ValueHandler<'a> {
    name: Cow<'a, str>,
    storer: Storer<'a>,
}

impl<'a> ValueHandler<'a> {
    pub(crate) fn new(name: Cow<'a, str>, storer: Storer<'a>) -> Self {
        Self { name, storer }
    }
}

impl<'a> Handler<'a> for ValueHandler<'a> {
    fn handle(&mut self, event: &Event<'_>, options: &ImportOptions) -> Signal<'a> {
        match self.storer.store(event, options) {
            Store::Captured => Signal::Pop,
            Store::WrongKind => unexpected(event),
            Store::Rejected(mismatch) => Signal::Fail(mismatch),
        }
    }

    fn role(&self) -> String {
        format!("field {:?} ({})", self.name, self.storer.target())
    }
}

/// Like [`ValueHandler`], but the capture is provided by the caller.
pub(crate) struct CustomHandler<'a, F> {
    name: &'a str,
    target: NonNull<F>,
    capture: &'a CustomCapture<F>,
}

impl<'a, F> CustomHandler<'a, F> {
    pub(crate) fn new(name: &'a str, target: NonNull<F>, capture: &'a CustomCapture<F>) -> Self {
        Self {
            name,
            target,
            capture,
        }
    }
}

impl<'a, F: 'static> Handler<'a> for CustomHandler<'a, F> {
    fn handle(&mut self, event: &Event<'_>, _options: &ImportOptions) -> Signal<'a> {
        // SAFETY: the handler is on top of the stack and is the only user of
        // the field.
        let field = unsafe { self.target.as_mut() };
        match (self.capture)(field, event) {
            Ok(true) => Signal::Pop,
            Ok(false) => unexpected(event),
            Err(mismatch) => Signal::Fail(mismatch),
        }
    }

    fn role(&self) -> String {
        format!("field {:?} ({})", self.name, short_type_name::<F>())
    }
}
