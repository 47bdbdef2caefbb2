use alloc::{borrow::Cow, boxed::Box, collections::BTreeMap, format, string::String};
use core::ptr::NonNull;

use super::{Handler, IgnoreHandler, Signal, ValueHandler, duplicate_start, unexpected};
use crate::{
    error::Mismatch,
    event::Event,
    options::ImportOptions,
    storer::{Kind, short_type_name},
};

/// An object whose keys are data, each mapping to one scalar.
pub(crate) struct MapHandler<'a, F> {
    name: &'a str,
    target: NonNull<BTreeMap<String, F>>,
    kind: Kind<F>,
    started: bool,
}

impl<'a, F> MapHandler<'a, F> {
    pub(crate) fn new(name: &'a str, target: NonNull<BTreeMap<String, F>>, kind: Kind<F>) -> Self {
        Self {
            name,
            target,
            kind,
            started: false,
        }
    }
}

impl<'a, F: 'static> Handler<'a> for MapHandler<'a, F> {
    fn handle(&mut self, event: &Event<'_>, options: &ImportOptions) -> Signal<'a> {
        match *event {
            Event::ObjectStart if !self.started => {
                self.started = true;
                // SAFETY: only this handler and the entry handlers it pushes
                // reach the map, one at a time.
                unsafe { self.target.as_mut() }.clear();
                Signal::Continue
            }
            Event::ObjectStart => duplicate_start(event),
            Event::Key(key) if self.started => {
                if options.sentinel.matches(key) {
                    return Signal::Push(Box::new(IgnoreHandler::new()));
                }
                let Ok(key) = core::str::from_utf8(key) else {
                    return Signal::Fail(Mismatch::InvalidUtf8);
                };
                let key = String::from(key);
                let entries = self.target;
                let entry = key.clone();
                let storer = (self.kind.make)(Box::new(move |value: F| {
                    // SAFETY: as above.
                    unsafe { (*entries.as_ptr()).insert(entry.clone(), value) };
                }));
                Signal::Push(Box::new(ValueHandler::new(Cow::Owned(key), storer)))
            }
            Event::ObjectEnd if self.started => Signal::Pop,
            _ => unexpected(event),
        }
    }

    fn role(&self) -> String {
        format!("map {:?} of {}", self.name, short_type_name::<F>())
    }
}
