//! The push-down automaton that routes events to handlers.

use alloc::{
    boxed::Box,
    string::{String, ToString},
    vec,
    vec::Vec,
};
use core::ptr::NonNull;

use tracing::{debug, trace};

use crate::{
    error::{Mismatch, SchemaMismatch},
    event::Event,
    handler::{BoxedHandler, Handler, ObjectHandler, Signal},
    options::ImportOptions,
    schema::Schema,
};

/// Progress reported after each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// More events are needed.
    Pending,
    /// The root object closed; the target is fully populated.
    Complete,
}

/// Feeds events one at a time into a target through its schema.
///
/// The dispatcher holds the exclusive borrow of the target for its whole
/// lifetime. The first failure is terminal: every later call returns the same
/// error without touching the target.
///
/// # Examples
///
/// ```rust
/// use bstr::BStr;
/// use jsonbind::{Dispatcher, Event, ImportOptions, Outcome, Schema};
///
/// #[derive(Default)]
/// struct Counter {
///     hits: u64,
/// }
///
/// let schema = Schema::<Counter>::builder().unsigned("hits", |c| &mut c.hits).build();
/// let mut counter = Counter::default();
/// let mut dispatcher = Dispatcher::new(&mut counter, &schema, ImportOptions::default());
///
/// for event in [Event::ObjectStart, Event::Key(BStr::new("hits")), Event::UnsignedInt(3)] {
///     assert_eq!(dispatcher.consume(&event)?, Outcome::Pending);
/// }
/// assert_eq!(dispatcher.consume(&Event::ObjectEnd)?, Outcome::Complete);
/// dispatcher.finish()?;
/// assert_eq!(counter.hits, 3);
/// # Ok::<(), jsonbind::SchemaMismatch>(())
/// ```
pub struct Dispatcher<'a> {
    stack: Vec<BoxedHandler<'a>>,
    options: ImportOptions,
    failure: Option<SchemaMismatch>,
}

impl<'a> Dispatcher<'a> {
    /// Bind `target` as the root object described by `schema`.
    #[must_use]
    pub fn new<T: 'static>(target: &'a mut T, schema: &'a Schema<T>, options: ImportOptions) -> Self {
        let root: BoxedHandler<'a> = Box::new(ObjectHandler::new(NonNull::from(target), schema));
        Self::with_root(root, options)
    }

    pub(crate) fn with_root(root: BoxedHandler<'a>, options: ImportOptions) -> Self {
        Self {
            stack: vec![root],
            options,
            failure: None,
        }
    }

    /// Apply one event.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaMismatch`] when the handler on top of the stack
    /// refuses the event, when an event arrives after the document is
    /// complete, or when any earlier event failed.
    pub fn consume(&mut self, event: &Event<'_>) -> Result<Outcome, SchemaMismatch> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        let Some(top) = self.stack.last_mut() else {
            return Err(self.fail(
                String::from("document"),
                Mismatch::AfterEnd(event.to_string()),
            ));
        };

        match top.handle(event, &self.options) {
            Signal::Continue => {}
            Signal::Push(handler) => {
                trace!(depth = self.stack.len() + 1, role = %handler.role(), "push");
                self.stack.push(handler);
            }
            Signal::Pop => {
                if let Some(handler) = self.stack.pop() {
                    trace!(depth = self.stack.len(), role = %handler.role(), "pop");
                }
            }
            Signal::Pop2 => {
                let Some(below) = self.stack.len().checked_sub(2) else {
                    let role = self.top_role();
                    return Err(self.fail(role, Mismatch::Unbalanced));
                };
                self.stack.truncate(below);
                trace!(depth = below, "pop2");
            }
            Signal::Fail(kind) => {
                let role = self.top_role();
                return Err(self.fail(role, kind));
            }
        }

        if self.stack.is_empty() {
            debug!("document complete");
            Ok(Outcome::Complete)
        } else {
            Ok(Outcome::Pending)
        }
    }

    /// Declare the end of the event stream.
    ///
    /// # Errors
    ///
    /// Fails with [`Mismatch::UnexpectedEnd`] if the root object has not been
    /// closed, or with the earlier error if one occurred.
    pub fn finish(mut self) -> Result<(), SchemaMismatch> {
        if let Some(failure) = self.failure.take() {
            return Err(failure);
        }
        if self.stack.is_empty() {
            return Ok(());
        }
        let role = self.top_role();
        Err(self.fail(role, Mismatch::UnexpectedEnd))
    }

    /// Number of handlers on the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns `true` once the root object has closed without error.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stack.is_empty() && self.failure.is_none()
    }

    fn top_role(&self) -> String {
        self.stack
            .last()
            .map_or_else(|| String::from("document"), |handler| handler.role())
    }

    fn fail(&mut self, role: String, kind: Mismatch) -> SchemaMismatch {
        let failure = SchemaMismatch::new(role, kind);
        debug!(error = %failure, depth = self.stack.len(), "import failed");
        self.stack.clear();
        self.failure = Some(failure.clone());
        failure
    }
}

impl core::fmt::Debug for Dispatcher<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field(
                "stack",
                &self.stack.iter().map(|h| h.role()).collect::<Vec<_>>(),
            )
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}
