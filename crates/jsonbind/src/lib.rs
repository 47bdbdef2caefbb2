//! Schema-driven JSON import straight into Rust values.
//!
//! `jsonbind` turns a stream of parse [`Event`]s into a caller-defined target
//! without building an intermediate document tree. Each target type gets a
//! [`Schema`] that binds document keys to fields; a [`Dispatcher`] keeps a
//! stack of context handlers and routes every event to the one on top.
//!
//! Keys equal to `"_"` or starting or ending with `'?'` are comments: their
//! values are skipped whatever their shape. Every other unknown key is an
//! error. See [`ImportOptions`] for the accommodations that can be switched
//! off.
//!
//! ```rust
//! use jsonbind::{ImportError, Kind, Schema};
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     name: String,
//!     age: u32,
//!     tags: Vec<String>,
//! }
//!
//! let schema = Schema::<Person>::builder()
//!     .string("name", |p| &mut p.name)
//!     .unsigned("age", |p| &mut p.age)
//!     .array("tags", Kind::string(), |p| &mut p.tags)
//!     .build();
//!
//! let mut al = Person::default();
//! jsonbind::import(r#"{"_": "a comment", "name": "Al", "age": 5}"#, &mut al, &schema)?;
//! assert_eq!((al.name.as_str(), al.age), ("Al", 5));
//!
//! let err = jsonbind::import(r#"{"name": "Al", "extra": 1}"#, &mut Person::default(), &schema)
//!     .unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     r#"schema mismatch: unexpected key "extra" in object Person at 1:16"#
//! );
//! # Ok::<(), ImportError>(())
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod dispatcher;
mod error;
mod event;
mod handler;
mod options;
mod reader;
mod schema;
mod storer;

#[cfg(test)]
mod tests;

pub use dispatcher::{Dispatcher, Outcome};
pub use error::{ImportError, LexicalError, Mismatch, Position, SchemaMismatch, SyntaxError};
pub use event::{Event, EventSource};
pub use options::{ImportOptions, Sentinel};
pub use reader::Reader;
pub use schema::{Schema, SchemaBuilder};
pub use storer::{FloatScalar, Kind, SignedScalar, UnsignedScalar};

/// Import a JSON document into `target` with default options.
///
/// # Errors
///
/// See [`import_with`].
pub fn import<T: 'static>(
    source: impl AsRef<[u8]>,
    target: &mut T,
    schema: &Schema<T>,
) -> Result<(), ImportError> {
    import_with(source, target, schema, &ImportOptions::default())
}

/// Import a JSON document into `target`.
///
/// On error the target may hold partially written data.
///
/// # Errors
///
/// [`ImportError::Lexical`] if the document is not well-formed JSON,
/// [`ImportError::Schema`] if it does not fit `schema`.
pub fn import_with<T: 'static>(
    source: impl AsRef<[u8]>,
    target: &mut T,
    schema: &Schema<T>,
    options: &ImportOptions,
) -> Result<(), ImportError> {
    import_events(&mut Reader::new(source.as_ref()), target, schema, options)
}

/// Import events from any [`EventSource`] into `target`.
///
/// Schema errors carry the source's position of the offending token when
/// the source tracks one.
///
/// # Errors
///
/// Any error of the event source, or the first schema mismatch.
pub fn import_events<T: 'static, S: EventSource + ?Sized>(
    source: &mut S,
    target: &mut T,
    schema: &Schema<T>,
    options: &ImportOptions,
) -> Result<(), ImportError> {
    let mut dispatcher = Dispatcher::new(target, schema, options.clone());
    while let Some(event) = source.next_event()? {
        if let Err(err) = dispatcher.consume(&event) {
            return Err(err.at(source.position()).into());
        }
    }
    dispatcher
        .finish()
        .map_err(|err| err.at(source.position()).into())
}
