//! Per-type field tables.
//!
//! A [`Schema`] maps each document key to a factory that knows how to reach
//! the matching field inside a parent value and which handler to build for
//! it. Schemas are built once and shared by every parse of that type; nested
//! object types hold their schema in an [`Arc`].

use alloc::{
    borrow::Cow,
    boxed::Box,
    collections::BTreeMap,
    string::String,
    sync::Arc,
    vec::Vec,
};
use core::{fmt, ptr::NonNull};

use crate::{
    error::Mismatch,
    event::Event,
    handler::{
        ArrayHandler, BoxedHandler, CustomCapture, CustomHandler, MapHandler, MatrixHandler,
        ObjectHandler, ObjectsHandler, ValueHandler,
    },
    storer::{FloatScalar, Kind, SignedScalar, UnsignedScalar, short_type_name},
};

/// Builds the handler for one field of a `T`.
pub(crate) trait Factory<T>: Send + Sync {
    /// # Safety
    ///
    /// `parent` must point to a live `T` that stays valid for `'a`, and that
    /// nothing else reads or writes while the returned handler is in use.
    unsafe fn make<'a>(&'a self, name: &'a str, parent: NonNull<T>) -> BoxedHandler<'a>;
}

type Accessor<T, F> = Box<dyn Fn(&mut T) -> &mut F + Send + Sync>;

struct ValueFactory<T, F> {
    kind: Kind<F>,
    setter: Box<dyn Fn(&mut T, F) + Send + Sync>,
}

impl<T: 'static, F: 'static> Factory<T> for ValueFactory<T, F> {
    unsafe fn make<'a>(&'a self, name: &'a str, parent: NonNull<T>) -> BoxedHandler<'a> {
        let setter = &self.setter;
        let storer = (self.kind.make)(Box::new(move |value: F| {
            // SAFETY: `parent` outlives the handler and is not borrowed
            // elsewhere while the handler is on top of the stack.
            setter(unsafe { &mut *parent.as_ptr() }, value);
        }));
        Box::new(ValueHandler::new(Cow::Borrowed(name), storer))
    }
}

struct CustomFactory<T, F> {
    accessor: Accessor<T, F>,
    capture: Box<CustomCapture<F>>,
}

impl<T: 'static, F: 'static> Factory<T> for CustomFactory<T, F> {
    unsafe fn make<'a>(&'a self, name: &'a str, parent: NonNull<T>) -> BoxedHandler<'a> {
        // SAFETY: guaranteed by the caller.
        let field = NonNull::from((self.accessor)(unsafe { &mut *parent.as_ptr() }));
        Box::new(CustomHandler::new(name, field, &*self.capture))
    }
}

struct ObjectFactory<T, C> {
    accessor: Accessor<T, C>,
    schema: Arc<Schema<C>>,
}

impl<T: 'static, C: 'static> Factory<T> for ObjectFactory<T, C> {
    unsafe fn make<'a>(&'a self, _name: &'a str, parent: NonNull<T>) -> BoxedHandler<'a> {
        // SAFETY: guaranteed by the caller.
        let child = NonNull::from((self.accessor)(unsafe { &mut *parent.as_ptr() }));
        Box::new(ObjectHandler::new(child, &self.schema))
    }
}

struct ObjectsFactory<T, E> {
    accessor: Accessor<T, Vec<E>>,
    schema: Arc<Schema<E>>,
    expected: usize,
}

impl<T: 'static, E: Default + 'static> Factory<T> for ObjectsFactory<T, E> {
    unsafe fn make<'a>(&'a self, name: &'a str, parent: NonNull<T>) -> BoxedHandler<'a> {
        // SAFETY: guaranteed by the caller.
        let items = NonNull::from((self.accessor)(unsafe { &mut *parent.as_ptr() }));
        Box::new(ObjectsHandler::new(name, items, &self.schema, self.expected))
    }
}

struct ArrayFactory<T, F> {
    accessor: Accessor<T, Vec<F>>,
    kind: Kind<F>,
    expected: usize,
}

impl<T: 'static, F: 'static> Factory<T> for ArrayFactory<T, F> {
    unsafe fn make<'a>(&'a self, name: &'a str, parent: NonNull<T>) -> BoxedHandler<'a> {
        // SAFETY: guaranteed by the caller.
        let items = NonNull::from((self.accessor)(unsafe { &mut *parent.as_ptr() }));
        let storer = (self.kind.make)(Box::new(move |value: F| {
            // SAFETY: the handler owning this storer is the only user of `items`.
            unsafe { (*items.as_ptr()).push(value) };
        }));
        Box::new(ArrayHandler::new(name, items, storer, self.expected))
    }
}

struct MatrixFactory<T, F> {
    accessor: Accessor<T, Vec<Vec<F>>>,
    kind: Kind<F>,
}

impl<T: 'static, F: 'static> Factory<T> for MatrixFactory<T, F> {
    unsafe fn make<'a>(&'a self, name: &'a str, parent: NonNull<T>) -> BoxedHandler<'a> {
        // SAFETY: guaranteed by the caller.
        let rows = NonNull::from((self.accessor)(unsafe { &mut *parent.as_ptr() }));
        let storer = (self.kind.make)(Box::new(move |value: F| {
            // SAFETY: the handler owning this storer is the only user of `rows`.
            if let Some(row) = unsafe { (*rows.as_ptr()).last_mut() } {
                row.push(value);
            }
        }));
        Box::new(MatrixHandler::new(name, rows, storer))
    }
}

struct MapFactory<T, F> {
    accessor: Accessor<T, BTreeMap<String, F>>,
    kind: Kind<F>,
}

impl<T: 'static, F: 'static> Factory<T> for MapFactory<T, F> {
    unsafe fn make<'a>(&'a self, name: &'a str, parent: NonNull<T>) -> BoxedHandler<'a> {
        // SAFETY: guaranteed by the caller.
        let entries = NonNull::from((self.accessor)(unsafe { &mut *parent.as_ptr() }));
        Box::new(MapHandler::new(name, entries, self.kind))
    }
}

/// The field table of a target type `T`.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
///
/// use jsonbind::{Kind, Schema};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Pet {
///     name: String,
/// }
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Owner {
///     name: String,
///     pets: Vec<Pet>,
///     scores: Vec<Vec<i32>>,
/// }
///
/// let pet = Arc::new(Schema::<Pet>::builder().string("name", |p| &mut p.name).build());
/// let owner = Schema::<Owner>::builder()
///     .string("name", |o| &mut o.name)
///     .objects("pets", |o| &mut o.pets, pet)
///     .arrays("scores", Kind::signed(), |o| &mut o.scores)
///     .build();
///
/// let mut target = Owner::default();
/// jsonbind::import(
///     r#"{"name": "Ann", "pets": [{"name": "Rex"}], "scores": [[1, 2], []]}"#,
///     &mut target,
///     &owner,
/// )?;
/// assert_eq!(target.pets, [Pet { name: "Rex".into() }]);
/// assert_eq!(target.scores, [vec![1, 2], vec![]]);
/// # Ok::<(), jsonbind::ImportError>(())
/// ```
pub struct Schema<T> {
    name: String,
    fields: BTreeMap<String, Box<dyn Factory<T>>>,
}

impl<T: 'static> Schema<T> {
    /// Start registering fields.
    #[must_use]
    pub fn builder() -> SchemaBuilder<T> {
        SchemaBuilder {
            name: None,
            fields: BTreeMap::new(),
        }
    }
}

impl<T> Schema<T> {
    /// Name used for this type in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of registered fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if `field` is bound.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Registered field names in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Find the factory for a raw key. Keys that are not UTF-8 never match.
    pub(crate) fn lookup(&self, key: &[u8]) -> Option<(&str, &dyn Factory<T>)> {
        let key = core::str::from_utf8(key).ok()?;
        self.fields
            .get_key_value(key)
            .map(|(name, factory)| (name.as_str(), factory.as_ref()))
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Registers the fields of a [`Schema`].
///
/// Registering a name twice replaces the earlier binding.
#[must_use]
pub struct SchemaBuilder<T> {
    name: Option<String>,
    fields: BTreeMap<String, Box<dyn Factory<T>>>,
}

impl<T: 'static> SchemaBuilder<T> {
    fn insert(mut self, name: &str, factory: impl Factory<T> + 'static) -> Self {
        self.fields.insert(String::from(name), Box::new(factory));
        self
    }

    /// Name shown for this type in diagnostics, defaulting to the Rust type
    /// name without its module path.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Bind a scalar field reached through `accessor`.
    pub fn value<F: 'static>(
        self,
        name: &str,
        kind: Kind<F>,
        accessor: impl Fn(&mut T) -> &mut F + Send + Sync + 'static,
    ) -> Self {
        self.setter(name, kind, move |target, value| *accessor(target) = value)
    }

    /// Bind a scalar that is handed to `setter` instead of being assigned.
    pub fn setter<F: 'static>(
        self,
        name: &str,
        kind: Kind<F>,
        setter: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Self {
        self.insert(name, ValueFactory {
            kind,
            setter: Box::new(setter),
        })
    }

    pub fn string(
        self,
        name: &str,
        accessor: impl Fn(&mut T) -> &mut String + Send + Sync + 'static,
    ) -> Self {
        self.value(name, Kind::string(), accessor)
    }

    pub fn boolean(
        self,
        name: &str,
        accessor: impl Fn(&mut T) -> &mut bool + Send + Sync + 'static,
    ) -> Self {
        self.value(name, Kind::boolean(), accessor)
    }

    pub fn signed<F: SignedScalar>(
        self,
        name: &str,
        accessor: impl Fn(&mut T) -> &mut F + Send + Sync + 'static,
    ) -> Self {
        self.value(name, Kind::signed(), accessor)
    }

    pub fn unsigned<F: UnsignedScalar>(
        self,
        name: &str,
        accessor: impl Fn(&mut T) -> &mut F + Send + Sync + 'static,
    ) -> Self {
        self.value(name, Kind::unsigned(), accessor)
    }

    pub fn float<F: FloatScalar>(
        self,
        name: &str,
        accessor: impl Fn(&mut T) -> &mut F + Send + Sync + 'static,
    ) -> Self {
        self.value(name, Kind::float(), accessor)
    }

    /// Bind a field whose value is decoded by `capture`.
    ///
    /// `capture` sees the single event holding the value. It returns
    /// `Ok(true)` once it has stored it, `Ok(false)` for an event it does not
    /// accept, or a [`Mismatch`] of its own.
    ///
    /// ```rust
    /// use jsonbind::{Event, Mismatch, Schema};
    ///
    /// #[derive(Debug, Default)]
    /// struct Version(u16, u16);
    ///
    /// #[derive(Debug, Default)]
    /// struct Package {
    ///     version: Version,
    /// }
    ///
    /// let schema = Schema::<Package>::builder()
    ///     .custom("version", |p| &mut p.version, |v: &mut Version, event: &Event<'_>| {
    ///         let Event::String(text) = *event else { return Ok(false) };
    ///         let text = core::str::from_utf8(text).map_err(|_| Mismatch::InvalidUtf8)?;
    ///         let bad = || Mismatch::UnexpectedEvent(event.to_string());
    ///         let (major, minor) = text.split_once('.').ok_or_else(bad)?;
    ///         *v = Version(major.parse().map_err(|_| bad())?, minor.parse().map_err(|_| bad())?);
    ///         Ok(true)
    ///     })
    ///     .build();
    ///
    /// let mut package = Package::default();
    /// jsonbind::import(r#"{"version": "1.12"}"#, &mut package, &schema)?;
    /// assert_eq!((package.version.0, package.version.1), (1, 12));
    /// # Ok::<(), jsonbind::ImportError>(())
    /// ```
    pub fn custom<F: 'static>(
        self,
        name: &str,
        accessor: impl Fn(&mut T) -> &mut F + Send + Sync + 'static,
        capture: impl Fn(&mut F, &Event<'_>) -> Result<bool, Mismatch> + Send + Sync + 'static,
    ) -> Self {
        self.insert(name, CustomFactory {
            accessor: Box::new(accessor),
            capture: Box::new(capture),
        })
    }

    /// Bind a nested object described by `schema`.
    pub fn object<C: 'static>(
        self,
        name: &str,
        accessor: impl Fn(&mut T) -> &mut C + Send + Sync + 'static,
        schema: Arc<Schema<C>>,
    ) -> Self {
        self.insert(name, ObjectFactory {
            accessor: Box::new(accessor),
            schema,
        })
    }

    /// Bind an array of objects; each element starts as `E::default()`.
    pub fn objects<E: Default + 'static>(
        self,
        name: &str,
        accessor: impl Fn(&mut T) -> &mut Vec<E> + Send + Sync + 'static,
        schema: Arc<Schema<E>>,
    ) -> Self {
        self.objects_sized(name, 0, accessor, schema)
    }

    /// Like [`objects`](Self::objects), but the array must hold exactly
    /// `expected` elements unless `expected` is 0.
    pub fn objects_sized<E: Default + 'static>(
        self,
        name: &str,
        expected: usize,
        accessor: impl Fn(&mut T) -> &mut Vec<E> + Send + Sync + 'static,
        schema: Arc<Schema<E>>,
    ) -> Self {
        self.insert(name, ObjectsFactory {
            accessor: Box::new(accessor),
            schema,
            expected,
        })
    }

    /// Bind an array of scalars.
    pub fn array<F: 'static>(
        self,
        name: &str,
        kind: Kind<F>,
        accessor: impl Fn(&mut T) -> &mut Vec<F> + Send + Sync + 'static,
    ) -> Self {
        self.array_sized(name, 0, kind, accessor)
    }

    /// Like [`array`](Self::array), but the array must hold exactly
    /// `expected` elements unless `expected` is 0.
    pub fn array_sized<F: 'static>(
        self,
        name: &str,
        expected: usize,
        kind: Kind<F>,
        accessor: impl Fn(&mut T) -> &mut Vec<F> + Send + Sync + 'static,
    ) -> Self {
        self.insert(name, ArrayFactory {
            accessor: Box::new(accessor),
            kind,
            expected,
        })
    }

    /// Bind an array whose elements are arrays of scalars.
    pub fn arrays<F: 'static>(
        self,
        name: &str,
        kind: Kind<F>,
        accessor: impl Fn(&mut T) -> &mut Vec<Vec<F>> + Send + Sync + 'static,
    ) -> Self {
        self.insert(name, MatrixFactory {
            accessor: Box::new(accessor),
            kind,
        })
    }

    /// Bind an object with free-form keys whose values are scalars.
    pub fn map<F: 'static>(
        self,
        name: &str,
        kind: Kind<F>,
        accessor: impl Fn(&mut T) -> &mut BTreeMap<String, F> + Send + Sync + 'static,
    ) -> Self {
        self.insert(name, MapFactory {
            accessor: Box::new(accessor),
            kind,
        })
    }

    pub fn build(self) -> Schema<T> {
        Schema {
            name: self
                .name
                .unwrap_or_else(|| String::from(short_type_name::<T>())),
            fields: self.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, vec};

    use super::*;

    #[derive(Default)]
    struct Point {
        x: i32,
        y: i32,
    }

    fn point() -> Schema<Point> {
        Schema::<Point>::builder()
            .signed("x", |p| &mut p.x)
            .signed("y", |p| &mut p.y)
            .build()
    }

    #[test]
    fn default_name_is_short_type_name() {
        assert_eq!(point().name(), "Point");
        let renamed = Schema::<Point>::builder().named("Vec2").build();
        assert_eq!(renamed.name(), "Vec2");
        assert!(renamed.is_empty());
    }

    #[test]
    fn lookup_by_raw_key() {
        let schema = point();
        assert_eq!(schema.lookup(b"x").map(|(name, _)| name), Some("x"));
        assert!(schema.lookup(b"z").is_none());
        assert!(schema.lookup(b"\xff").is_none());
        assert!(schema.contains("y"));
        assert!(!schema.contains("Y"));
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn later_registration_wins() {
        let schema = Schema::<Point>::builder()
            .signed("x", |p| &mut p.x)
            .signed("x", |p| &mut p.y)
            .build();
        assert_eq!(schema.len(), 1);

        let mut target = Point::default();
        crate::import(r#"{"x": 3}"#, &mut target, &schema).unwrap();
        assert_eq!((target.x, target.y), (0, 3));
    }

    #[test]
    fn schemas_are_shareable() {
        fn assert_send_sync<S: Send + Sync>(_: &S) {}
        assert_send_sync(&point());
        assert_eq!(format!("{:?}", point()), "Schema { name: \"Point\", fields: [\"x\", \"y\"] }");
    }
}
