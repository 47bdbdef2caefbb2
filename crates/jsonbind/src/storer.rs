//! Capture strategies for scalar values.
//!
//! A [`Kind`] is chosen when a field is registered. At parse time it produces
//! a [`Storer`] bound to one target location, which decides per event whether
//! the value is accepted, converted, or refused.

use alloc::{
    boxed::Box,
    string::{String, ToString},
};
use core::{any::type_name, fmt};

use crate::{error::Mismatch, event::Event, options::ImportOptions};

/// Receives a converted value and writes it into the target.
pub(crate) type Sink<'a, F> = Box<dyn FnMut(F) + 'a>;

pub(crate) type MakeStorer<F> = for<'a> fn(Sink<'a, F>) -> Storer<'a>;

/// Unsigned integer types a field may be declared as.
pub trait UnsignedScalar: Copy + Send + Sync + 'static {
    /// Value stored for `-1` when the minus-one accommodation is enabled.
    const MAX: Self;
    /// Narrow a decoded value, `None` when it does not fit.
    fn from_u64(value: u64) -> Option<Self>;
}

/// Signed integer types a field may be declared as.
pub trait SignedScalar: Copy + Send + Sync + 'static {
    /// Narrow a decoded value, `None` when it does not fit.
    fn from_i64(value: i64) -> Option<Self>;
}

/// Floating point types a field may be declared as.
pub trait FloatScalar: Copy + Send + Sync + 'static {
    /// Convert a decoded value, rounding to the nearest representable one.
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_unsigned_scalar {
    ($($ty:ty),*) => {$(
        impl UnsignedScalar for $ty {
            const MAX: Self = <$ty>::MAX;

            #[inline]
            fn from_u64(value: u64) -> Option<Self> {
                <$ty>::try_from(value).ok()
            }
        }
    )*};
}

macro_rules! impl_signed_scalar {
    ($($ty:ty),*) => {$(
        impl SignedScalar for $ty {
            #[inline]
            fn from_i64(value: i64) -> Option<Self> {
                <$ty>::try_from(value).ok()
            }
        }
    )*};
}

impl_unsigned_scalar!(u8, u16, u32, u64, usize);
impl_signed_scalar!(i8, i16, i32, i64, isize);

impl FloatScalar for f64 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}

impl FloatScalar for f32 {
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

/// The scalar kind of a field, selected at registration time.
///
/// ```rust
/// use jsonbind::{Kind, Schema};
///
/// #[derive(Default)]
/// struct Sample {
///     id: u16,
///     label: String,
/// }
///
/// let schema = Schema::<Sample>::builder()
///     .value("id", Kind::unsigned(), |s| &mut s.id)
///     .value("label", Kind::string(), |s| &mut s.label)
///     .build();
/// assert_eq!(schema.len(), 2);
/// ```
pub struct Kind<F> {
    pub(crate) make: MakeStorer<F>,
}

impl<F> Clone for Kind<F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F> Copy for Kind<F> {}

impl<F> fmt::Debug for Kind<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Kind").field(&short_type_name::<F>()).finish()
    }
}

impl Kind<String> {
    /// Text; accepts strings that are valid UTF-8.
    #[must_use]
    pub fn string() -> Self {
        Self { make: string }
    }
}

impl Kind<bool> {
    /// Booleans; also non-negative integers when
    /// [`bool_from_unsigned`](ImportOptions::bool_from_unsigned) is set.
    #[must_use]
    pub fn boolean() -> Self {
        Self { make: boolean }
    }
}

impl<F: SignedScalar> Kind<F> {
    /// Signed integers of any width.
    #[must_use]
    pub fn signed() -> Self {
        Self { make: signed::<F> }
    }
}

impl<F: UnsignedScalar> Kind<F> {
    /// Unsigned integers of any width.
    #[must_use]
    pub fn unsigned() -> Self {
        Self { make: unsigned::<F> }
    }
}

impl<F: FloatScalar> Kind<F> {
    /// Floating point; integers are accepted too.
    #[must_use]
    pub fn float() -> Self {
        Self { make: float::<F> }
    }
}

/// An unsigned value before narrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wide {
    Value(u64),
    Max,
}

pub(crate) enum Capture<'a> {
    String(Sink<'a, String>),
    Boolean(Sink<'a, bool>),
    Signed(Box<dyn FnMut(i64) -> Result<(), Mismatch> + 'a>),
    Unsigned(Box<dyn FnMut(Wide) -> Result<(), Mismatch> + 'a>),
    Float(Sink<'a, f64>),
}

/// Outcome of offering one event to a [`Storer`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Store {
    Captured,
    /// The event is not a value of this kind; nothing was written.
    WrongKind,
    Rejected(Mismatch),
}

/// A capture strategy bound to one target location.
pub(crate) struct Storer<'a> {
    capture: Capture<'a>,
    target: &'static str,
}

impl Storer<'_> {
    /// Short name of the Rust type values are converted to.
    pub(crate) fn target(&self) -> &'static str {
        self.target
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn store(&mut self, event: &Event<'_>, options: &ImportOptions) -> Store {
        let target = self.target;
        let result = match (&mut self.capture, *event) {
            (Capture::String(sink), Event::String(bytes)) => match core::str::from_utf8(bytes) {
                Ok(s) => {
                    sink(String::from(s));
                    Ok(())
                }
                Err(_) => Err(Mismatch::InvalidUtf8),
            },

            (Capture::Boolean(sink), Event::Bool(b)) => {
                sink(b);
                Ok(())
            }
            (Capture::Boolean(sink), Event::UnsignedInt(u)) if options.bool_from_unsigned => {
                sink(u != 0);
                Ok(())
            }

            (Capture::Signed(sink), Event::SignedInt(i)) => sink(i),
            (Capture::Signed(sink), Event::UnsignedInt(u)) => match i64::try_from(u) {
                Ok(i) => sink(i),
                Err(_) if u == u64::MAX && options.minus_one_sentinel => sink(-1),
                Err(_) => Err(out_of_range(u, target)),
            },

            (Capture::Unsigned(sink), Event::UnsignedInt(u)) => sink(Wide::Value(u)),
            (Capture::Unsigned(sink), Event::SignedInt(-1)) if options.minus_one_sentinel => {
                sink(Wide::Max)
            }
            (Capture::Unsigned(sink), Event::SignedInt(i)) => match u64::try_from(i) {
                Ok(u) => sink(Wide::Value(u)),
                Err(_) => Err(out_of_range(i, target)),
            },

            (Capture::Float(sink), Event::Double(d)) => {
                sink(d);
                Ok(())
            }
            (Capture::Float(sink), Event::SignedInt(i)) => {
                sink(i as f64);
                Ok(())
            }
            (Capture::Float(sink), Event::UnsignedInt(u)) => {
                sink(u as f64);
                Ok(())
            }

            _ => return Store::WrongKind,
        };

        match result {
            Ok(()) => Store::Captured,
            Err(mismatch) => Store::Rejected(mismatch),
        }
    }
}

fn out_of_range(value: impl fmt::Display, target: &'static str) -> Mismatch {
    Mismatch::OutOfRange {
        value: value.to_string(),
        target,
    }
}

fn string(sink: Sink<'_, String>) -> Storer<'_> {
    Storer {
        capture: Capture::String(sink),
        target: "String",
    }
}

fn boolean(sink: Sink<'_, bool>) -> Storer<'_> {
    Storer {
        capture: Capture::Boolean(sink),
        target: "bool",
    }
}

fn signed<F: SignedScalar>(mut sink: Sink<'_, F>) -> Storer<'_> {
    let target = short_type_name::<F>();
    Storer {
        capture: Capture::Signed(Box::new(move |value: i64| -> Result<(), Mismatch> {
            sink(F::from_i64(value).ok_or_else(|| out_of_range(value, target))?);
            Ok(())
        })),
        target,
    }
}

fn unsigned<F: UnsignedScalar>(mut sink: Sink<'_, F>) -> Storer<'_> {
    let target = short_type_name::<F>();
    Storer {
        capture: Capture::Unsigned(Box::new(move |value: Wide| -> Result<(), Mismatch> {
            let narrowed = match value {
                Wide::Value(u) => F::from_u64(u).ok_or_else(|| out_of_range(u, target))?,
                Wide::Max => F::MAX,
            };
            sink(narrowed);
            Ok(())
        })),
        target,
    }
}

fn float<F: FloatScalar>(mut sink: Sink<'_, F>) -> Storer<'_> {
    Storer {
        capture: Capture::Float(Box::new(move |value: f64| sink(F::from_f64(value)))),
        target: short_type_name::<F>(),
    }
}

/// `core::any::type_name` without the module path, e.g. `Person` for
/// `my_app::model::Person`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let head = full.find('<').map_or(full, |generics| &full[..generics]);
    head.rsplit("::").next().unwrap_or(head)
}

#[cfg(test)]
mod tests {
    use alloc::{format, rc::Rc, vec, vec::Vec};
    use core::cell::RefCell;

    use bstr::BStr;
    use rstest::rstest;

    use super::*;

    fn run<F: Clone + 'static>(kind: Kind<F>, event: Event<'_>, options: &ImportOptions) -> (Store, Vec<F>) {
        let seen = Rc::new(RefCell::new(Vec::<F>::new()));
        let sink_seen = Rc::clone(&seen);
        let mut storer = (kind.make)(Box::new(move |v: F| sink_seen.borrow_mut().push(v)));
        let store = storer.store(&event, options);
        let values = seen.borrow().clone();
        (store, values)
    }

    fn strict() -> ImportOptions {
        ImportOptions {
            minus_one_sentinel: false,
            bool_from_unsigned: false,
            ..ImportOptions::default()
        }
    }

    #[test]
    fn string_requires_utf8() {
        let opts = ImportOptions::default();
        assert_eq!(
            run(Kind::string(), Event::String(BStr::new("héllo")), &opts),
            (Store::Captured, vec!["héllo".to_string()])
        );
        assert_eq!(
            run(Kind::string(), Event::String(BStr::new(b"\xff")), &opts),
            (Store::Rejected(Mismatch::InvalidUtf8), vec![])
        );
        assert_eq!(
            run(Kind::string(), Event::UnsignedInt(1), &opts),
            (Store::WrongKind, vec![])
        );
    }

    #[rstest]
    #[case(Event::Bool(true), Store::Captured, vec![true])]
    #[case(Event::UnsignedInt(0), Store::Captured, vec![false])]
    #[case(Event::UnsignedInt(7), Store::Captured, vec![true])]
    #[case(Event::SignedInt(-1), Store::WrongKind, vec![])]
    #[case(Event::Null, Store::WrongKind, vec![])]
    fn boolean_acceptance(#[case] event: Event<'_>, #[case] store: Store, #[case] values: Vec<bool>) {
        assert_eq!(run(Kind::boolean(), event, &ImportOptions::default()), (store, values));
    }

    #[test]
    fn boolean_from_unsigned_can_be_disabled() {
        assert_eq!(
            run(Kind::boolean(), Event::UnsignedInt(1), &strict()),
            (Store::WrongKind, vec![])
        );
    }

    #[rstest]
    #[case(Event::SignedInt(-5), Store::Captured, vec![-5])]
    #[case(Event::UnsignedInt(5), Store::Captured, vec![5])]
    #[case(Event::UnsignedInt(u64::MAX), Store::Captured, vec![-1])]
    #[case(
        Event::UnsignedInt(1 << 63),
        Store::Rejected(out_of_range(1u64 << 63, "i64")),
        vec![]
    )]
    #[case(Event::Double(1.0), Store::WrongKind, vec![])]
    fn signed_acceptance(#[case] event: Event<'_>, #[case] store: Store, #[case] values: Vec<i64>) {
        assert_eq!(run(Kind::signed(), event, &ImportOptions::default()), (store, values));
    }

    #[test]
    fn signed_narrowing() {
        let opts = ImportOptions::default();
        assert_eq!(
            run(Kind::<i8>::signed(), Event::SignedInt(-129), &opts),
            (Store::Rejected(out_of_range(-129, "i8")), vec![])
        );
        assert_eq!(
            run(Kind::<i8>::signed(), Event::UnsignedInt(u64::MAX), &strict()),
            (Store::Rejected(out_of_range(u64::MAX, "i8")), vec![])
        );
    }

    #[rstest]
    #[case(Event::UnsignedInt(42), Store::Captured, vec![42])]
    #[case(Event::SignedInt(-1), Store::Captured, vec![u16::MAX])]
    #[case(Event::SignedInt(-2), Store::Rejected(out_of_range(-2, "u16")), vec![])]
    #[case(Event::UnsignedInt(70_000), Store::Rejected(out_of_range(70_000, "u16")), vec![])]
    #[case(Event::String(BStr::new("1")), Store::WrongKind, vec![])]
    fn unsigned_acceptance(#[case] event: Event<'_>, #[case] store: Store, #[case] values: Vec<u16>) {
        assert_eq!(run(Kind::unsigned(), event, &ImportOptions::default()), (store, values));
    }

    #[test]
    fn minus_one_can_be_disabled() {
        assert_eq!(
            run(Kind::<u32>::unsigned(), Event::SignedInt(-1), &strict()),
            (Store::Rejected(out_of_range(-1, "u32")), vec![])
        );
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn float_accepts_all_numbers() {
        let opts = ImportOptions::default();
        assert_eq!(run(Kind::<f64>::float(), Event::Double(0.5), &opts).1, vec![0.5]);
        assert_eq!(run(Kind::<f64>::float(), Event::SignedInt(-3), &opts).1, vec![-3.0]);
        assert_eq!(run(Kind::<f32>::float(), Event::UnsignedInt(3), &opts).1, vec![3.0]);
        assert_eq!(
            run(Kind::<f64>::float(), Event::Bool(true), &opts).0,
            Store::WrongKind
        );
    }

    #[test]
    fn short_names() {
        assert_eq!(short_type_name::<String>(), "String");
        assert_eq!(short_type_name::<u8>(), "u8");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec");
        assert_eq!(format!("{:?}", Kind::<u32>::unsigned()), "Kind(\"u32\")");
    }
}
