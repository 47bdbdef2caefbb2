use alloc::string::String;

/// Configuration for a single import.
///
/// The defaults accept documents written by tools that annotate JSON with
/// comment members and encode "unset" unsigned values as `-1`.
///
/// # Examples
///
/// ```rust
/// use jsonbind::{ImportOptions, Sentinel};
///
/// let strict = ImportOptions {
///     sentinel: Sentinel::disabled(),
///     minus_one_sentinel: false,
///     bool_from_unsigned: false,
/// };
/// assert!(!strict.sentinel.matches(b"_"));
/// assert!(ImportOptions::default().sentinel.matches(b"?note"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ImportOptions {
    /// Which object keys count as comments.
    ///
    /// The value of a comment key is skipped whatever its shape, in objects
    /// and in maps alike. A key that the schema binds is never treated as a
    /// comment.
    ///
    /// # Default
    ///
    /// `"_"` and any key starting or ending with `'?'`
    pub sentinel: Sentinel,

    /// Whether `-1` stands for "maximum" in unsigned fields.
    ///
    /// When `true`, `-1` stored into an unsigned field yields the type's
    /// `MAX`, and `18446744073709551615` stored into a signed field yields
    /// `-1`. Any other negative number in an unsigned field is out of range
    /// regardless of this option.
    ///
    /// # Default
    ///
    /// `true`
    pub minus_one_sentinel: bool,

    /// Whether boolean fields accept non-negative integers.
    ///
    /// `0` is stored as `false`, anything else as `true`.
    ///
    /// # Default
    ///
    /// `true`
    pub bool_from_unsigned: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            sentinel: Sentinel::default(),
            minus_one_sentinel: true,
            bool_from_unsigned: true,
        }
    }
}

/// Predicate selecting comment keys.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Sentinel {
    /// A key equal to this string is a comment.
    pub marker: Option<String>,
    /// A key beginning or ending with this character is a comment.
    pub marker_char: Option<char>,
}

impl Default for Sentinel {
    fn default() -> Self {
        Self {
            marker: Some(String::from("_")),
            marker_char: Some('?'),
        }
    }
}

impl Sentinel {
    /// A predicate that matches no key.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            marker: None,
            marker_char: None,
        }
    }

    /// Returns `true` if `key` should be skipped as a comment.
    #[must_use]
    pub fn matches(&self, key: &[u8]) -> bool {
        if self.marker.as_deref().is_some_and(|m| m.as_bytes() == key) {
            return true;
        }
        let Some(c) = self.marker_char else {
            return false;
        };
        let mut buf = [0; 4];
        let c = c.encode_utf8(&mut buf).as_bytes();
        !key.is_empty() && (key.starts_with(c) || key.ends_with(c))
    }
}
