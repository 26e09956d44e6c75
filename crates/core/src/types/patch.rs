//! Three-state sparse-patch field.
//!
//! Update bodies distinguish "field omitted" (leave the column alone) from
//! "field explicitly null" (clear the column) from "field set". A plain
//! `Option<T>` collapses the first two, so every update body uses
//! [`Patch<T>`] with `#[serde(default)]`:
//!
//! ```
//! use dragonfruit_core::Patch;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct UpdateBody {
//!     #[serde(default)]
//!     note: Patch<String>,
//! }
//!
//! let body: UpdateBody = serde_json::from_str(r#"{}"#).unwrap();
//! assert!(body.note.is_missing());
//!
//! let body: UpdateBody = serde_json::from_str(r#"{"note":null}"#).unwrap();
//! assert_eq!(body.note, Patch::Null);
//!
//! let body: UpdateBody = serde_json::from_str(r#"{"note":"hi"}"#).unwrap();
//! assert_eq!(body.note, Patch::Value("hi".into()));
//! ```

use serde::{Deserialize, Deserializer};

/// A field of a sparse update body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Field absent from the body; the column is left untouched.
    #[default]
    Missing,
    /// Field explicitly `null`; the column is cleared (where nullable).
    Null,
    /// Field present; the column is set to the value.
    Value(T),
}

impl<T> Patch<T> {
    /// Whether the field was omitted from the body.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Collapse into nested options: outer = "was the field present",
    /// inner = "is it non-null". The natural shape for nullable columns.
    #[must_use]
    pub fn into_nullable(self) -> Option<Option<T>> {
        match self {
            Self::Missing => None,
            Self::Null => Some(None),
            Self::Value(v) => Some(Some(v)),
        }
    }

    /// Borrow the inner value, if any.
    #[must_use]
    pub const fn as_ref(&self) -> Patch<&T> {
        match self {
            Self::Missing => Patch::Missing,
            Self::Null => Patch::Null,
            Self::Value(v) => Patch::Value(v),
        }
    }

    /// Map the inner value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Self::Missing => Patch::Missing,
            Self::Null => Patch::Null,
            Self::Value(v) => Patch::Value(f(v)),
        }
    }
}

// Deserialization piggybacks on Option: a present-but-null field yields
// `None` from Option, which maps to `Patch::Null`. The `Missing` state is
// produced by `#[serde(default)]` on the containing struct field, never by
// this impl.
impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|opt| opt.map_or(Self::Null, Self::Value))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default)]
        nickname: Patch<String>,
        #[serde(default)]
        phone: Patch<String>,
    }

    #[test]
    fn test_missing_null_and_value_are_distinct() {
        let body: Body =
            serde_json::from_str(r#"{"nickname": "dragon", "phone": null}"#).unwrap();
        assert_eq!(body.nickname, Patch::Value("dragon".to_owned()));
        assert_eq!(body.phone, Patch::Null);

        let body: Body = serde_json::from_str(r#"{}"#).unwrap();
        assert!(body.nickname.is_missing());
        assert!(body.phone.is_missing());
    }

    #[test]
    fn test_into_nullable() {
        assert_eq!(Patch::<i32>::Missing.into_nullable(), None);
        assert_eq!(Patch::<i32>::Null.into_nullable(), Some(None));
        assert_eq!(Patch::Value(7).into_nullable(), Some(Some(7)));
    }
}
