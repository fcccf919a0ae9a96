//! Core type definitions with validation.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// Identifier of a media item (the unit annotations are grouped by).
    ItemId,
    "item_id"
);

define_string_id!(
    /// Canonical identifier of an annotator.
    AnnotatorId,
    "annotator_id"
);

impl AnnotatorId {
    /// Canonicalizes a scalar JSON value into an annotator ID.
    ///
    /// Spreadsheet exports often widen integer columns to floats, so `1.0`
    /// and `"1"` both map to `"1"`. Returns `None` for null, empty strings,
    /// and non-scalar values.
    pub fn from_scalar(value: &Value) -> Option<Self> {
        canonical_scalar(value).and_then(|s| Self::new(s).ok())
    }
}

/// Renders a scalar JSON value in canonical string form.
pub(crate) fn canonical_scalar(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                format_float(n.as_f64()?)
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if s.is_empty() { None } else { Some(s) }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn format_float(f: f64) -> String {
    // Integral floats inside the exactly-representable range print as integers.
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_reject_empty() {
        assert_eq!(
            AnnotatorId::new(""),
            Err(ValidationError::Empty {
                field: "annotator_id"
            })
        );
        assert!(ItemId::new("").is_err());
        assert_eq!(ItemId::new("x1").unwrap().as_str(), "x1");
    }

    #[test]
    fn annotator_from_numeric_scalars() {
        assert_eq!(AnnotatorId::from_scalar(&json!(1)).unwrap().as_str(), "1");
        assert_eq!(AnnotatorId::from_scalar(&json!(2.0)).unwrap().as_str(), "2");
        assert_eq!(
            AnnotatorId::from_scalar(&json!(2.5)).unwrap().as_str(),
            "2.5"
        );
    }

    #[test]
    fn annotator_from_string_is_trimmed() {
        assert_eq!(
            AnnotatorId::from_scalar(&json!(" 3 ")).unwrap().as_str(),
            "3"
        );
    }

    #[test]
    fn annotator_missing_values() {
        assert!(AnnotatorId::from_scalar(&json!(null)).is_none());
        assert!(AnnotatorId::from_scalar(&json!("   ")).is_none());
        assert!(AnnotatorId::from_scalar(&json!([1])).is_none());
        assert!(AnnotatorId::from_scalar(&json!({"a": 1})).is_none());
    }

    #[test]
    fn id_serde_rejects_empty() {
        let result: Result<AnnotatorId, _> = serde_json::from_str(r#""""#);
        assert!(result.is_err());
        let parsed: AnnotatorId = serde_json::from_str(r#""2""#).unwrap();
        assert_eq!(parsed.as_str(), "2");
    }
}
