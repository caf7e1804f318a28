use std::fmt;
use std::num::{ParseFloatError, ParseIntError};

use aws_sdk_dynamodb::types::AttributeValue;
use thiserror::Error;

/// DynamoDB data type descriptor of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    S,
    N,
    B,
    Bool,
    Null,
    Ss,
    Ns,
    Bs,
    L,
    M,
    /// A variant added to the SDK after this crate was written.
    Unknown,
}

impl AttributeKind {
    /// Returns the kind of variant carried by `value`.
    pub fn of(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::S(_) => Self::S,
            AttributeValue::N(_) => Self::N,
            AttributeValue::B(_) => Self::B,
            AttributeValue::Bool(_) => Self::Bool,
            AttributeValue::Null(_) => Self::Null,
            AttributeValue::Ss(_) => Self::Ss,
            AttributeValue::Ns(_) => Self::Ns,
            AttributeValue::Bs(_) => Self::Bs,
            AttributeValue::L(_) => Self::L,
            AttributeValue::M(_) => Self::M,
            _ => Self::Unknown,
        }
    }

    /// Wire descriptor used by DynamoDB (`S`, `N`, `BOOL`, ...).
    pub fn descriptor(&self) -> &'static str {
        match self {
            Self::S => "S",
            Self::N => "N",
            Self::B => "B",
            Self::Bool => "BOOL",
            Self::Null => "NULL",
            Self::Ss => "SS",
            Self::Ns => "NS",
            Self::Bs => "BS",
            Self::L => "L",
            Self::M => "M",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor())
    }
}

/// Errors returned by the typed accessors in [`crate::ItemExt`].
///
/// Look-up errors (`KeyNotFound`, `VariantMismatch`) are kept apart from
/// conversion errors, which carry the raw value that failed to parse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    #[error("{expected} not found for key {key} (value is {found})")]
    VariantMismatch {
        key: String,
        expected: AttributeKind,
        found: AttributeKind,
    },

    #[error("value {value} is not a valid UUID: {source}")]
    InvalidUuid {
        value: String,
        #[source]
        source: uuid::Error,
    },

    #[error("value {value} is not a valid URL: {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("value {value} is not a valid datetime: {source}")]
    InvalidDateTime {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("value {value} is not a valid integer: {source}")]
    InvalidInteger {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("value {value} is not a valid float: {source}")]
    InvalidFloat {
        value: String,
        #[source]
        source: ParseFloatError,
    },
}

impl ItemError {
    /// True for errors raised before any parsing happened.
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. } | Self::VariantMismatch { .. })
    }

    /// The raw attribute value that failed to convert, if any.
    pub fn raw_value(&self) -> Option<&str> {
        match self {
            Self::KeyNotFound { .. } | Self::VariantMismatch { .. } => None,
            Self::InvalidUuid { value, .. }
            | Self::InvalidUrl { value, .. }
            | Self::InvalidDateTime { value, .. }
            | Self::InvalidInteger { value, .. }
            | Self::InvalidFloat { value, .. } => Some(value),
        }
    }
}

/// Result type for accessor operations.
pub type Result<T> = std::result::Result<T, ItemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_found_display() {
        let error = ItemError::KeyNotFound {
            key: "name".to_string(),
        };
        assert_eq!(error.to_string(), "key not found: name");
        assert!(error.is_lookup());
        assert_eq!(error.raw_value(), None);
    }

    #[test]
    fn test_variant_mismatch_display() {
        let error = ItemError::VariantMismatch {
            key: "fullName".to_string(),
            expected: AttributeKind::S,
            found: AttributeKind::Ss,
        };
        assert_eq!(
            error.to_string(),
            "S not found for key fullName (value is SS)"
        );
    }

    #[test]
    fn test_invalid_integer_keeps_raw_value() {
        let source = "abc".parse::<i64>().unwrap_err();
        let error = ItemError::InvalidInteger {
            value: "abc".to_string(),
            source,
        };
        assert!(!error.is_lookup());
        assert_eq!(error.raw_value(), Some("abc"));
        assert!(error.to_string().starts_with("value abc is not a valid integer"));
    }

    #[test]
    fn test_attribute_kind_of() {
        assert_eq!(
            AttributeKind::of(&AttributeValue::S("x".to_string())),
            AttributeKind::S
        );
        assert_eq!(
            AttributeKind::of(&AttributeValue::N("1".to_string())),
            AttributeKind::N
        );
        assert_eq!(
            AttributeKind::of(&AttributeValue::Bool(true)),
            AttributeKind::Bool
        );
        assert_eq!(
            AttributeKind::of(&AttributeValue::Null(true)),
            AttributeKind::Null
        );
        assert_eq!(
            AttributeKind::of(&AttributeValue::Ss(vec!["a".to_string()])),
            AttributeKind::Ss
        );
        assert_eq!(AttributeKind::of(&AttributeValue::L(vec![])), AttributeKind::L);
    }

    #[test]
    fn test_attribute_kind_descriptor() {
        assert_eq!(AttributeKind::Bool.to_string(), "BOOL");
        assert_eq!(AttributeKind::Ns.to_string(), "NS");
        assert_eq!(AttributeKind::M.descriptor(), "M");
    }
}
