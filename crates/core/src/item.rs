//! Typed accessors over DynamoDB attribute maps.
//!
//! Every accessor is a pure function over a borrowed [`Item`]. Parsing
//! accessors are built on top of the raw `S` / `N` accessors, so a missing key
//! or an unexpected variant is reported the same way everywhere, and only
//! then is the raw value converted.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::format::ParseErrorKind;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use url::Url;
use uuid::Uuid;

use crate::error::{AttributeKind, ItemError, Result};

/// A DynamoDB item as returned by `GetItem`, `Query` or `Scan`.
pub type Item = HashMap<String, AttributeValue>;

/// Layout used to parse a timestamp stored as an `S` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeLayout {
    /// `2019-10-27T19:36:33Z`
    Rfc3339,
    /// `Sun, 27 Oct 2019 19:36:33 +0000`
    Rfc2822,
    /// A chrono format string such as `%Y-%m-%d %H:%M:%S`.
    ///
    /// Values without an offset are read as UTC.
    Custom(String),
}

impl TimeLayout {
    pub fn custom(format: impl Into<String>) -> Self {
        Self::Custom(format.into())
    }

    /// Parses `value` according to this layout, normalised to UTC.
    pub fn parse(&self, value: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
        match self {
            Self::Rfc3339 => DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc)),
            Self::Rfc2822 => DateTime::parse_from_rfc2822(value).map(|dt| dt.with_timezone(&Utc)),
            Self::Custom(format) => parse_custom(value, format),
        }
    }
}

/// Formats with an offset specifier go through the offset-aware parser only.
/// Everything else is read as a naive datetime, falling back to a bare date
/// when the format carries no time fields.
fn parse_custom(
    value: &str,
    format: &str,
) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    if has_offset(format) {
        return DateTime::parse_from_str(value, format).map(|dt| dt.with_timezone(&Utc));
    }

    let datetime_err = match NaiveDateTime::parse_from_str(value, format) {
        Ok(naive) => return Ok(naive.and_utc()),
        Err(e) => e,
    };

    match NaiveDate::parse_from_str(value, format) {
        Ok(date) => Ok(date.and_time(NaiveTime::MIN).and_utc()),
        Err(date_err) if datetime_err.kind() == ParseErrorKind::NotEnough => Err(date_err),
        Err(_) => Err(datetime_err),
    }
}

fn has_offset(format: &str) -> bool {
    ["%z", ":z", "%#z", "%+"]
        .iter()
        .any(|spec| format.contains(spec))
}

/// Typed read access to the attributes of an [`Item`].
pub trait ItemExt {
    /// Returns the raw attribute stored under `key`.
    fn attribute(&self, key: &str) -> Result<&AttributeValue>;

    /// Returns the `S` value under `key`.
    fn s_as_string(&self, key: &str) -> Result<String>;

    /// Returns the `N` value under `key` as its decimal text.
    fn n_as_string(&self, key: &str) -> Result<String>;

    /// Returns the `S` value under `key`, or `None` when it is absent or holds
    /// another variant.
    fn optional_s(&self, key: &str) -> Option<String> {
        self.s_as_string(key).ok()
    }

    fn s_as_uuid(&self, key: &str) -> Result<Uuid> {
        let value = self.s_as_string(key)?;
        Uuid::parse_str(&value).map_err(|source| ItemError::InvalidUuid { value, source })
    }

    fn s_as_url(&self, key: &str) -> Result<Url> {
        let value = self.s_as_string(key)?;
        Url::parse(&value).map_err(|source| ItemError::InvalidUrl { value, source })
    }

    /// Parses the `S` value under `key` as a timestamp using `layout`.
    fn s_as_datetime(&self, key: &str, layout: &TimeLayout) -> Result<DateTime<Utc>> {
        let value = self.s_as_string(key)?;
        layout
            .parse(&value)
            .map_err(|source| ItemError::InvalidDateTime { value, source })
    }

    fn n_as_i32(&self, key: &str) -> Result<i32> {
        let value = self.n_as_string(key)?;
        value
            .parse()
            .map_err(|source| ItemError::InvalidInteger { value, source })
    }

    fn n_as_i64(&self, key: &str) -> Result<i64> {
        let value = self.n_as_string(key)?;
        value
            .parse()
            .map_err(|source| ItemError::InvalidInteger { value, source })
    }

    fn n_as_f64(&self, key: &str) -> Result<f64> {
        let value = self.n_as_string(key)?;
        value
            .parse()
            .map_err(|source| ItemError::InvalidFloat { value, source })
    }

    /// Returns the `BOOL` value under `key`.
    fn bool_value(&self, key: &str) -> Result<bool>;

    /// Returns the `SS` value under `key`.
    fn ss_as_strings(&self, key: &str) -> Result<Vec<String>>;
}

fn mismatch(key: &str, expected: AttributeKind, value: &AttributeValue) -> ItemError {
    ItemError::VariantMismatch {
        key: key.to_string(),
        expected,
        found: AttributeKind::of(value),
    }
}

impl ItemExt for Item {
    fn attribute(&self, key: &str) -> Result<&AttributeValue> {
        self.get(key).ok_or_else(|| ItemError::KeyNotFound {
            key: key.to_string(),
        })
    }

    fn s_as_string(&self, key: &str) -> Result<String> {
        match self.attribute(key)? {
            AttributeValue::S(s) => Ok(s.clone()),
            other => Err(mismatch(key, AttributeKind::S, other)),
        }
    }

    fn n_as_string(&self, key: &str) -> Result<String> {
        match self.attribute(key)? {
            AttributeValue::N(n) => Ok(n.clone()),
            other => Err(mismatch(key, AttributeKind::N, other)),
        }
    }

    fn bool_value(&self, key: &str) -> Result<bool> {
        match self.attribute(key)? {
            AttributeValue::Bool(b) => Ok(*b),
            other => Err(mismatch(key, AttributeKind::Bool, other)),
        }
    }

    fn ss_as_strings(&self, key: &str) -> Result<Vec<String>> {
        match self.attribute(key)? {
            AttributeValue::Ss(values) => Ok(values.clone()),
            other => Err(mismatch(key, AttributeKind::Ss, other)),
        }
    }
}
