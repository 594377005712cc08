use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::operator::SearchOperator;

/// Sentinel a search screen sends to ask for fields equal to the empty string.
pub const EMPTY_SENTINEL: &str = "=<empty>";
/// Sentinel a search screen sends to ask for fields that are null.
pub const NULL_SENTINEL: &str = "=<null>";

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// The value kind of a condition. Each kind supports its own operator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Boolean,
    Date,
    DateTime,
    Guid,
    String,
}

impl ValueKind {
    /// Operators a condition of this kind can turn into a predicate.
    pub fn supported_operators(self) -> &'static [SearchOperator] {
        use SearchOperator::*;
        match self {
            ValueKind::Boolean | ValueKind::Guid => &[Equals, NotEquals],
            ValueKind::Date | ValueKind::DateTime => &[Equals, NotEquals, LessThan, GreaterThan],
            ValueKind::String => &[
                StartsWith,
                Contains,
                EndsWith,
                NotContains,
                Equals,
                NotEquals,
            ],
        }
    }

    pub fn supports(self, operator: SearchOperator) -> bool {
        self.supported_operators().contains(&operator)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Boolean => "Boolean",
            ValueKind::Date => "Date",
            ValueKind::DateTime => "DateTime",
            ValueKind::Guid => "Guid",
            ValueKind::String => "String",
        })
    }
}

/// Borrowed view over the value of one entity field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Null,
    Boolean(bool),
    DateTime(NaiveDateTime),
    Guid(Uuid),
    Text(&'a str),
}

impl FieldValue<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<bool> for FieldValue<'_> {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<NaiveDateTime> for FieldValue<'_> {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::DateTime(value)
    }
}

impl From<NaiveDate> for FieldValue<'_> {
    fn from(value: NaiveDate) -> Self {
        FieldValue::DateTime(value.and_time(NaiveTime::MIN))
    }
}

impl From<DateTime<Utc>> for FieldValue<'_> {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value.naive_utc())
    }
}

impl From<Uuid> for FieldValue<'_> {
    fn from(value: Uuid) -> Self {
        FieldValue::Guid(value)
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(value: &'a str) -> Self {
        FieldValue::Text(value)
    }
}

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(value: &'a String) -> Self {
        FieldValue::Text(value.as_str())
    }
}

impl<'a, V> From<Option<V>> for FieldValue<'a>
where
    V: Into<FieldValue<'a>>,
{
    fn from(value: Option<V>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Owned literal stored inside predicate nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Guid(Uuid),
    Text(String),
}

impl ScalarValue {
    /// Orders a field value against this literal.
    ///
    /// Returns `None` when either side is null or the kinds do not line up,
    /// which predicate evaluation treats as SQL `UNKNOWN`. With `date_only`
    /// the field's time of day is dropped before comparing.
    pub fn compare_field(&self, field: FieldValue<'_>, date_only: bool) -> Option<Ordering> {
        match (field, self) {
            (FieldValue::Null, _) | (_, ScalarValue::Null) => None,
            (FieldValue::Boolean(lhs), ScalarValue::Boolean(rhs)) => Some(lhs.cmp(rhs)),
            (FieldValue::DateTime(lhs), ScalarValue::Date(rhs)) => Some(lhs.date().cmp(rhs)),
            (FieldValue::DateTime(lhs), ScalarValue::DateTime(rhs)) => {
                if date_only {
                    Some(lhs.date().cmp(&rhs.date()))
                } else {
                    Some(lhs.cmp(rhs))
                }
            }
            (FieldValue::Guid(lhs), ScalarValue::Guid(rhs)) => Some(lhs.cmp(rhs)),
            (FieldValue::Text(lhs), ScalarValue::Text(rhs)) => Some(lhs.cmp(rhs.as_str())),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    /// Renders the literal as SQL text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => f.write_str("NULL"),
            ScalarValue::Boolean(true) => f.write_str("TRUE"),
            ScalarValue::Boolean(false) => f.write_str("FALSE"),
            ScalarValue::Date(d) => write!(f, "'{}'", d.format(DATE_FORMAT)),
            ScalarValue::DateTime(dt) => write!(f, "'{}'", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            ScalarValue::Guid(g) => write!(f, "'{}'", g.hyphenated()),
            ScalarValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

/// Parses the external text form of a boolean (`true`/`false`, any case).
pub fn parse_boolean(raw: &str) -> Result<bool> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(invalid(ValueKind::Boolean, raw, "expected true or false"))
    }
}

/// Parses a timestamp for a `Date` or `DateTime` condition.
///
/// RFC 3339 input is converted to UTC. A bare date means midnight.
pub fn parse_date_time(kind: ValueKind, raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_utc());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|e| invalid(kind, raw, &e.to_string()))
}

/// Parses a GUID. The empty string and the null sentinel mean no value.
pub fn parse_guid(raw: &str) -> Result<Option<Uuid>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == NULL_SENTINEL {
        return Ok(None);
    }
    Uuid::parse_str(trimmed)
        .map(Some)
        .map_err(|e| invalid(ValueKind::Guid, raw, &e.to_string()))
}

fn invalid(kind: ValueKind, raw: &str, reason: &str) -> Error {
    Error::InvalidValue {
        kind,
        value: raw.to_string(),
        reason: reason.to_string(),
    }
}
