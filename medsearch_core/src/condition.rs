//! Typed search conditions and their translation into predicates.
//!
//! A [`Condition`] is an immutable `(field, operator, value)` triple. The value
//! variant decides which operators are legal and how each one is expressed as
//! a [`Predicate`]. Negative string and GUID filters include entities whose
//! field is null: "not X" keeps rows with missing data in the result.

use std::fmt;

use chrono::NaiveDateTime;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::field::Field;
use crate::operator::{ComparisonOp, SearchOperator, TextOp};
use crate::predicate::{FieldOperand, Predicate};
use crate::value::{parse_boolean, ScalarValue, ValueKind, EMPTY_SENTINEL, NULL_SENTINEL};

/// The comparison operand of a condition; the variant is the value kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionValue {
    Boolean(bool),
    /// Compared at calendar-date granularity.
    Date(NaiveDateTime),
    DateTime(NaiveDateTime),
    Guid(Option<Uuid>),
    String(String),
}

impl ConditionValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ConditionValue::Boolean(_) => ValueKind::Boolean,
            ConditionValue::Date(_) => ValueKind::Date,
            ConditionValue::DateTime(_) => ValueKind::DateTime,
            ConditionValue::Guid(_) => ValueKind::Guid,
            ConditionValue::String(_) => ValueKind::String,
        }
    }
}

/// An immutable search condition over entities of type `T`.
pub struct Condition<T> {
    field: Field<T>,
    operator: SearchOperator,
    value: ConditionValue,
}

impl<T> Condition<T> {
    pub fn new(field: Field<T>, operator: SearchOperator, value: ConditionValue) -> Self {
        Self {
            field,
            operator,
            value,
        }
    }

    pub fn boolean(field: Field<T>, operator: SearchOperator, value: bool) -> Self {
        Self::new(field, operator, ConditionValue::Boolean(value))
    }

    /// Builds a boolean condition from the value's external text form.
    pub fn parse_boolean(field: Field<T>, operator: SearchOperator, raw: &str) -> Result<Self> {
        Ok(Self::boolean(field, operator, parse_boolean(raw)?))
    }

    pub fn date(field: Field<T>, operator: SearchOperator, value: NaiveDateTime) -> Self {
        Self::new(field, operator, ConditionValue::Date(value))
    }

    pub fn date_time(field: Field<T>, operator: SearchOperator, value: NaiveDateTime) -> Self {
        Self::new(field, operator, ConditionValue::DateTime(value))
    }

    pub fn guid(field: Field<T>, operator: SearchOperator, value: Option<Uuid>) -> Self {
        Self::new(field, operator, ConditionValue::Guid(value))
    }

    pub fn string<S>(field: Field<T>, operator: SearchOperator, value: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(field, operator, ConditionValue::String(value.into()))
    }

    pub fn field(&self) -> &Field<T> {
        &self.field
    }

    pub fn operator(&self) -> SearchOperator {
        self.operator
    }

    pub fn value(&self) -> &ConditionValue {
        &self.value
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// Builds the predicate this condition stands for.
    ///
    /// Every call yields a fresh, logically equivalent tree. Fails with
    /// [`Error::UnsupportedOperator`] when the operator is not legal for the
    /// value kind.
    pub fn predicate(&self) -> Result<Predicate<T>> {
        let kind = self.kind();
        if !kind.supports(self.operator) {
            debug!(
                field = self.field.name(),
                %kind,
                operator = %self.operator,
                "rejecting unsupported operator"
            );
            return Err(Error::UnsupportedOperator {
                kind,
                operator: self.operator,
            });
        }

        let predicate = match &self.value {
            ConditionValue::Boolean(v) => self.compare(false, ScalarValue::Boolean(*v))?,
            ConditionValue::Date(v) => self.compare(true, ScalarValue::Date(v.date()))?,
            ConditionValue::DateTime(v) => self.compare(false, ScalarValue::DateTime(*v))?,
            ConditionValue::Guid(v) => self.guid_predicate(*v),
            ConditionValue::String(v) => self.string_predicate(v)?,
        };
        trace!(field = self.field.name(), %predicate, "built predicate");
        Ok(predicate)
    }

    /// Returns the predicate as a plain closure over `T`.
    pub fn to_fn(&self) -> Result<impl Fn(&T) -> bool> {
        self.predicate().map(Predicate::into_fn)
    }

    fn compare(&self, date_only: bool, literal: ScalarValue) -> Result<Predicate<T>> {
        let operand = if date_only {
            FieldOperand::date_of(self.field.clone())
        } else {
            FieldOperand::field(self.field.clone())
        };
        let op = match self.operator {
            SearchOperator::Equals => ComparisonOp::Equal,
            SearchOperator::NotEquals => ComparisonOp::NotEqual,
            SearchOperator::LessThan => ComparisonOp::LessThan,
            SearchOperator::GreaterThan => ComparisonOp::GreaterThan,
            operator => return Err(self.unsupported(operator)),
        };
        Ok(Predicate::compare(operand, op, literal))
    }

    fn guid_predicate(&self, value: Option<Uuid>) -> Predicate<T> {
        let field = self.field.clone();
        match (self.operator, value) {
            (SearchOperator::NotEquals, Some(g)) => Predicate::or([
                Predicate::compare(
                    FieldOperand::field(field.clone()),
                    ComparisonOp::NotEqual,
                    ScalarValue::Guid(g),
                ),
                Predicate::is_null(field),
            ]),
            (SearchOperator::NotEquals, None) => Predicate::is_not_null(field),
            (_, Some(g)) => Predicate::compare(
                FieldOperand::field(field),
                ComparisonOp::Equal,
                ScalarValue::Guid(g),
            ),
            (_, None) => Predicate::is_null(field),
        }
    }

    fn string_predicate(&self, value: &str) -> Result<Predicate<T>> {
        let field = self.field.clone();
        let predicate = match self.operator {
            SearchOperator::Equals if value == EMPTY_SENTINEL => Predicate::compare(
                FieldOperand::field(field),
                ComparisonOp::Equal,
                ScalarValue::Text(String::new()),
            ),
            SearchOperator::Equals if value == NULL_SENTINEL => Predicate::is_null(field),
            SearchOperator::Equals => Predicate::compare(
                FieldOperand::field(field),
                ComparisonOp::Equal,
                ScalarValue::Text(value.to_string()),
            ),
            SearchOperator::NotEquals => Predicate::or([
                Predicate::compare(
                    FieldOperand::field(field.clone()),
                    ComparisonOp::NotEqual,
                    ScalarValue::Text(value.to_string()),
                ),
                Predicate::is_null(field),
            ]),
            SearchOperator::NotContains => Predicate::or([
                Predicate::text(field.clone(), TextOp::Contains, value).negate(),
                Predicate::is_null(field),
            ]),
            SearchOperator::Contains => Predicate::text(field, TextOp::Contains, value),
            SearchOperator::StartsWith => Predicate::text(field, TextOp::StartsWith, value),
            SearchOperator::EndsWith => Predicate::text(field, TextOp::EndsWith, value),
            operator => return Err(self.unsupported(operator)),
        };
        Ok(predicate)
    }

    fn unsupported(&self, operator: SearchOperator) -> Error {
        Error::UnsupportedOperator {
            kind: self.kind(),
            operator,
        }
    }
}

impl<T> Clone for Condition<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            operator: self.operator,
            value: self.value.clone(),
        }
    }
}

impl<T> fmt::Debug for Condition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("field", &self.field)
            .field("operator", &self.operator)
            .field("value", &self.value)
            .finish()
    }
}
