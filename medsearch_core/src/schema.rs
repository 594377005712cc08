//! Named fields of an entity and the textual criteria that refer to them.
//!
//! Search screens send criteria as plain text (`field`, `operator`, `value`).
//! A [`Schema`] knows the value kind and accessor behind each field name and
//! turns such text into typed [`Condition`]s.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::condition::Condition;
use crate::criteria::{Combine, SearchCriteria, SearchOptions};
use crate::error::{Error, Result};
use crate::field::{Accessor, Field};
use crate::operator::SearchOperator;
use crate::value::{parse_boolean, parse_date_time, parse_guid, ValueKind};

/// One criterion as sent by a search screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionSpec {
    pub field: String,
    pub operator: SearchOperator,
    #[serde(default)]
    pub value: String,
}

impl CriterionSpec {
    pub fn new<F, V>(field: F, operator: SearchOperator, value: V) -> Self
    where
        F: Into<String>,
        V: Into<String>,
    {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

impl FromStr for CriterionSpec {
    type Err = Error;

    /// Parses `field:operator:value`. Only the first two colons split, so the
    /// value may itself contain colons (timestamps do).
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(field), Some(operator), Some(value)) if !field.trim().is_empty() => {
                Ok(Self::new(field.trim(), operator.parse()?, value))
            }
            _ => Err(Error::InvalidCriterion(s.to_string())),
        }
    }
}

/// A JSON criteria document, e.g.
/// `{"combine": "all", "criteria": [{"field": "name", "operator": "Contains", "value": "mor"}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaDocument {
    #[serde(default)]
    pub combine: Combine,
    #[serde(default)]
    pub criteria: Vec<CriterionSpec>,
}

impl CriteriaDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            combine: self.combine,
        }
    }
}

struct SchemaField<T> {
    kind: ValueKind,
    field: Field<T>,
}

/// Registry of the searchable fields of `T`.
pub struct Schema<T> {
    fields: BTreeMap<Arc<str>, SchemaField<T>>,
}

impl<T> Schema<T> {
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Registers a field, replacing any earlier field of the same name.
    pub fn with_field<N>(mut self, name: N, kind: ValueKind, read: Accessor<T>) -> Self
    where
        N: Into<Arc<str>>,
    {
        self.insert(name, kind, read);
        self
    }

    pub fn insert<N>(&mut self, name: N, kind: ValueKind, read: Accessor<T>)
    where
        N: Into<Arc<str>>,
    {
        let name = name.into();
        let field = Field::new(Arc::clone(&name), read);
        self.fields.insert(name, SchemaField { kind, field });
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<(ValueKind, &Field<T>)> {
        self.fields.get(name).map(|f| (f.kind, &f.field))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.keys().map(|name| name.as_ref())
    }

    /// Builds the typed condition a textual criterion describes.
    ///
    /// The operator is not checked here; an operator the field's kind does
    /// not support surfaces when the condition's predicate is built.
    pub fn condition(&self, spec: &CriterionSpec) -> Result<Condition<T>> {
        let Some((kind, field)) = self.field(&spec.field) else {
            debug!(field = %spec.field, "criterion refers to unknown field");
            return Err(Error::UnknownField(spec.field.clone()));
        };
        let field = field.clone();
        let raw = spec.value.as_str();
        let condition = match kind {
            ValueKind::Boolean => Condition::boolean(field, spec.operator, parse_boolean(raw)?),
            ValueKind::Date => Condition::date(field, spec.operator, parse_date_time(kind, raw)?),
            ValueKind::DateTime => {
                Condition::date_time(field, spec.operator, parse_date_time(kind, raw)?)
            }
            ValueKind::Guid => Condition::guid(field, spec.operator, parse_guid(raw)?),
            ValueKind::String => Condition::string(field, spec.operator, raw),
        };
        Ok(condition)
    }

    /// Builds a flat composite from textual criteria, in order.
    pub fn criteria<'a, I>(&self, specs: I) -> Result<SearchCriteria<T>>
    where
        I: IntoIterator<Item = &'a CriterionSpec>,
    {
        let mut criteria = SearchCriteria::new();
        for spec in specs {
            criteria.push(self.condition(spec)?)?;
        }
        Ok(criteria)
    }

    pub fn document(&self, document: &CriteriaDocument) -> Result<SearchCriteria<T>> {
        self.criteria(&document.criteria)
    }
}

impl<T> Default for Schema<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionValue;
    use chrono::NaiveDate;
    use uuid::Uuid;

    struct Facility {
        name: String,
        region_id: Option<Uuid>,
        active: bool,
    }

    fn schema() -> Schema<Facility> {
        Schema::new()
            .with_field("name", ValueKind::String, |f: &Facility| f.name.as_str().into())
            .with_field("region_id", ValueKind::Guid, |f: &Facility| f.region_id.into())
            .with_field("active", ValueKind::Boolean, |f: &Facility| f.active.into())
            .with_field("opened", ValueKind::Date, |_: &Facility| {
                NaiveDate::from_ymd_opt(2020, 1, 1).into()
            })
    }

    #[test]
    fn test_parse_criterion_spec() {
        let spec: CriterionSpec = "opened:gt:2024-03-01T15:30:00".parse().unwrap();
        assert_eq!(
            spec,
            CriterionSpec::new("opened", SearchOperator::GreaterThan, "2024-03-01T15:30:00")
        );
        let spec: CriterionSpec = "name:Equals:".parse().unwrap();
        assert_eq!(spec.value, "");

        assert!(matches!(
            "name".parse::<CriterionSpec>(),
            Err(Error::InvalidCriterion(_))
        ));
        assert!(matches!(
            ":eq:x".parse::<CriterionSpec>(),
            Err(Error::InvalidCriterion(_))
        ));
        assert!(matches!(
            "name:like:x".parse::<CriterionSpec>(),
            Err(Error::UnknownOperator(_))
        ));
    }

    #[test]
    fn test_condition_from_spec_uses_field_kind() {
        let schema = schema();
        let condition = schema
            .condition(&CriterionSpec::new("active", SearchOperator::Equals, "True"))
            .unwrap();
        assert_eq!(condition.value(), &ConditionValue::Boolean(true));

        let condition = schema
            .condition(&CriterionSpec::new("region_id", SearchOperator::NotEquals, ""))
            .unwrap();
        assert_eq!(condition.value(), &ConditionValue::Guid(None));

        let condition = schema
            .condition(&CriterionSpec::new("opened", SearchOperator::LessThan, "2021-06-30"))
            .unwrap();
        assert_eq!(condition.kind(), ValueKind::Date);
    }

    #[test]
    fn test_condition_from_spec_errors() {
        let schema = schema();
        assert!(matches!(
            schema.condition(&CriterionSpec::new("zone", SearchOperator::Equals, "a")),
            Err(Error::UnknownField(name)) if name == "zone"
        ));
        assert!(matches!(
            schema.condition(&CriterionSpec::new("active", SearchOperator::Equals, "maybe")),
            Err(Error::InvalidValue {
                kind: ValueKind::Boolean,
                ..
            })
        ));
        assert!(matches!(
            schema.condition(&CriterionSpec::new("region_id", SearchOperator::Equals, "42")),
            Err(Error::InvalidValue {
                kind: ValueKind::Guid,
                ..
            })
        ));
    }

    #[test]
    fn test_document_from_json() {
        let json = r#"{
            "combine": "any",
            "criteria": [
                {"field": "name", "operator": "StartsWith", "value": "North"},
                {"field": "active", "operator": "Equals", "value": "false"}
            ]
        }"#;
        let document = CriteriaDocument::from_json(json).unwrap();
        assert_eq!(document.options().combine, Combine::Any);

        let criteria = schema().document(&document).unwrap();
        assert_eq!(criteria.len(), 2);
        let predicate = criteria.predicate(document.options()).unwrap().unwrap();
        let facility = Facility {
            name: "South wing".to_string(),
            region_id: None,
            active: false,
        };
        assert!(predicate.matches(&facility));

        assert!(matches!(
            CriteriaDocument::from_json("{\"criteria\": 3}"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_field_names_are_sorted() {
        let schema = schema();
        let names: Vec<_> = schema.field_names().collect();
        assert_eq!(names, vec!["active", "name", "opened", "region_id"]);
    }
}
