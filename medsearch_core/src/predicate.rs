//! Interpreted boolean predicates over entities.
//!
//! Evaluation follows SQL three-valued logic: comparing against a null field
//! yields `UNKNOWN`, `NOT UNKNOWN` stays `UNKNOWN`, and an entity only passes
//! a filter when the whole tree evaluates to `TRUE`. The `Display` impl
//! renders the same tree as a SQL `WHERE` fragment.

use std::fmt;

use crate::field::Field;
use crate::operator::{ComparisonOp, TextOp};
use crate::value::{FieldValue, ScalarValue};

const LIKE_ESCAPE: char = '\\';

/// Left-hand side of a comparison: a field, optionally cut to its date part.
pub struct FieldOperand<T> {
    field: Field<T>,
    date_only: bool,
}

impl<T> FieldOperand<T> {
    pub fn field(field: Field<T>) -> Self {
        Self {
            field,
            date_only: false,
        }
    }

    /// The field truncated to calendar-date granularity.
    pub fn date_of(field: Field<T>) -> Self {
        Self {
            field,
            date_only: true,
        }
    }
}

impl<T> Clone for FieldOperand<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            date_only: self.date_only,
        }
    }
}

impl<T> fmt::Display for FieldOperand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.date_only {
            write!(f, "CAST({} AS DATE)", self.field)
        } else {
            write!(f, "{}", self.field)
        }
    }
}

/// Recursive predicate node; leaf and branch variants coexist.
pub enum PredicateNode<T> {
    /// Always-true literal; matches every entity.
    True,
    /// Binary comparison against a literal.
    Compare {
        operand: FieldOperand<T>,
        op: ComparisonOp,
        value: ScalarValue,
    },
    /// Substring match against a literal pattern.
    Text {
        field: Field<T>,
        op: TextOp,
        pattern: String,
    },
    /// Null check (`IS NULL` / `IS NOT NULL`).
    IsNull { field: Field<T>, negated: bool },
    Not(Box<Predicate<T>>),
    And(Vec<Predicate<T>>),
    Or(Vec<Predicate<T>>),
}

impl<T> Clone for PredicateNode<T> {
    fn clone(&self) -> Self {
        match self {
            PredicateNode::True => PredicateNode::True,
            PredicateNode::Compare { operand, op, value } => PredicateNode::Compare {
                operand: operand.clone(),
                op: *op,
                value: value.clone(),
            },
            PredicateNode::Text { field, op, pattern } => PredicateNode::Text {
                field: field.clone(),
                op: *op,
                pattern: pattern.clone(),
            },
            PredicateNode::IsNull { field, negated } => PredicateNode::IsNull {
                field: field.clone(),
                negated: *negated,
            },
            PredicateNode::Not(inner) => PredicateNode::Not(inner.clone()),
            PredicateNode::And(clauses) => PredicateNode::And(clauses.clone()),
            PredicateNode::Or(clauses) => PredicateNode::Or(clauses.clone()),
        }
    }
}

/// Boolean expression over entities of type `T`.
pub struct Predicate<T> {
    kind: PredicateNode<T>,
}

impl<T> Predicate<T> {
    /// Returns a reference to the underlying node.
    pub fn kind(&self) -> &PredicateNode<T> {
        &self.kind
    }

    pub fn always() -> Self {
        Self::from_kind(PredicateNode::True)
    }

    pub fn compare(operand: FieldOperand<T>, op: ComparisonOp, value: ScalarValue) -> Self {
        Self::from_kind(PredicateNode::Compare { operand, op, value })
    }

    pub fn text<S>(field: Field<T>, op: TextOp, pattern: S) -> Self
    where
        S: Into<String>,
    {
        Self::from_kind(PredicateNode::Text {
            field,
            op,
            pattern: pattern.into(),
        })
    }

    pub fn is_null(field: Field<T>) -> Self {
        Self::from_kind(PredicateNode::IsNull {
            field,
            negated: false,
        })
    }

    pub fn is_not_null(field: Field<T>) -> Self {
        Self::from_kind(PredicateNode::IsNull {
            field,
            negated: true,
        })
    }

    /// Builds a conjunction, flattening nested conjunctions.
    ///
    /// An empty conjunction is [`Predicate::always`].
    pub fn and<I>(clauses: I) -> Self
    where
        I: IntoIterator<Item = Predicate<T>>,
    {
        let mut acc = Vec::new();
        for clause in clauses {
            match clause.into_kind() {
                PredicateNode::And(mut nested) => acc.append(&mut nested),
                other => acc.push(Predicate::from_kind(other)),
            }
        }
        match acc.len() {
            0 => Self::always(),
            1 => acc.remove(0),
            _ => Self::from_kind(PredicateNode::And(acc)),
        }
    }

    /// Builds a disjunction, flattening nested disjunctions.
    ///
    /// An empty disjunction matches nothing.
    pub fn or<I>(clauses: I) -> Self
    where
        I: IntoIterator<Item = Predicate<T>>,
    {
        let mut acc = Vec::new();
        for clause in clauses {
            match clause.into_kind() {
                PredicateNode::Or(mut nested) => acc.append(&mut nested),
                other => acc.push(Predicate::from_kind(other)),
            }
        }
        match acc.len() {
            0 => Self::always().negate(),
            1 => acc.remove(0),
            _ => Self::from_kind(PredicateNode::Or(acc)),
        }
    }

    /// Builds a conjunction from the supplied predicates, if any are provided.
    pub fn conjunction(predicates: Vec<Predicate<T>>) -> Option<Predicate<T>> {
        if predicates.is_empty() {
            None
        } else {
            Some(Predicate::and(predicates).simplify())
        }
    }

    /// Builds a disjunction from the supplied predicates, if any are provided.
    pub fn disjunction(predicates: Vec<Predicate<T>>) -> Option<Predicate<T>> {
        if predicates.is_empty() {
            None
        } else {
            Some(Predicate::or(predicates).simplify())
        }
    }

    /// Returns the logical negation of this predicate.
    ///
    /// Equality flips to inequality and null checks flip their sense; both
    /// rewrites hold under three-valued logic. Everything else is wrapped.
    pub fn negate(self) -> Self {
        match self.kind {
            PredicateNode::Not(inner) => *inner,
            PredicateNode::IsNull { field, negated } => Self::from_kind(PredicateNode::IsNull {
                field,
                negated: !negated,
            }),
            PredicateNode::Compare {
                operand,
                op: op @ (ComparisonOp::Equal | ComparisonOp::NotEqual),
                value,
            } => {
                let op = if op == ComparisonOp::Equal {
                    ComparisonOp::NotEqual
                } else {
                    ComparisonOp::Equal
                };
                Self::compare(operand, op, value)
            }
            kind => Self::from_kind(PredicateNode::Not(Box::new(Self::from_kind(kind)))),
        }
    }

    /// Applies simple simplification rules to reduce nesting.
    pub fn simplify(self) -> Self {
        match self.kind {
            PredicateNode::True
            | PredicateNode::Compare { .. }
            | PredicateNode::Text { .. }
            | PredicateNode::IsNull { .. } => self,
            PredicateNode::Not(inner) => match inner.simplify().into_kind() {
                PredicateNode::Not(grandchild) => *grandchild,
                other => Self::from_kind(PredicateNode::Not(Box::new(Self::from_kind(other)))),
            },
            PredicateNode::And(clauses) => {
                let clauses: Vec<_> = clauses
                    .into_iter()
                    .map(Predicate::simplify)
                    .filter(|p| !matches!(p.kind, PredicateNode::True))
                    .collect();
                Predicate::and(clauses)
            }
            PredicateNode::Or(clauses) => {
                let clauses: Vec<_> = clauses.into_iter().map(Predicate::simplify).collect();
                if clauses
                    .iter()
                    .any(|p| matches!(p.kind, PredicateNode::True))
                {
                    Self::always()
                } else {
                    Predicate::or(clauses)
                }
            }
        }
    }

    /// Evaluates the predicate; `None` is SQL `UNKNOWN`.
    pub fn evaluate(&self, entity: &T) -> Option<bool> {
        match &self.kind {
            PredicateNode::True => Some(true),
            PredicateNode::Compare { operand, op, value } => value
                .compare_field(operand.field.read(entity), operand.date_only)
                .map(|ordering| op.test_ordering(ordering)),
            PredicateNode::Text { field, op, pattern } => match field.read(entity) {
                FieldValue::Text(text) => Some(op.test(text, pattern)),
                _ => None,
            },
            PredicateNode::IsNull { field, negated } => {
                Some(field.read(entity).is_null() != *negated)
            }
            PredicateNode::Not(inner) => inner.evaluate(entity).map(|b| !b),
            PredicateNode::And(clauses) => {
                let mut unknown = false;
                for clause in clauses {
                    match clause.evaluate(entity) {
                        Some(false) => return Some(false),
                        None => unknown = true,
                        Some(true) => {}
                    }
                }
                if unknown {
                    None
                } else {
                    Some(true)
                }
            }
            PredicateNode::Or(clauses) => {
                let mut unknown = false;
                for clause in clauses {
                    match clause.evaluate(entity) {
                        Some(true) => return Some(true),
                        None => unknown = true,
                        Some(false) => {}
                    }
                }
                if unknown {
                    None
                } else {
                    Some(false)
                }
            }
        }
    }

    /// True when the predicate evaluates to `TRUE` for the entity.
    pub fn matches(&self, entity: &T) -> bool {
        self.evaluate(entity) == Some(true)
    }

    /// Lazily selects the matching entities.
    pub fn filter<'p, 'a, I>(&'p self, entities: I) -> impl Iterator<Item = &'a T> + 'p
    where
        I: IntoIterator<Item = &'a T>,
        I::IntoIter: 'p,
        T: 'a,
    {
        entities.into_iter().filter(move |entity| self.matches(entity))
    }

    /// Consumes the predicate into a plain closure.
    pub fn into_fn(self) -> impl Fn(&T) -> bool {
        move |entity| self.matches(entity)
    }

    fn from_kind(kind: PredicateNode<T>) -> Self {
        Self { kind }
    }

    fn into_kind(self) -> PredicateNode<T> {
        self.kind
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self::from_kind(self.kind.clone())
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate")
            .field(&format_args!("{self}"))
            .finish()
    }
}

impl<T> fmt::Display for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PredicateNode::True => f.write_str("1 = 1"),
            PredicateNode::Compare { operand, op, value } => {
                write!(f, "{operand} {op} {value}")
            }
            PredicateNode::Text { field, op, pattern } => {
                let escaped = escape_like(pattern);
                let like = match op {
                    TextOp::StartsWith => format!("{escaped}%"),
                    TextOp::Contains => format!("%{escaped}%"),
                    TextOp::EndsWith => format!("%{escaped}"),
                };
                write!(f, "{field} LIKE '{like}' ESCAPE '{LIKE_ESCAPE}'")
            }
            PredicateNode::IsNull {
                field,
                negated: false,
            } => write!(f, "{field} IS NULL"),
            PredicateNode::IsNull {
                field,
                negated: true,
            } => write!(f, "{field} IS NOT NULL"),
            PredicateNode::Not(inner) => write!(f, "NOT ({inner})"),
            PredicateNode::And(clauses) => write_joined(f, clauses, " AND "),
            PredicateNode::Or(clauses) => write_joined(f, clauses, " OR "),
        }
    }
}

fn write_joined<T>(f: &mut fmt::Formatter<'_>, clauses: &[Predicate<T>], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{clause}")?;
    }
    f.write_str(")")
}

fn escape_like(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '%' | '_' | LIKE_ESCAPE => {
                out.push(LIKE_ESCAPE);
                out.push(c);
            }
            '\'' => out.push_str("''"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        name: Option<String>,
    }

    fn name() -> Field<Row> {
        Field::new("name", |r: &Row| r.name.as_ref().into())
    }

    fn row(name: Option<&str>) -> Row {
        Row {
            name: name.map(str::to_string),
        }
    }

    fn eq(value: &str) -> Predicate<Row> {
        Predicate::compare(
            FieldOperand::field(name()),
            ComparisonOp::Equal,
            ScalarValue::Text(value.to_string()),
        )
    }

    #[test]
    fn test_three_valued_logic() {
        let null = row(None);
        assert_eq!(eq("a").evaluate(&null), None);
        assert_eq!(eq("a").negate().evaluate(&null), None);
        let contains = Predicate::text(name(), TextOp::Contains, "a");
        assert_eq!(contains.clone().negate().evaluate(&null), None);

        // UNKNOWN OR TRUE is TRUE, UNKNOWN AND FALSE is FALSE
        let or = Predicate::or([eq("a"), Predicate::is_null(name())]);
        assert_eq!(or.evaluate(&null), Some(true));
        let and = Predicate::and([eq("a"), Predicate::is_not_null(name())]);
        assert_eq!(and.evaluate(&null), Some(false));
        let and = Predicate::and([eq("a"), Predicate::always()]);
        assert_eq!(and.evaluate(&null), None);
        assert!(!and.matches(&null));
    }

    #[test]
    fn test_and_or_flatten() {
        let nested = Predicate::and([eq("a"), Predicate::and([eq("b"), eq("c")])]);
        match nested.kind() {
            PredicateNode::And(clauses) => assert_eq!(clauses.len(), 3),
            _ => panic!("expected conjunction"),
        }
        let single = Predicate::or([eq("a")]);
        assert!(matches!(single.kind(), PredicateNode::Compare { .. }));
        assert!(matches!(
            Predicate::<Row>::and([]).kind(),
            PredicateNode::True
        ));
        assert!(!Predicate::<Row>::or([]).matches(&row(Some("a"))));
    }

    #[test]
    fn test_negate_rewrites() {
        assert_eq!(eq("a").negate().to_string(), "name <> 'a'");
        assert_eq!(
            Predicate::is_null(name()).negate().to_string(),
            "name IS NOT NULL"
        );
        let text = Predicate::text(name(), TextOp::StartsWith, "a");
        assert_eq!(text.clone().negate().negate().to_string(), text.to_string());
    }

    #[test]
    fn test_simplify() {
        let p = Predicate::from_kind(PredicateNode::And(vec![
            Predicate::always(),
            Predicate::from_kind(PredicateNode::Not(Box::new(Predicate::from_kind(
                PredicateNode::Not(Box::new(eq("a"))),
            )))),
        ]));
        assert_eq!(p.simplify().to_string(), "name = 'a'");

        let p = Predicate::or([eq("a"), Predicate::always()]);
        assert!(matches!(p.simplify().kind(), PredicateNode::True));
    }

    #[test]
    fn test_like_rendering_escapes_pattern() {
        let p = Predicate::text(name(), TextOp::Contains, "50%_off's");
        assert_eq!(
            p.to_string(),
            "name LIKE '%50\\%\\_off''s%' ESCAPE '\\'"
        );
        let p = Predicate::text(name(), TextOp::StartsWith, "ab");
        assert_eq!(p.to_string(), "name LIKE 'ab%' ESCAPE '\\'");
        let p = Predicate::text(name(), TextOp::EndsWith, "ab");
        assert_eq!(p.to_string(), "name LIKE '%ab' ESCAPE '\\'");
    }

    #[test]
    fn test_filter_and_into_fn() {
        let rows = vec![row(Some("a")), row(None), row(Some("b"))];
        let p = eq("b");
        let selected: Vec<_> = p.filter(&rows).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name.as_deref(), Some("b"));

        let f = p.into_fn();
        assert_eq!(rows.iter().filter(|&r| f(r)).count(), 1);
    }

    #[test]
    fn test_predicate_is_send_sync_for_any_entity() {
        fn assert_send_sync<X: Send + Sync>() {}
        assert_send_sync::<Predicate<std::rc::Rc<u8>>>();
        assert_send_sync::<Field<std::cell::Cell<u8>>>();
    }
}
