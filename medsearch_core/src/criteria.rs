//! Flat composite search criteria.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::condition::Condition;
use crate::error::{Error, Result};
use crate::predicate::Predicate;

/// How the conditions of a composite are combined into one predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combine {
    /// Every condition must hold.
    #[default]
    All,
    /// At least one condition must hold.
    Any,
}

/// Options applied when turning criteria into a single predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub combine: Combine,
}

/// A member offered to a composite: a leaf condition or another composite.
pub enum Criterion<T> {
    Condition(Condition<T>),
    Composite(SearchCriteria<T>),
}

impl<T> From<Condition<T>> for Criterion<T> {
    fn from(condition: Condition<T>) -> Self {
        Criterion::Condition(condition)
    }
}

impl<T> From<SearchCriteria<T>> for Criterion<T> {
    fn from(criteria: SearchCriteria<T>) -> Self {
        Criterion::Composite(criteria)
    }
}

/// An ordered, flat list of conditions.
///
/// Composites never nest: offering a composite as a member fails with
/// [`Error::UnsupportedNesting`] when it is added.
pub struct SearchCriteria<T> {
    conditions: Vec<Condition<T>>,
}

impl<T> SearchCriteria<T> {
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Builds a composite from members, rejecting any nested composite.
    pub fn from_criteria<I, C>(criteria: I) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<Criterion<T>>,
    {
        let mut composite = Self::new();
        for criterion in criteria {
            composite.push(criterion)?;
        }
        Ok(composite)
    }

    pub fn push<C>(&mut self, criterion: C) -> Result<()>
    where
        C: Into<Criterion<T>>,
    {
        match criterion.into() {
            Criterion::Condition(condition) => {
                self.conditions.push(condition);
                Ok(())
            }
            Criterion::Composite(nested) => {
                debug!(
                    members = nested.len(),
                    "rejecting nested search criteria"
                );
                Err(Error::UnsupportedNesting)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Condition<T>> {
        self.conditions.iter()
    }

    /// Folds every condition into `query`, in order.
    ///
    /// `apply_one` narrows the query by one condition; chaining the calls
    /// yields the conjunction of all conditions. The first error stops the
    /// fold and is returned.
    pub fn apply<Q, F>(&self, query: Q, mut apply_one: F) -> Result<Q>
    where
        F: FnMut(Q, &Condition<T>) -> Result<Q>,
    {
        debug!(conditions = self.conditions.len(), "applying search criteria");
        self.conditions
            .iter()
            .try_fold(query, |query, condition| apply_one(query, condition))
    }

    /// Conjunction of every condition's predicate; `None` when empty.
    pub fn all_predicate(&self) -> Result<Option<Predicate<T>>> {
        Ok(Predicate::conjunction(self.predicates()?))
    }

    /// Disjunction of every condition's predicate; `None` when empty.
    pub fn any_predicate(&self) -> Result<Option<Predicate<T>>> {
        Ok(Predicate::disjunction(self.predicates()?))
    }

    pub fn predicate(&self, options: SearchOptions) -> Result<Option<Predicate<T>>> {
        match options.combine {
            Combine::All => self.all_predicate(),
            Combine::Any => self.any_predicate(),
        }
    }

    fn predicates(&self) -> Result<Vec<Predicate<T>>> {
        self.conditions.iter().map(Condition::predicate).collect()
    }
}

impl<T> Default for SearchCriteria<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SearchCriteria<T> {
    fn clone(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
        }
    }
}

impl<T> fmt::Debug for SearchCriteria<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.conditions).finish()
    }
}

impl<'a, T> IntoIterator for &'a SearchCriteria<T> {
    type Item = &'a Condition<T>;
    type IntoIter = std::slice::Iter<'a, Condition<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
