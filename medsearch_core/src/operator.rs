use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Operators a search screen can attach to a criterion.
///
/// Not every operator is valid for every value kind, see
/// [`ValueKind::supports`](crate::ValueKind::supports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchOperator {
    Equals,
    NotEquals,
    StartsWith,
    Contains,
    EndsWith,
    NotContains,
    LessThan,
    GreaterThan,
}

impl SearchOperator {
    pub const ALL: [SearchOperator; 8] = [
        SearchOperator::Equals,
        SearchOperator::NotEquals,
        SearchOperator::StartsWith,
        SearchOperator::Contains,
        SearchOperator::EndsWith,
        SearchOperator::NotContains,
        SearchOperator::LessThan,
        SearchOperator::GreaterThan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SearchOperator::Equals => "Equals",
            SearchOperator::NotEquals => "NotEquals",
            SearchOperator::StartsWith => "StartsWith",
            SearchOperator::Contains => "Contains",
            SearchOperator::EndsWith => "EndsWith",
            SearchOperator::NotContains => "NotContains",
            SearchOperator::LessThan => "LessThan",
            SearchOperator::GreaterThan => "GreaterThan",
        }
    }
}

impl fmt::Display for SearchOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchOperator {
    type Err = Error;

    /// Accepts the variant name in any case, or a two-letter alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let op = match lowered.as_str() {
            "equals" | "eq" => SearchOperator::Equals,
            "notequals" | "ne" => SearchOperator::NotEquals,
            "startswith" | "sw" => SearchOperator::StartsWith,
            "contains" | "co" => SearchOperator::Contains,
            "endswith" | "ew" => SearchOperator::EndsWith,
            "notcontains" | "nc" => SearchOperator::NotContains,
            "lessthan" | "lt" => SearchOperator::LessThan,
            "greaterthan" | "gt" => SearchOperator::GreaterThan,
            _ => return Err(Error::UnknownOperator(s.to_string())),
        };
        Ok(op)
    }
}

/// Comparison operator used by binary predicate nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// Equals (`=`)
    Equal,
    /// Not equals (`<>`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Greater than (`>`)
    GreaterThan,
}

impl ComparisonOp {
    /// Evaluates the operator against a comparison ordering.
    pub fn test_ordering(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering;
        match self {
            ComparisonOp::Equal => ordering == Ordering::Equal,
            ComparisonOp::NotEqual => ordering != Ordering::Equal,
            ComparisonOp::LessThan => ordering == Ordering::Less,
            ComparisonOp::GreaterThan => ordering == Ordering::Greater,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "<>",
            ComparisonOp::LessThan => "<",
            ComparisonOp::GreaterThan => ">",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Substring match performed by text predicate nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextOp {
    StartsWith,
    Contains,
    EndsWith,
}

impl TextOp {
    pub fn test(self, haystack: &str, needle: &str) -> bool {
        match self {
            TextOp::StartsWith => haystack.starts_with(needle),
            TextOp::Contains => haystack.contains(needle),
            TextOp::EndsWith => haystack.ends_with(needle),
        }
    }
}
