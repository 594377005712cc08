use thiserror::Error;

use crate::operator::SearchOperator;
use crate::value::ValueKind;

/// The main error type for the medsearch core library.
#[derive(Debug, Error)]
pub enum Error {
    // Contract violations in criteria construction
    #[error("unsupported operator {operator} for {kind} condition")]
    UnsupportedOperator {
        kind: ValueKind,
        operator: SearchOperator,
    },

    #[error("nested search criteria are not supported")]
    UnsupportedNesting,

    // Input errors from criteria documents
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("unknown search operator: {0}")]
    UnknownOperator(String),

    #[error("invalid {kind} value {value:?}: {reason}")]
    InvalidValue {
        kind: ValueKind,
        value: String,
        reason: String,
    },

    #[error("invalid criterion {0:?}, expected field:operator:value")]
    InvalidCriterion(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if the error signals a defect in the caller's criteria shape
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedOperator { .. } | Error::UnsupportedNesting
        )
    }

    /// Returns true if the error came from malformed textual criteria
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownField(_)
                | Error::UnknownOperator(_)
                | Error::InvalidValue { .. }
                | Error::InvalidCriterion(_)
                | Error::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
