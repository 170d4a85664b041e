use thiserror::Error;

/// Rejections raised while compiling filter JSON into SQL
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Table, column or sort key that is not a plain SQL identifier
    #[error("invalid {kind} name `{name}`")]
    Identifier { kind: &'static str, name: String },

    #[error("malformed where clause: {0}")]
    MalformedWhere(&'static str),

    #[error("unknown operator `{0}`")]
    UnknownOperator(String),

    #[error("operator {op} {expects}")]
    Operand { op: String, expects: &'static str },

    #[error("{0} must be non-negative")]
    NegativePaging(&'static str),
}

impl FilterError {
    pub(crate) fn identifier(kind: &'static str, name: impl Into<String>) -> Self {
        FilterError::Identifier { kind, name: name.into() }
    }

    pub(crate) fn operand(op: impl Into<String>, expects: &'static str) -> Self {
        FilterError::Operand { op: op.into(), expects }
    }
}
