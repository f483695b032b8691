use std::fmt;

use thiserror::Error;

use crate::expr::EvalError;
use crate::mapper::MapperError;
use crate::model::StatementPath;

/// Result type for preview operations
pub type PreviewResult<T> = Result<T, PreviewError>;

/// Which safety limit a render ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// Tag nesting, including fragment expansion.
    Depth,
    /// Iterations of a single `foreach`.
    ForeachIterations,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Depth => f.write_str("maximum tag depth"),
            Self::ForeachIterations => f.write_str("maximum foreach iterations"),
        }
    }
}

/// Errors that can occur while previewing a statement's SQL
#[derive(Debug, Error)]
pub enum PreviewError {
    /// No statement with this id exists in the namespace
    #[error("Statement '{path}' not found")]
    StatementNotFound { path: StatementPath },

    /// An include target is missing and includes are strict
    #[error("Fragment '{refid}' not found while rendering '{path}'")]
    FragmentNotFound { path: StatementPath, refid: String },

    /// The parameter payload is not valid JSON
    #[error("Invalid parameter JSON at line {line}, column {column}: {message}")]
    JsonParse {
        line: usize,
        column: usize,
        message: String,
    },

    /// A value-producing expression could not be evaluated
    #[error("Failed to evaluate '{expression}' in <{tag}> of '{path}': {source}")]
    Expression {
        path: StatementPath,
        tag: String,
        expression: String,
        #[source]
        source: EvalError,
    },

    /// A render safety limit was exceeded
    #[error("Statement '{path}' exceeded the {limit} of {max}")]
    LimitExceeded {
        path: StatementPath,
        limit: Limit,
        max: usize,
    },

    /// A mapper document could not be loaded
    #[error("Mapper error: {0}")]
    Mapper(#[from] MapperError),
}

impl PreviewError {
    pub fn report(&self) -> String {
        match self {
            Self::StatementNotFound { path } => {
                format!(
                    "Statement '{}' not found\n\
                     Suggestion: Check the namespace and id, and that the mapper file was loaded.",
                    path
                )
            }
            Self::FragmentNotFound { path, refid } => {
                format!(
                    "Fragment '{}' referenced from '{}' not found\n\
                     Suggestion: Define the <sql> fragment or qualify the refid with its namespace.",
                    refid, path
                )
            }
            Self::JsonParse {
                line,
                column,
                message,
            } => {
                format!(
                    "Invalid parameter JSON at line {}, column {}: {}\n\
                     Suggestion: Start from the generated parameter template.",
                    line, column, message
                )
            }
            Self::Expression {
                path,
                tag,
                expression,
                source,
            } => {
                format!(
                    "Failed to evaluate '{}' in <{}> of '{}': {}\n\
                     Suggestion: Supply the parameters the expression refers to.",
                    expression, tag, path, source
                )
            }
            Self::LimitExceeded { path, limit, max } => {
                format!(
                    "Statement '{}' exceeded the {} of {}\n\
                     Suggestion: Use smaller collections in the parameters or raise the limit in the [engine] config.",
                    path, limit, max
                )
            }
            Self::Mapper(err) => {
                format!(
                    "Mapper error: {}\n\
                     Suggestion: Check that the file is a well-formed MyBatis mapper.",
                    err
                )
            }
        }
    }

    pub fn statement_not_found(path: &StatementPath) -> Self {
        Self::StatementNotFound { path: path.clone() }
    }

    pub fn json_parse(err: &serde_json::Error) -> Self {
        Self::JsonParse {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }

    pub fn is_statement_not_found(&self) -> bool {
        matches!(self, Self::StatementNotFound { .. })
    }

    pub fn is_fragment_not_found(&self) -> bool {
        matches!(self, Self::FragmentNotFound { .. })
    }

    pub fn is_json_parse(&self) -> bool {
        matches!(self, Self::JsonParse { .. })
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, Self::Expression { .. })
    }

    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::LimitExceeded { .. })
    }
}
