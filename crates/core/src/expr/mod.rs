// expr/mod.rs
//! Expression evaluation for `test`, `collection`, `value` attributes and
//! placeholder bodies.
//!
//! The renderer only talks to the [`ExpressionEvaluator`] capability, so the
//! expression language is swappable. [`OgnlEvaluator`] is the built-in
//! implementation and covers the OGNL subset mapper files actually use.

mod eval;
mod lexer;
mod parser;

pub use eval::OgnlEvaluator;
pub use parser::{BinaryOp, Expr, UnaryOp};

use thiserror::Error;

use crate::context::VariableScope;
use crate::model::Value;

/// Evaluates an expression against a scope of named values.
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str, scope: &dyn VariableScope) -> Result<Value, EvalError>;
}

/// Errors raised while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("syntax error at offset {position} in '{expression}': {message}")]
    Syntax {
        expression: String,
        position: usize,
        message: String,
    },

    /// A property, index or method was applied to `null`.
    #[error("cannot access '{member}' on null")]
    NullTarget { member: String },

    #[error("no property '{property}' on {type_name}")]
    UnknownProperty {
        property: String,
        type_name: &'static str,
    },

    #[error("no method '{method}' on {type_name}")]
    UnknownMethod {
        method: String,
        type_name: &'static str,
    },

    #[error("invalid arguments for '{method}': {message}")]
    BadArguments { method: String, message: String },

    #[error("operator '{operator}' cannot be applied to {left} and {right}")]
    TypeMismatch {
        operator: String,
        left: &'static str,
        right: &'static str,
    },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i128, len: usize },

    #[error("division by zero")]
    DivisionByZero,
}

impl EvalError {
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    pub fn is_null_target(&self) -> bool {
        matches!(self, Self::NullTarget { .. })
    }
}
