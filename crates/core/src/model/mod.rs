// model/mod.rs
//! Core data model shared by every stage of the preview pipeline.
//!
//! A request flows through these types in order: a [`StatementPath`] names
//! the statement, [`ParameterDeclaration`]s describe its call site, and
//! [`Value`]s hold the typed parameters the dynamic SQL is evaluated against.

mod value;

pub use value::*;

use std::borrow::Cow;
use std::fmt;

use crate::types::TypeRef;

/// Identifies one mapper statement as a `(namespace, statement id)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatementPath {
    namespace: String,
    statement_id: String,
}

impl StatementPath {
    pub fn new(namespace: impl Into<String>, statement_id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            statement_id: statement_id.into(),
        }
    }

    /// Splits a dotted qualified id on its last dot.
    ///
    /// `com.example.BlogMapper.selectBlog` becomes namespace
    /// `com.example.BlogMapper` and id `selectBlog`. An id without any dot
    /// has an empty namespace.
    pub fn parse(qualified: &str) -> Self {
        let qualified = qualified.trim();
        match qualified.rsplit_once('.') {
            Some((namespace, id)) => Self::new(namespace, id),
            None => Self::new("", qualified),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn statement_id(&self) -> &str {
        &self.statement_id
    }
}

impl fmt::Display for StatementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.statement_id)
        } else {
            write!(f, "{}.{}", self.namespace, self.statement_id)
        }
    }
}

impl From<&str> for StatementPath {
    fn from(qualified: &str) -> Self {
        Self::parse(qualified)
    }
}

/// One formal parameter of a mapper method.
///
/// `name` holds the explicit binding name (the `@Param` value) when the
/// declaration comes from a call site. Once a
/// [`ParameterShape`](crate::shape::ParameterShape) has been resolved it
/// holds the effective name instead, which may be a MyBatis sentinel such as
/// `_parameter`.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDeclaration {
    pub name: Option<String>,
    pub ty: TypeRef,
    pub position: usize,
}

impl ParameterDeclaration {
    pub fn new(name: Option<String>, ty: TypeRef, position: usize) -> Self {
        Self { name, ty, position }
    }

    pub fn named(name: impl Into<String>, ty: TypeRef, position: usize) -> Self {
        Self::new(Some(name.into()), ty, position)
    }

    pub fn unnamed(ty: TypeRef, position: usize) -> Self {
        Self::new(None, ty, position)
    }

    /// The top-level key this declaration occupies in templates and contexts.
    ///
    /// Falls back to MyBatis' generic `paramN` name (1-based) when the
    /// declaration carries no name.
    pub fn key(&self) -> Cow<'_, str> {
        match &self.name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(generic_param_name(self.position)),
        }
    }
}

/// MyBatis' positional alias for the parameter at `position` (0-based).
pub fn generic_param_name(position: usize) -> String {
    format!("param{}", position + 1)
}
