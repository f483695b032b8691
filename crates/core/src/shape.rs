//! Parameter shape resolution.
//!
//! A statement's parameters reach MyBatis either as a loose map, as a set of
//! named values, or as one bean whose fields are the names. Which of these
//! applies decides what the template looks like and how JSON is converted.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::model::ParameterDeclaration;
use crate::types::{expand_alias, TypeCategory, TypeRef, TypeResolver};

/// Effective name of an anonymous single scalar argument.
pub const PARAMETER_SENTINEL: &str = "_parameter";

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterShape {
    /// No static structure; every caller-supplied key is a top-level name.
    Map { value_type: Option<TypeRef> },
    /// Named values, one per declaration, keyed by the effective name.
    Multiple(Vec<ParameterDeclaration>),
    /// A single bean whose fields are the top-level names.
    JavaBean(TypeRef),
}

impl ParameterShape {
    pub fn untyped_map() -> Self {
        Self::Map { value_type: None }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map { .. })
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, Self::Multiple(_))
    }

    pub fn is_java_bean(&self) -> bool {
        matches!(self, Self::JavaBean(_))
    }

    pub fn declarations(&self) -> &[ParameterDeclaration] {
        match self {
            Self::Multiple(declarations) => declarations,
            _ => &[],
        }
    }
}

/// Supplies the call-site parameter declarations of mapper statements.
///
/// `None` means the statement has no associated call signature, which is
/// normal for statements only used from XML.
pub trait SignatureSource: Send + Sync {
    fn find_parameter_declarations(
        &self,
        namespace: &str,
        statement_id: &str,
    ) -> Option<Vec<ParameterDeclaration>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoSignatures;

impl SignatureSource for NoSignatures {
    fn find_parameter_declarations(&self, _: &str, _: &str) -> Option<Vec<ParameterDeclaration>> {
        None
    }
}

/// Signatures held in memory, keyed by `(namespace, statement id)`.
#[derive(Debug, Default, Clone)]
pub struct StaticSignatures {
    signatures: HashMap<(String, String), Vec<ParameterDeclaration>>,
}

impl StaticSignatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        namespace: impl Into<String>,
        statement_id: impl Into<String>,
        declarations: Vec<ParameterDeclaration>,
    ) {
        self.signatures
            .insert((namespace.into(), statement_id.into()), declarations);
    }

    pub fn with(
        mut self,
        namespace: impl Into<String>,
        statement_id: impl Into<String>,
        declarations: Vec<ParameterDeclaration>,
    ) -> Self {
        self.insert(namespace, statement_id, declarations);
        self
    }

    pub fn contains(&self, namespace: &str, statement_id: &str) -> bool {
        self.signatures
            .contains_key(&(namespace.to_string(), statement_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl SignatureSource for StaticSignatures {
    fn find_parameter_declarations(
        &self,
        namespace: &str,
        statement_id: &str,
    ) -> Option<Vec<ParameterDeclaration>> {
        self.signatures
            .get(&(namespace.to_string(), statement_id.to_string()))
            .cloned()
    }
}

/// MyBatis' name for a lone collection argument.
fn collection_name(category: TypeCategory) -> Option<&'static str> {
    match category {
        TypeCategory::List => Some("list"),
        TypeCategory::Set => Some("collection"),
        TypeCategory::Array => Some("array"),
        _ => None,
    }
}

pub struct ShapeResolver<'a> {
    types: &'a dyn TypeResolver,
}

impl<'a> ShapeResolver<'a> {
    pub fn new(types: &'a dyn TypeResolver) -> Self {
        Self { types }
    }

    /// Picks the shape for a statement from its declared `parameterType`
    /// and its call-site declarations.
    ///
    /// Declarations with neither an explicit name nor one of the sentinel
    /// names keep `name: None`; their key is then MyBatis' positional
    /// `paramN`.
    pub fn resolve(
        &self,
        explicit_type: Option<&str>,
        declarations: Option<&[ParameterDeclaration]>,
    ) -> ParameterShape {
        if let Some(shape) = explicit_type.and_then(|text| self.resolve_explicit(text)) {
            debug!(?shape, "shape taken from parameterType");
            return shape;
        }

        let declarations = declarations.unwrap_or_default();
        let shape = match declarations {
            [] => ParameterShape::untyped_map(),
            [single] if single.name.is_none() => self.resolve_anonymous(single),
            _ => {
                let only_one = declarations.len() == 1;
                ParameterShape::Multiple(
                    declarations
                        .iter()
                        .map(|declaration| {
                            let mut declaration = declaration.clone();
                            if declaration.name.is_none() && only_one {
                                declaration.name = Some(PARAMETER_SENTINEL.to_string());
                            }
                            declaration
                        })
                        .collect(),
                )
            }
        };
        debug!(?shape, "shape taken from call signature");
        shape
    }

    fn resolve_explicit(&self, text: &str) -> Option<ParameterShape> {
        let expanded = expand_alias(text.trim());
        let Some(ty) = TypeRef::parse(&expanded) else {
            warn!(parameter_type = %text, "parameterType is not a valid type reference");
            return None;
        };

        let category = ty.category(self.types);
        match category {
            TypeCategory::Map => Some(ParameterShape::Map {
                value_type: ty.map_value_type().cloned(),
            }),
            TypeCategory::Composite if self.types.resolve_type(&ty.name).is_none() => {
                warn!(parameter_type = %ty, "parameterType could not be resolved");
                None
            }
            _ => match collection_name(category) {
                Some(name) => Some(ParameterShape::Multiple(vec![ParameterDeclaration::named(
                    name, ty, 0,
                )])),
                None => Some(ParameterShape::JavaBean(ty)),
            },
        }
    }

    fn resolve_anonymous(&self, declaration: &ParameterDeclaration) -> ParameterShape {
        let category = declaration.ty.category(self.types);
        let effective_name = match category {
            TypeCategory::Map => {
                return ParameterShape::Map {
                    value_type: declaration.ty.map_value_type().cloned(),
                }
            }
            TypeCategory::Composite => return ParameterShape::JavaBean(declaration.ty.clone()),
            TypeCategory::Scalar(_) => PARAMETER_SENTINEL,
            sequence => collection_name(sequence).unwrap_or(PARAMETER_SENTINEL),
        };

        ParameterShape::Multiple(vec![ParameterDeclaration::named(
            effective_name,
            declaration.ty.clone(),
            declaration.position,
        )])
    }
}
