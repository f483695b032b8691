//! Class descriptors supplied by the environment's type resolution.

use std::collections::HashMap;
use std::sync::Arc;

use super::TypeRef;

/// Resolves qualified Java type names to class descriptors.
///
/// Implemented by whatever knows the project's classes; the core never
/// reads source files itself. Returning `None` is a type resolution failure,
/// which callers degrade from instead of failing the request.
pub trait TypeResolver: Send + Sync {
    fn resolve_type(&self, qualified_name: &str) -> Option<Arc<ClassDescriptor>>;
}

/// A resolver that knows no classes; everything composite stays untyped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTypes;

impl TypeResolver for NoTypes {
    fn resolve_type(&self, _qualified_name: &str) -> Option<Arc<ClassDescriptor>> {
        None
    }
}

/// An in-memory resolver over a fixed set of descriptors.
#[derive(Debug, Default, Clone)]
pub struct StaticTypes {
    classes: HashMap<String, Arc<ClassDescriptor>>,
}

impl StaticTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class: ClassDescriptor) {
        self.classes.insert(class.name.clone(), Arc::new(class));
    }

    pub fn with(mut self, class: ClassDescriptor) -> Self {
        self.insert(class);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl TypeResolver for StaticTypes {
    fn resolve_type(&self, qualified_name: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(qualified_name).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
}

/// Structure of one resolved class: its declared fields, superclass and,
/// for enums, constants.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassDescriptor {
    pub name: String,
    pub kind: ClassKind,
    pub superclass: Option<TypeRef>,
    pub fields: Vec<FieldDescriptor>,
    pub enum_constants: Vec<String>,
}

impl ClassDescriptor {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn enumeration(name: impl Into<String>, constants: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Enum,
            enum_constants: constants,
            ..Self::default()
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.fields.push(FieldDescriptor::new(name, ty));
        self
    }

    pub fn with_superclass(mut self, superclass: TypeRef) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn is_enum(&self) -> bool {
        self.kind == ClassKind::Enum
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: TypeRef,
    pub is_static: bool,
    pub is_synthetic: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
            is_synthetic: false,
        }
    }

    /// Instance state of the bean, as opposed to static fields, compiler
    /// synthetic fields and the `this$N` outer-instance reference.
    pub fn is_instance_field(&self) -> bool {
        !self.is_static && !self.is_synthetic && !self.name.starts_with("this$")
    }
}
