//! Bean schema walking: field enumeration and example generation.

use std::collections::HashSet;

use serde_json::{Map as JsonMap, Value as Json};
use tracing::warn;

use crate::types::{
    example_map_key, placeholder_element, placeholder_map, scalar_example, FieldDescriptor,
    TypeCategory, TypeRef, TypeResolver,
};

/// Walks composite types through a [`TypeResolver`].
///
/// A walker is request-local: it tracks the types on the current recursion
/// path, and a type met again on that path yields an empty object instead
/// of recursing. Sibling fields of the same type are each expanded.
pub struct SchemaWalker<'a> {
    types: &'a dyn TypeResolver,
    visiting: HashSet<String>,
}

impl<'a> SchemaWalker<'a> {
    pub fn new(types: &'a dyn TypeResolver) -> Self {
        Self {
            types,
            visiting: HashSet::new(),
        }
    }

    /// Instance fields of `ty`, own fields first, then those inherited along
    /// the superclass chain. A field shadowed by a subclass is listed once.
    ///
    /// Returns `None` when the type cannot be resolved.
    pub fn fields(&self, ty: &TypeRef) -> Option<Vec<FieldDescriptor>> {
        let class = self.types.resolve_type(&ty.name)?;
        let mut fields: Vec<FieldDescriptor> = Vec::new();
        let mut seen_classes = HashSet::new();
        let mut current = Some(class);

        while let Some(class) = current.take() {
            if !seen_classes.insert(class.name.clone()) {
                break;
            }
            for field in class.fields.iter().filter(|f| f.is_instance_field()) {
                if !fields.iter().any(|known| known.name == field.name) {
                    fields.push(field.clone());
                }
            }
            current = class
                .superclass
                .as_ref()
                .filter(|parent| parent.name != "java.lang.Object")
                .and_then(|parent| self.types.resolve_type(&parent.name));
        }

        Some(fields)
    }

    /// An example JSON value for `ty`.
    pub fn example(&mut self, ty: &TypeRef) -> Json {
        match ty.category(self.types) {
            TypeCategory::Scalar(kind) => {
                let class = self.types.resolve_type(&ty.name);
                scalar_example(kind, class.as_deref())
            }
            TypeCategory::Array | TypeCategory::List | TypeCategory::Set => {
                let element = match ty.element_type() {
                    Some(element) => self.example(&element),
                    None => placeholder_element(),
                };
                Json::Array(vec![element])
            }
            TypeCategory::Map => match ty.map_value_type() {
                Some(value_type) => {
                    let key = ty.map_key_type().and_then(|key| match key.category(self.types) {
                        TypeCategory::Scalar(kind) => Some(kind),
                        _ => None,
                    });
                    let mut object = JsonMap::new();
                    object.insert(example_map_key(key).to_string(), self.example(value_type));
                    Json::Object(object)
                }
                None => placeholder_map(),
            },
            TypeCategory::Composite => Json::Object(self.bean_example(ty)),
        }
    }

    /// Example object for a composite type, keyed by its fields.
    pub fn bean_example(&mut self, ty: &TypeRef) -> JsonMap<String, Json> {
        if !self.visiting.insert(ty.name.clone()) {
            return JsonMap::new();
        }

        let mut object = JsonMap::new();
        match self.fields(ty) {
            Some(fields) => {
                for field in fields {
                    let example = self.example(&field.ty);
                    object.insert(field.name, example);
                }
            }
            None => warn!(type_name = %ty.name, "type could not be resolved, using an empty example"),
        }

        self.visiting.remove(&ty.name);
        object
    }
}
