// convert/mod.rs
//! Typed JSON conversion.
//!
//! Converts a [`ParameterShape`] into an example JSON template, and a JSON
//! payload plus a shape into the base bindings of a root context. Coercion
//! is best effort: a value that cannot be converted to its declared type
//! passes through as its untyped JSON interpretation.

mod scalar;

use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value as Json};
use tracing::{debug, warn};

use crate::model::{generic_param_name, ParameterDeclaration, Value};
use crate::schema::SchemaWalker;
use crate::shape::{ParameterShape, PARAMETER_SENTINEL};
use crate::types::{TypeCategory, TypeRef, TypeResolver};

/// Extra root key a lone scalar is reachable under.
pub const VALUE_ALIAS: &str = "value";
/// Extra root key a lone collection is reachable under.
pub const COLLECTION_ALIAS: &str = "collection";

const COLLECTION_NAMES: [&str; 3] = ["list", "collection", "array"];

pub struct JsonConverter<'a> {
    types: &'a dyn TypeResolver,
}

impl<'a> JsonConverter<'a> {
    pub fn new(types: &'a dyn TypeResolver) -> Self {
        Self { types }
    }

    /// Example JSON payload for a shape.
    pub fn to_template(&self, shape: &ParameterShape) -> Json {
        let mut walker = SchemaWalker::new(self.types);
        match shape {
            ParameterShape::Map { .. } => Json::Object(JsonMap::new()),
            ParameterShape::Multiple(declarations) => Json::Object(
                declarations
                    .iter()
                    .map(|declaration| {
                        (declaration.key().into_owned(), walker.example(&declaration.ty))
                    })
                    .collect(),
            ),
            ParameterShape::JavaBean(ty) => match ty.category(self.types) {
                TypeCategory::Composite => Json::Object(walker.bean_example(ty)),
                _ => {
                    let mut object = JsonMap::new();
                    object.insert(PARAMETER_SENTINEL.to_string(), walker.example(ty));
                    Json::Object(object)
                }
            },
        }
    }

    /// Base bindings of the root context for a payload.
    pub fn to_context(&self, json: &Json, shape: &ParameterShape) -> IndexMap<String, Value> {
        let mut bindings = IndexMap::new();

        match shape {
            ParameterShape::Map { value_type } => {
                let Some(object) = json.as_object() else {
                    warn!(kind = json_kind(json), "map parameters expect a JSON object");
                    return bindings;
                };
                for (key, value) in object {
                    bindings.insert(key.clone(), self.coerce(value, value_type.as_ref()));
                }
                let whole = Value::Map(bindings.clone());
                bind_if_absent(&mut bindings, PARAMETER_SENTINEL, whole);
            }
            ParameterShape::Multiple(declarations) => {
                let single = declarations.len() == 1;
                for declaration in declarations {
                    let key = declaration.key();
                    let raw = match json.as_object() {
                        Some(object) => object.get(&*key),
                        // A lone declaration may be given its value directly.
                        None if single => Some(json),
                        None => None,
                    };
                    let Some(raw) = raw else {
                        debug!(name = %key, "no value supplied for parameter");
                        continue;
                    };
                    let value = self.coerce(raw, Some(&declaration.ty));
                    bindings.insert(key.clone().into_owned(), value);
                }
                self.bind_aliases(&mut bindings, declarations);
            }
            ParameterShape::JavaBean(ty) => {
                // Scalar payloads arrive wrapped the way the template shows them.
                let payload = match (ty.category(self.types), json.get(PARAMETER_SENTINEL)) {
                    (TypeCategory::Composite, _) | (_, None) => json,
                    (_, Some(inner)) => inner,
                };
                match self.coerce(payload, Some(ty)) {
                    Value::Map(fields) => {
                        let bean = Value::Map(fields.clone());
                        bindings.extend(fields);
                        bind_if_absent(&mut bindings, PARAMETER_SENTINEL, bean);
                    }
                    Value::Null => {}
                    scalar => {
                        bindings.insert(PARAMETER_SENTINEL.to_string(), scalar.clone());
                        bindings.insert(VALUE_ALIAS.to_string(), scalar);
                    }
                }
            }
        }

        bindings
    }

    fn bind_aliases(
        &self,
        bindings: &mut IndexMap<String, Value>,
        declarations: &[ParameterDeclaration],
    ) {
        for declaration in declarations {
            let key = declaration.key();
            let Some(value) = bindings.get(&*key).cloned() else {
                continue;
            };
            bind_if_absent(bindings, &generic_param_name(declaration.position), value.clone());
            if key == PARAMETER_SENTINEL {
                bind_if_absent(bindings, VALUE_ALIAS, value);
            } else if declarations.len() == 1 && COLLECTION_NAMES.contains(&&*key) {
                bind_if_absent(bindings, COLLECTION_ALIAS, value.clone());
                bind_if_absent(bindings, PARAMETER_SENTINEL, value);
            }
        }
    }

    /// Coerces a JSON value against an optional target type.
    pub fn coerce(&self, json: &Json, target: Option<&TypeRef>) -> Value {
        let Some(target) = target else {
            return Value::from_json(json);
        };
        if json.is_null() {
            return Value::Null;
        }

        let category = target.category(self.types);
        let coerced = match category {
            TypeCategory::Scalar(kind) => {
                let class = self.types.resolve_type(&target.name);
                scalar::coerce_scalar(json, kind, class.as_deref())
            }
            TypeCategory::Array | TypeCategory::List | TypeCategory::Set => {
                json.as_array().map(|items| {
                    let element_type = target.element_type();
                    let mut elements: Vec<Value> = Vec::with_capacity(items.len());
                    for item in items {
                        let element = self.coerce(item, element_type.as_ref());
                        if category == TypeCategory::Set && elements.contains(&element) {
                            continue;
                        }
                        elements.push(element);
                    }
                    match category {
                        TypeCategory::Array => Value::Array(elements),
                        TypeCategory::Set => Value::Set(elements),
                        _ => Value::List(elements),
                    }
                })
            }
            TypeCategory::Map => json.as_object().map(|object| {
                let value_type = target.map_value_type();
                Value::Map(
                    object
                        .iter()
                        .map(|(key, value)| (key.clone(), self.coerce(value, value_type)))
                        .collect(),
                )
            }),
            TypeCategory::Composite => json.as_object().map(|object| self.coerce_bean(object, target)),
        };

        coerced.unwrap_or_else(|| {
            warn!(
                target = %target,
                kind = json_kind(json),
                "value does not match its declared type, passing it through untyped"
            );
            Value::from_json(json)
        })
    }

    fn coerce_bean(&self, object: &JsonMap<String, Json>, ty: &TypeRef) -> Value {
        let Some(fields) = SchemaWalker::new(self.types).fields(ty) else {
            warn!(type_name = %ty.name, "type could not be resolved, converting untyped");
            return Value::from_json(&Json::Object(object.clone()));
        };

        let mut values = IndexMap::new();
        for (key, json) in object {
            match fields.iter().find(|field| &field.name == key) {
                Some(field) => {
                    values.insert(key.clone(), self.coerce(json, Some(&field.ty)));
                }
                None => debug!(field = %key, type_name = %ty.name, "dropping unknown field"),
            }
        }
        Value::Map(values)
    }
}

fn bind_if_absent(bindings: &mut IndexMap<String, Value>, key: &str, value: Value) {
    if !bindings.contains_key(key) {
        bindings.insert(key.to_string(), value);
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
