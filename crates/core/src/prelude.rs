pub use crate::context::{RootContext, VariableScope};
pub use crate::convert::JsonConverter;
pub use crate::error::{Limit, PreviewError, PreviewResult};
pub use crate::expr::{EvalError, ExpressionEvaluator, OgnlEvaluator};
pub use crate::mapper::{MapperDefinition, MapperError, MapperRegistry, MapperSource, Statement};
pub use crate::model::{ParameterDeclaration, StatementPath, Value};
pub use crate::preview::SqlPreviewer;
pub use crate::render::RenderOptions;
pub use crate::shape::{
    NoSignatures, ParameterShape, ShapeResolver, SignatureSource, StaticSignatures,
};
pub use crate::types::{
    ClassDescriptor, ClassKind, FieldDescriptor, NoTypes, StaticTypes, TypeRef, TypeResolver,
};
