//! The entry points: parameter templates and SQL previews for a statement.
//!
//! A request runs resolve shape → convert JSON → render tag tree, with every
//! intermediate value local to the call. The collaborators are borrowed, so
//! one previewer can be shared across threads as long as they are.

use serde_json::Value as Json;
use tracing::debug;

use crate::context::RootContext;
use crate::convert::JsonConverter;
use crate::error::{PreviewError, PreviewResult};
use crate::expr::{ExpressionEvaluator, OgnlEvaluator};
use crate::mapper::{MapperSource, Statement};
use crate::model::StatementPath;
use crate::render::{RenderOptions, SqlRenderer};
use crate::shape::{NoSignatures, ParameterShape, ShapeResolver, SignatureSource};
use crate::types::{NoTypes, TypeResolver};

static NO_SIGNATURES: NoSignatures = NoSignatures;
static NO_TYPES: NoTypes = NoTypes;
static OGNL: OgnlEvaluator = OgnlEvaluator;

pub struct SqlPreviewer<'a> {
    mappers: &'a dyn MapperSource,
    signatures: &'a dyn SignatureSource,
    types: &'a dyn TypeResolver,
    evaluator: &'a dyn ExpressionEvaluator,
    options: RenderOptions,
}

impl<'a> SqlPreviewer<'a> {
    /// A previewer with no call signatures, no type information and the
    /// built-in OGNL evaluator.
    pub fn new(mappers: &'a dyn MapperSource) -> Self {
        Self {
            mappers,
            signatures: &NO_SIGNATURES,
            types: &NO_TYPES,
            evaluator: &OGNL,
            options: RenderOptions::default(),
        }
    }

    pub fn with_signatures(mut self, signatures: &'a dyn SignatureSource) -> Self {
        self.signatures = signatures;
        self
    }

    pub fn with_types(mut self, types: &'a dyn TypeResolver) -> Self {
        self.types = types;
        self
    }

    pub fn with_evaluator(mut self, evaluator: &'a dyn ExpressionEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Looks a statement up through the mapper source.
    ///
    /// The returned statement is owned because the mapper it lives in is
    /// shared behind an `Arc` the caller never sees.
    pub fn find_statement(&self, path: &StatementPath) -> PreviewResult<Statement> {
        self.mappers
            .find_mapper(path.namespace())
            .and_then(|mapper| mapper.statement(path.statement_id()).cloned())
            .ok_or_else(|| PreviewError::statement_not_found(path))
    }

    pub fn resolve_shape(&self, path: &StatementPath, statement: &Statement) -> ParameterShape {
        let declarations = self
            .signatures
            .find_parameter_declarations(path.namespace(), path.statement_id());
        ShapeResolver::new(self.types).resolve(
            statement.parameter_type.as_deref(),
            declarations.as_deref(),
        )
    }

    /// An example payload listing every name the statement can see.
    pub fn generate_parameter_template(&self, path: &StatementPath) -> PreviewResult<Json> {
        let statement = self.find_statement(path)?;
        let shape = self.resolve_shape(path, &statement);
        Ok(JsonConverter::new(self.types).to_template(&shape))
    }

    /// Renders a statement against a JSON payload. A blank payload counts as
    /// `{}`.
    pub fn generate_sql(&self, path: &StatementPath, parameters: &str) -> PreviewResult<String> {
        let json = if parameters.trim().is_empty() {
            Json::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(parameters).map_err(|err| PreviewError::json_parse(&err))?
        };
        self.generate_sql_from_value(path, &json)
    }

    pub fn generate_sql_from_value(
        &self,
        path: &StatementPath,
        parameters: &Json,
    ) -> PreviewResult<String> {
        let statement = self.find_statement(path)?;
        let context = self.build_context(path, &statement, parameters);
        debug!(statement = %path, names = context.base().len(), "rendering");
        SqlRenderer::new(self.mappers, self.evaluator, path)
            .with_options(self.options)
            .render(&statement, context)
    }

    /// The root context a payload produces for a statement.
    pub fn build_context(
        &self,
        path: &StatementPath,
        statement: &Statement,
        parameters: &Json,
    ) -> RootContext {
        let shape = self.resolve_shape(path, statement);
        RootContext::new(JsonConverter::new(self.types).to_context(parameters, &shape))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::mapper::MapperRegistry;
    use crate::model::ParameterDeclaration;
    use crate::shape::StaticSignatures;
    use crate::types::{ClassDescriptor, StaticTypes, TypeRef};

    const MAPPER: &str = r#"<mapper namespace="blog.BlogMapper">
        <select id="byAuthor" parameterType="blog.Author">
            SELECT * FROM blog WHERE author = #{name}
        </select>
        <select id="byIds">
            SELECT * FROM blog WHERE id IN
            <foreach collection="list" item="id" open="(" separator="," close=")">#{id}</foreach>
        </select>
        <select id="byTitle">SELECT * FROM blog WHERE title = #{title}</select>
        <select id="byAge">SELECT * FROM author WHERE age = #{age}</select>
    </mapper>"#;

    fn registry() -> MapperRegistry {
        let mut mappers = MapperRegistry::new();
        mappers.load_str(MAPPER).unwrap();
        mappers
    }

    #[test]
    fn unknown_statements_are_reported() {
        let mappers = registry();
        let previewer = SqlPreviewer::new(&mappers);
        let err = previewer
            .generate_sql(&StatementPath::parse("blog.BlogMapper.nope"), "{}")
            .unwrap_err();
        assert!(err.is_statement_not_found());
        assert!(previewer
            .generate_parameter_template(&StatementPath::parse("other.byTitle"))
            .unwrap_err()
            .is_statement_not_found());
    }

    #[test]
    fn malformed_json_keeps_its_position() {
        let mappers = registry();
        let err = SqlPreviewer::new(&mappers)
            .generate_sql(&StatementPath::parse("blog.BlogMapper.byTitle"), "{\n  \"title\": }")
            .unwrap_err();
        let PreviewError::JsonParse { line, .. } = err else {
            panic!("expected a JSON error, got {:?}", err);
        };
        assert_eq!(line, 2);
    }

    #[test]
    fn blank_payload_is_an_empty_object() {
        let mappers = registry();
        let sql = SqlPreviewer::new(&mappers)
            .generate_sql(&StatementPath::parse("blog.BlogMapper.byTitle"), "  ")
            .unwrap();
        assert_eq!(sql, "SELECT * FROM blog WHERE title = NULL");
    }

    #[test]
    fn bean_parameter_type_hoists_fields() {
        let mappers = registry();
        let types = StaticTypes::new()
            .with(ClassDescriptor::class("blog.Author").with_field("name", TypeRef::named("java.lang.String")));
        let previewer = SqlPreviewer::new(&mappers).with_types(&types);
        let path = StatementPath::parse("blog.BlogMapper.byAuthor");

        assert_eq!(
            previewer.generate_parameter_template(&path).unwrap(),
            json!({"name": "string"})
        );
        assert_eq!(
            previewer.generate_sql(&path, r#"{"name": "Ann"}"#).unwrap(),
            "SELECT * FROM blog WHERE author = 'Ann'"
        );
    }

    #[test]
    fn single_list_argument_is_reachable_as_list() {
        let mappers = registry();
        let signatures = StaticSignatures::new().with(
            "blog.BlogMapper",
            "byIds",
            vec![ParameterDeclaration::unnamed(
                TypeRef::generic("java.util.List", vec![TypeRef::named("java.lang.Long")]),
                0,
            )],
        );
        let previewer = SqlPreviewer::new(&mappers).with_signatures(&signatures);
        let path = StatementPath::parse("blog.BlogMapper.byIds");

        assert_eq!(
            previewer.generate_parameter_template(&path).unwrap(),
            json!({"list": [1]})
        );
        assert_eq!(
            previewer.generate_sql(&path, r#"{"list": [4, 5]}"#).unwrap(),
            "SELECT * FROM blog WHERE id IN (4,5)"
        );
    }

    #[test]
    fn fractional_numbers_truncate_for_int_parameters() {
        let mappers = registry();
        let signatures = StaticSignatures::new().with(
            "blog.BlogMapper",
            "byAge",
            vec![ParameterDeclaration::named("age", TypeRef::named("int"), 0)],
        );
        let previewer = SqlPreviewer::new(&mappers).with_signatures(&signatures);
        assert_eq!(
            previewer
                .generate_sql(&StatementPath::parse("blog.BlogMapper.byAge"), r#"{"age": 1.5}"#)
                .unwrap(),
            "SELECT * FROM author WHERE age = 1"
        );
    }
}
