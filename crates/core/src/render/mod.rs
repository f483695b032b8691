// render/mod.rs
//! The dynamic SQL template processor.
//!
//! Rendering is a fold over a statement's tag tree: every element kind maps
//! to one handler, text nodes go through placeholder substitution, and the
//! concatenated output is normalised by [`format_sql`]. The only state is
//! the [`Scope`] handed down the recursion, so one renderer can serve any
//! number of requests.
//!
//! `#{}` placeholders are inlined as SQL literals rather than bound as JDBC
//! parameters. The output is a preview of what the database would see
//! after binding, not the prepared statement MyBatis would send.

mod format;
mod placeholder;
mod trim;

pub use format::format_sql;
pub use placeholder::{substitute, Placeholder};
pub use trim::TrimRule;

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::context::RootContext;
use crate::error::{Limit, PreviewError, PreviewResult};
use crate::expr::ExpressionEvaluator;
use crate::mapper::{Element, MapperDefinition, MapperSource, Node, Statement, TagKind};
use crate::model::{StatementPath, Value};

pub const DEFAULT_MAX_DEPTH: usize = 64;
pub const DEFAULT_MAX_FOREACH_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Deepest allowed tag nesting, counting fragment expansion.
    pub max_depth: usize,
    /// Most iterations a single `<foreach>` may run.
    pub max_foreach_iterations: usize,
    /// Fail on a missing `<include>` target instead of rendering nothing.
    pub strict_includes: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_foreach_iterations: DEFAULT_MAX_FOREACH_ITERATIONS,
            strict_includes: false,
        }
    }
}

/// Everything a node renders against.
#[derive(Debug, Clone)]
struct Scope {
    context: RootContext,
    /// `<property>` values of the enclosing `<include>`s.
    properties: Arc<IndexMap<String, String>>,
    /// Namespace bare `refid`s resolve in.
    namespace: Arc<str>,
    depth: usize,
}

pub struct SqlRenderer<'a> {
    mappers: &'a dyn MapperSource,
    evaluator: &'a dyn ExpressionEvaluator,
    options: RenderOptions,
    path: &'a StatementPath,
}

impl<'a> SqlRenderer<'a> {
    pub fn new(
        mappers: &'a dyn MapperSource,
        evaluator: &'a dyn ExpressionEvaluator,
        path: &'a StatementPath,
    ) -> Self {
        Self {
            mappers,
            evaluator,
            options: RenderOptions::default(),
            path,
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Renders a statement's body to formatted SQL.
    pub fn render(&self, statement: &Statement, context: RootContext) -> PreviewResult<String> {
        let scope = Scope {
            context,
            properties: Arc::new(IndexMap::new()),
            namespace: Arc::from(self.path.namespace()),
            depth: 0,
        };
        let raw = self.render_nodes(&statement.body, statement.kind.as_str(), &scope)?;
        Ok(format_sql(&raw))
    }

    /// Renders siblings in order. A `<bind>` extends the scope seen by the
    /// siblings after it and by nothing else.
    fn render_nodes(&self, nodes: &[Node], parent: &str, scope: &Scope) -> PreviewResult<String> {
        let mut out = String::new();
        let mut current: Option<Scope> = None;

        for node in nodes {
            let active = current.as_ref().unwrap_or(scope);
            match node {
                Node::Text(text) => out.push_str(&self.substitute_text(text, parent, active)?),
                Node::Element(element) if element.kind == TagKind::Bind => {
                    if let Some(context) = self.bind(element, active)? {
                        current = Some(Scope {
                            context,
                            ..active.clone()
                        });
                    }
                }
                Node::Element(element) => out.push_str(&self.render_element(element, active)?),
            }
        }

        Ok(out)
    }

    fn render_element(&self, element: &Element, scope: &Scope) -> PreviewResult<String> {
        let depth = scope.depth + 1;
        if depth > self.options.max_depth {
            return Err(self.limit_exceeded(Limit::Depth, self.options.max_depth));
        }
        let scope = Scope {
            depth,
            ..scope.clone()
        };

        match element.kind {
            TagKind::Include => self.include(element, &scope),
            TagKind::If | TagKind::When => {
                if self.test(element, &scope) {
                    self.render_nodes(&element.children, &element.name, &scope)
                } else {
                    Ok(String::new())
                }
            }
            TagKind::Choose => self.choose(element, &scope),
            TagKind::Foreach => self.foreach(element, &scope),
            TagKind::Trim => self.trim(element, TrimRule::from_element(element), &scope),
            TagKind::Where => self.trim(element, TrimRule::where_clause(), &scope),
            TagKind::Set => self.trim(element, TrimRule::set_clause(), &scope),
            // Property only configures its parent include; selectKey runs as
            // its own statement.
            TagKind::Property | TagKind::SelectKey | TagKind::Bind => Ok(String::new()),
            TagKind::Otherwise | TagKind::Other => {
                self.render_nodes(&element.children, &element.name, &scope)
            }
        }
    }

    /// Evaluates a `test` attribute. Failures count as false.
    fn test(&self, element: &Element, scope: &Scope) -> bool {
        let Some(test) = element.attr("test") else {
            warn!(tag = %element.name, statement = %self.path, "missing test attribute");
            return false;
        };
        match self.evaluator.evaluate(test, &scope.context) {
            Ok(value) => value.truthy(),
            Err(err) => {
                warn!(
                    test,
                    statement = %self.path,
                    error = %err,
                    "test expression failed, treating it as false"
                );
                false
            }
        }
    }

    fn evaluate(&self, expression: &str, tag: &str, scope: &Scope) -> PreviewResult<Value> {
        self.evaluator
            .evaluate(expression, &scope.context)
            .map_err(|source| PreviewError::Expression {
                path: self.path.clone(),
                tag: tag.to_string(),
                expression: expression.to_string(),
                source,
            })
    }

    fn choose(&self, element: &Element, scope: &Scope) -> PreviewResult<String> {
        let mut otherwise = None;
        for child in element.child_elements() {
            match child.kind {
                TagKind::When if self.test(child, scope) => {
                    return self.render_nodes(&child.children, &child.name, scope);
                }
                TagKind::Otherwise if otherwise.is_none() => otherwise = Some(child),
                _ => {}
            }
        }

        match otherwise {
            Some(child) => self.render_nodes(&child.children, &child.name, scope),
            None => Ok(String::new()),
        }
    }

    fn foreach(&self, element: &Element, scope: &Scope) -> PreviewResult<String> {
        let Some(collection) = element.attr("collection") else {
            warn!(statement = %self.path, "foreach without a collection attribute");
            return Ok(String::new());
        };
        let item = element.attr("item").unwrap_or("item");
        let index = element.attr("index").unwrap_or("index");
        let open = element.attr("open").unwrap_or_default();
        let close = element.attr("close").unwrap_or_default();
        let separator = element.attr("separator").unwrap_or(",");

        let entries: Vec<(Value, Value)> = match self.evaluate(collection, &element.name, scope)? {
            Value::List(items) | Value::Set(items) | Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, value)| (loop_index(i), value))
                .collect(),
            Value::Map(fields) => fields
                .into_iter()
                .map(|(key, value)| (Value::String(key), value))
                .collect(),
            other => {
                debug!(
                    collection,
                    kind = other.type_name(),
                    "foreach collection is not iterable, rendering nothing"
                );
                return Ok(String::new());
            }
        };

        if entries.len() > self.options.max_foreach_iterations {
            return Err(self.limit_exceeded(
                Limit::ForeachIterations,
                self.options.max_foreach_iterations,
            ));
        }

        let mut parts = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let mut bindings = IndexMap::with_capacity(2);
            bindings.insert(index.to_string(), key);
            bindings.insert(item.to_string(), value);
            let iteration = Scope {
                context: scope.context.with_overlay(bindings),
                ..scope.clone()
            };
            parts.push(self.render_nodes(&element.children, &element.name, &iteration)?);
        }

        Ok(format!("{}{}{}", open, parts.join(separator), close))
    }

    fn trim(&self, element: &Element, rule: TrimRule, scope: &Scope) -> PreviewResult<String> {
        let body = self.render_nodes(&element.children, &element.name, scope)?;
        Ok(rule.apply(&body))
    }

    /// Evaluates a `<bind>` into a child context; `None` when the element is
    /// incomplete.
    fn bind(&self, element: &Element, scope: &Scope) -> PreviewResult<Option<RootContext>> {
        let (Some(name), Some(expression)) = (element.attr("name"), element.attr("value")) else {
            warn!(statement = %self.path, "bind needs both name and value attributes");
            return Ok(None);
        };
        let value = self.evaluate(expression, &element.name, scope)?;
        debug!(name, %value, "bind");
        Ok(Some(scope.context.bind(name, value)))
    }

    fn include(&self, element: &Element, scope: &Scope) -> PreviewResult<String> {
        let Some(refid) = element.attr("refid") else {
            warn!(statement = %self.path, "include without a refid attribute");
            return Ok(String::new());
        };

        // Property values may themselves refer to outer properties.
        let mut properties = (*scope.properties).clone();
        for property in element.child_elements().filter(|e| e.kind == TagKind::Property) {
            if let (Some(name), Some(value)) = (property.attr("name"), property.attr("value")) {
                let value = self.substitute_raw(value, &element.name, scope)?;
                properties.insert(name.to_string(), value);
            }
        }
        let properties = Arc::new(properties);

        let refid = self.substitute_raw(
            refid,
            &element.name,
            &Scope {
                properties: Arc::clone(&properties),
                ..scope.clone()
            },
        )?;

        let Some((mapper, id)) = self.find_fragment(&refid, &scope.namespace) else {
            if self.options.strict_includes {
                return Err(PreviewError::FragmentNotFound {
                    path: self.path.clone(),
                    refid: refid.clone(),
                });
            }
            warn!(refid = %refid, statement = %self.path, "include target not found, rendering nothing");
            return Ok(String::new());
        };
        let body = mapper.fragment(id).map(|f| f.body.as_slice()).unwrap_or_default();

        let fragment_scope = Scope {
            context: scope.context.clone(),
            properties,
            namespace: Arc::from(mapper.namespace.as_str()),
            depth: scope.depth,
        };
        self.render_nodes(body, "sql", &fragment_scope)
    }

    /// Finds the mapper holding a refid's fragment, trying the refid as a
    /// qualified `namespace.id` first and then as an id in the current
    /// namespace.
    fn find_fragment<'r>(
        &self,
        refid: &'r str,
        current_namespace: &str,
    ) -> Option<(Arc<MapperDefinition>, &'r str)> {
        if let Some((namespace, id)) = refid.rsplit_once('.') {
            if let Some(mapper) = self.mappers.find_mapper(namespace) {
                if mapper.fragment(id).is_some() {
                    return Some((mapper, id));
                }
            }
        }

        self.mappers
            .find_mapper(current_namespace)
            .filter(|mapper| mapper.fragment(refid).is_some())
            .map(|mapper| (mapper, refid))
    }

    /// `${}` substitution only, as applied to `refid` and property values.
    fn substitute_raw(&self, text: &str, tag: &str, scope: &Scope) -> PreviewResult<String> {
        substitute(text, |placeholder| match placeholder {
            Placeholder::Raw { expression } => self.raw_value(expression, tag, scope),
            Placeholder::Bind { .. } => Ok(format!("#{{{}}}", placeholder.expression())),
        })
    }

    fn substitute_text(&self, text: &str, tag: &str, scope: &Scope) -> PreviewResult<String> {
        substitute(text, |placeholder| match placeholder {
            Placeholder::Bind { expression } => {
                Ok(self.evaluate(expression, tag, scope)?.to_sql_literal())
            }
            Placeholder::Raw { expression } => self.raw_value(expression, tag, scope),
        })
    }

    /// Include properties win over context values; `null` splices nothing.
    fn raw_value(&self, expression: &str, tag: &str, scope: &Scope) -> PreviewResult<String> {
        if let Some(value) = scope.properties.get(expression) {
            return Ok(value.clone());
        }
        Ok(match self.evaluate(expression, tag, scope)? {
            Value::Null => String::new(),
            value => value.to_string(),
        })
    }

    fn limit_exceeded(&self, limit: Limit, max: usize) -> PreviewError {
        PreviewError::LimitExceeded {
            path: self.path.clone(),
            limit,
            max,
        }
    }
}

/// A foreach position as an `int`, or a `long` past `i32::MAX`.
fn loop_index(i: usize) -> Value {
    match i32::try_from(i) {
        Ok(i) => Value::Int(i),
        Err(_) => Value::Long(i64::try_from(i).unwrap_or(i64::MAX)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::expr::OgnlEvaluator;
    use crate::mapper::MapperRegistry;

    const COMMON: &str = r#"<mapper namespace="common">
        <sql id="columns">${alias}.id, ${alias}.title</sql>
        <sql id="loop"><include refid="loop"/></sql>
    </mapper>"#;

    fn render_with(
        docs: &[&str],
        path: &str,
        params: serde_json::Value,
        options: RenderOptions,
    ) -> PreviewResult<String> {
        let mut mappers = MapperRegistry::new();
        for doc in docs {
            mappers.load_str(doc).unwrap();
        }
        let path = StatementPath::parse(path);
        let mapper = Arc::clone(mappers.get(path.namespace()).unwrap());
        let statement = mapper.statement(path.statement_id()).unwrap();
        let context = match Value::from_json(&params) {
            Value::Map(fields) => RootContext::new(fields),
            _ => RootContext::empty(),
        };
        SqlRenderer::new(&mappers, &OgnlEvaluator, &path)
            .with_options(options)
            .render(statement, context)
    }

    fn render(body: &str, params: serde_json::Value) -> PreviewResult<String> {
        let doc = format!(
            r#"<mapper namespace="blog"><sql id="table">blog</sql><select id="s">{}</select></mapper>"#,
            body
        );
        render_with(&[&doc, COMMON], "blog.s", params, RenderOptions::default())
    }

    const FIND: &str = r#"SELECT * FROM blog
        <where>
            <if test="title != null">AND title = #{title}</if>
            <if test="author != null">AND author = #{author}</if>
        </where>"#;

    #[test]
    fn where_drops_the_leading_conjunction() {
        assert_eq!(
            render(FIND, json!({"title": "Rust"})).unwrap(),
            "SELECT * FROM blog WHERE title = 'Rust'"
        );
        assert_eq!(
            render(FIND, json!({"author": "O'Brien"})).unwrap(),
            "SELECT * FROM blog WHERE author = 'O''Brien'"
        );
        assert_eq!(render(FIND, json!({})).unwrap(), "SELECT * FROM blog");
    }

    #[test]
    fn set_drops_the_trailing_comma() {
        let body = r#"UPDATE blog <set><if test="title != null">title = #{title},</if> <if test="views != null">views = #{views},</if></set> WHERE id = #{id}"#;
        assert_eq!(
            render(body, json!({"title": "A", "views": 3, "id": 7})).unwrap(),
            "UPDATE blog SET title = 'A', views = 3 WHERE id = 7"
        );
    }

    #[test]
    fn foreach_joins_items_between_open_and_close() {
        let body = r#"SELECT * FROM blog WHERE id IN <foreach collection="ids" item="id" open="(" separator="," close=")">#{id}</foreach>"#;
        assert_eq!(
            render(body, json!({"ids": [1, 2, 3]})).unwrap(),
            "SELECT * FROM blog WHERE id IN (1,2,3)"
        );
        assert_eq!(
            render(body, json!({"ids": []})).unwrap(),
            "SELECT * FROM blog WHERE id IN ()"
        );
        assert_eq!(
            render(body, json!({})).unwrap(),
            "SELECT * FROM blog WHERE id IN"
        );
    }

    #[test]
    fn foreach_over_a_map_binds_keys_as_the_index() {
        let body = r#"<foreach collection="filters" index="column" item="v" separator=" AND ">${column} = #{v}</foreach>"#;
        assert_eq!(
            render(body, json!({"filters": {"a": 1, "b": "x"}})).unwrap(),
            "a = 1 AND b = 'x'"
        );
    }

    #[test]
    fn foreach_bindings_do_not_leak() {
        let body = r#"<foreach collection="ids" item="item" index="i" separator=",">#{i}:#{item}</foreach> #{item} ${i}"#;
        assert_eq!(
            render(body, json!({"ids": [5, 6], "item": "outer"})).unwrap(),
            "0:5,1:6 'outer'"
        );
    }

    #[test]
    fn bind_is_visible_to_later_siblings_only() {
        let body = r#"<if test="pattern == null">x</if><bind name="pattern" value="'%' + title + '%'"/> LIKE #{pattern}"#;
        assert_eq!(
            render(body, json!({"title": "Rust"})).unwrap(),
            "x LIKE '%Rust%'"
        );

        let nested = r#"<if test="true"><bind name="inner" value="1"/>#{inner}</if> [${inner}]"#;
        assert_eq!(render(nested, json!({})).unwrap(), "1 []");
    }

    #[test]
    fn loop_index_widens_past_int_range() {
        assert_eq!(loop_index(7), Value::Int(7));
        assert_eq!(loop_index(i32::MAX as usize), Value::Int(i32::MAX));
        assert_eq!(
            loop_index(i32::MAX as usize + 1),
            Value::Long(i64::from(i32::MAX) + 1)
        );
    }

    #[test]
    fn choose_takes_the_first_passing_branch() {
        let body = r#"<choose><when test="a != null">A</when><when test="b != null">B</when><otherwise>C</otherwise></choose>"#;
        assert_eq!(render(body, json!({"a": 1, "b": 2})).unwrap(), "A");
        assert_eq!(render(body, json!({"b": 2})).unwrap(), "B");
        assert_eq!(render(body, json!({})).unwrap(), "C");
    }

    #[test]
    fn custom_trim_applies_prefix_and_overrides() {
        let body = r#"<trim prefix="(" suffix=")" prefixOverrides="AND |OR ">OR a = 1</trim>"#;
        assert_eq!(render(body, json!({})).unwrap(), "(a = 1)");
    }

    #[test]
    fn includes_resolve_locally_and_across_namespaces() {
        let body = r#"SELECT <include refid="common.columns"><property name="alias" value="b"/></include> FROM <include refid="table"/> b"#;
        assert_eq!(
            render(body, json!({})).unwrap(),
            "SELECT b.id, b.title FROM blog b"
        );
    }

    #[test]
    fn refid_and_properties_see_outer_properties() {
        let body = r#"<include refid="${which}"><property name="which" value="common.columns"/><property name="alias" value="t"/></include>"#;
        assert_eq!(render(body, json!({})).unwrap(), "t.id, t.title");
    }

    #[test]
    fn missing_include_renders_nothing_unless_strict() {
        let body = r#"SELECT <include refid="nowhere"/> 1"#;
        assert_eq!(render(body, json!({})).unwrap(), "SELECT 1");

        let doc = format!(r#"<mapper namespace="blog"><select id="s">{}</select></mapper>"#, body);
        let strict = RenderOptions {
            strict_includes: true,
            ..RenderOptions::default()
        };
        let err = render_with(&[&doc], "blog.s", json!({}), strict).unwrap_err();
        assert!(err.is_fragment_not_found());
    }

    #[test]
    fn recursive_includes_hit_the_depth_limit() {
        let err = render(r#"<include refid="common.loop"/>"#, json!({})).unwrap_err();
        assert!(matches!(
            err,
            PreviewError::LimitExceeded {
                limit: Limit::Depth,
                max: DEFAULT_MAX_DEPTH,
                ..
            }
        ));
    }

    #[test]
    fn nesting_beyond_max_depth_fails() {
        let doc = r#"<mapper namespace="n"><select id="s"><if test="true"><if test="true"><if test="true">x</if></if></if></select></mapper>"#;
        let shallow = RenderOptions {
            max_depth: 2,
            ..RenderOptions::default()
        };
        assert!(render_with(&[doc], "n.s", json!({}), shallow)
            .unwrap_err()
            .is_limit_exceeded());
        let enough = RenderOptions {
            max_depth: 3,
            ..RenderOptions::default()
        };
        assert_eq!(render_with(&[doc], "n.s", json!({}), enough).unwrap(), "x");
    }

    #[test]
    fn foreach_iterations_are_capped() {
        let doc = r#"<mapper namespace="n"><select id="s"><foreach collection="ids" item="id">#{id}</foreach></select></mapper>"#;
        let options = RenderOptions {
            max_foreach_iterations: 2,
            ..RenderOptions::default()
        };
        let err = render_with(&[doc], "n.s", json!({"ids": [1, 2, 3]}), options).unwrap_err();
        assert!(matches!(
            err,
            PreviewError::LimitExceeded {
                limit: Limit::ForeachIterations,
                max: 2,
                ..
            }
        ));
        assert_eq!(
            render_with(&[doc], "n.s", json!({"ids": [1, 2]}), options).unwrap(),
            "1,2"
        );
    }

    #[test]
    fn failing_tests_count_as_false() {
        let body = r#"a<if test="author.name == 'x'">b</if><if test="((">c</if>"#;
        assert_eq!(render(body, json!({})).unwrap(), "a");
    }

    #[test]
    fn failing_placeholders_abort_the_render() {
        let err = render("name = #{author.name}", json!({})).unwrap_err();
        let PreviewError::Expression {
            tag,
            expression,
            source,
            ..
        } = &err
        else {
            panic!("expected an expression error, got {:?}", err);
        };
        assert_eq!(tag, "select");
        assert_eq!(expression, "author.name");
        assert!(source.is_null_target());
    }

    #[test]
    fn raw_null_splices_nothing() {
        assert_eq!(
            render("ORDER BY id ${direction}", json!({})).unwrap(),
            "ORDER BY id"
        );
        assert_eq!(
            render("ORDER BY id ${direction}", json!({"direction": "DESC"})).unwrap(),
            "ORDER BY id DESC"
        );
    }
}
