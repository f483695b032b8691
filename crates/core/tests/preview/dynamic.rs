use batislens_core::prelude::*;
use batislens_core::render::SqlRenderer;
use batislens_macros::statement;
use serde_json::json;

fn render(statement: &Statement, params: serde_json::Value) -> PreviewResult<String> {
    let mappers = MapperRegistry::new();
    let path = StatementPath::parse("test.test");
    let context = match Value::from_json(&params) {
        Value::Map(fields) => RootContext::new(fields),
        _ => RootContext::empty(),
    };
    SqlRenderer::new(&mappers, &OgnlEvaluator, &path).render(statement, context)
}

#[test]
fn where_with_a_single_condition() {
    let stmt = statement!(r#"<where><if test="name != null">AND name = #{name}</if></where>"#);
    assert_eq!(
        render(&stmt, json!({"name": "Alice"})).unwrap(),
        "WHERE name = 'Alice'"
    );
    assert_eq!(render(&stmt, json!({})).unwrap(), "");
}

#[test]
fn foreach_builds_an_in_list() {
    let stmt = statement!(
        r#"<foreach collection="ids" item="id" open="(" separator="," close=")">#{id}</foreach>"#
    );
    assert_eq!(render(&stmt, json!({"ids": [1, 2, 3]})).unwrap(), "(1,2,3)");
}

#[test]
fn set_with_a_single_assignment() {
    let stmt = statement!(r#"<set><if test="age != null">age = #{age},</if></set>"#);
    assert_eq!(render(&stmt, json!({"age": 30})).unwrap(), "SET age = 30");
    assert_eq!(render(&stmt, json!({})).unwrap(), "");
}

#[test]
fn missing_fragment_contributes_nothing() {
    let stmt = statement!(r#"SELECT id <include refid="missing"/> FROM t"#);
    assert_eq!(render(&stmt, json!({})).unwrap(), "SELECT id FROM t");
}

#[test]
fn loop_bindings_stay_inside_their_iteration() {
    // `seen` is bound inside the body, so it must be null again at the start
    // of every iteration and after the loop.
    let stmt = statement!(
        r#"<foreach collection="xs" item="x" separator=" ">[<if test="seen != null">leak</if><bind name="seen" value="x"/>#{seen}]</foreach> ${x}${seen}"#
    );
    assert_eq!(
        render(&stmt, json!({"xs": ["a", "b", "c"]})).unwrap(),
        "['a'] ['b'] ['c']"
    );
}

#[test]
fn nested_loops_see_outer_items() {
    let stmt = statement!(
        r#"<foreach collection="rows" item="row" separator=",">(<foreach collection="row" item="cell" index="i" separator=",">#{i}=#{cell}</foreach>)</foreach>"#
    );
    assert_eq!(
        render(&stmt, json!({"rows": [[1, 2], [3]]})).unwrap(),
        "(0=1,1=2),(0=3)"
    );
}

#[test]
fn where_handles_multiline_conditions() {
    let stmt = statement!(
        r#"SELECT * FROM blog
        <where>
            <if test="state != null">
                state = #{state}
            </if>
            <if test="title != null">
                AND title like #{title}
            </if>
            <if test="author != null and author.name != null">
                AND author_name like #{author.name}
            </if>
        </where>"#
    );
    assert_eq!(
        render(&stmt, json!({"title": "%rust%", "author": {"name": "Ann"}})).unwrap(),
        "SELECT * FROM blog WHERE title like '%rust%' AND author_name like 'Ann'"
    );
    assert_eq!(
        render(&stmt, json!({"state": "ACTIVE", "author": {}})).unwrap(),
        "SELECT * FROM blog WHERE state = 'ACTIVE'"
    );
}

#[test]
fn expressions_support_ognl_operators() {
    let stmt = statement!(
        r#"<if test="ids != null and ids.size() > 0 and mode eq 'all'">ALL</if><if test="name != null and name.trim() != ''">NAMED</if><if test="limit gte 10">BIG</if>"#
    );
    assert_eq!(
        render(&stmt, json!({"ids": [1], "mode": "all", "name": "  ", "limit": 10})).unwrap(),
        "ALLBIG"
    );
}

#[test]
fn cdata_and_entities_are_literal_text() {
    let stmt = statement!(r#"SELECT * FROM t WHERE a <![CDATA[ < ]]> #{a} AND b &gt;= #{b}"#);
    assert_eq!(
        render(&stmt, json!({"a": 1, "b": 2})).unwrap(),
        "SELECT * FROM t WHERE a < 1 AND b >= 2"
    );
}

#[test]
fn trim_suffix_attaches_to_the_body() {
    let stmt = statement!(r#"SELECT 1<trim prefix="WHERE" suffix=";">a = 1</trim>"#);
    assert_eq!(render(&stmt, json!({})).unwrap(), "SELECT 1 WHERE a = 1;");
}
