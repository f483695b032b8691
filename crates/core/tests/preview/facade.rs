use batislens_core::prelude::*;
use batislens_macros::type_ref;
use serde_json::json;

const COMMON: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE mapper PUBLIC "-//mybatis.org//DTD Mapper 3.0//EN" "http://mybatis.org/dtd/mybatis-3-mapper.dtd">
<mapper namespace="app.Common">
    <sql id="paging">LIMIT ${size} OFFSET ${offset}</sql>
</mapper>"#;

const EVENTS: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<mapper namespace="app.EventMapper">
    <sql id="columns">id, kind, created_at</sql>

    <select id="search">
        <bind name="pattern" value="'%' + keyword + '%'"/>
        SELECT <include refid="columns"/> FROM events
        <where>
            <if test="keyword != null">AND name LIKE #{pattern}</if>
            <if test="since != null">AND created_at &gt;= #{since}</if>
            <choose>
                <when test="kinds != null and kinds.size() == 1">AND kind = #{kinds[0]}</when>
                <when test="kinds != null">
                    AND kind IN <foreach collection="kinds" item="k" open="(" separator="," close=")">#{k}</foreach>
                </when>
                <otherwise>AND kind IS NOT NULL</otherwise>
            </choose>
        </where>
        ORDER BY ${order}
        <include refid="app.Common.paging">
            <property name="size" value="20"/>
            <property name="offset" value="0"/>
        </include>
    </select>

    <update id="touch" parameterType="long">
        UPDATE events SET seen = TRUE WHERE id = #{_parameter}
    </update>

    <delete id="purge">
        DELETE FROM events WHERE id IN
        <foreach collection="array" item="id" open="(" separator="," close=")">#{id}</foreach>
    </delete>
</mapper>"#;

fn mappers() -> MapperRegistry {
    let mut mappers = MapperRegistry::new();
    mappers.load_str(COMMON).unwrap();
    mappers.load_str(EVENTS).unwrap();
    mappers
}

fn signatures() -> StaticSignatures {
    StaticSignatures::new()
        .with(
            "app.EventMapper",
            "search",
            vec![
                ParameterDeclaration::named("keyword", type_ref!("string"), 0),
                ParameterDeclaration::named("since", type_ref!("java.time.LocalDateTime"), 1),
                ParameterDeclaration::named("kinds", type_ref!("java.util.List<String>"), 2),
                ParameterDeclaration::named("order", type_ref!("string"), 3),
            ],
        )
        .with(
            "app.EventMapper",
            "purge",
            vec![ParameterDeclaration::unnamed(type_ref!("long[]"), 0)],
        )
}

#[test]
fn search_template_lists_every_named_parameter() {
    let mappers = mappers();
    let signatures = signatures();
    let previewer = SqlPreviewer::new(&mappers).with_signatures(&signatures);
    let template = previewer
        .generate_parameter_template(&StatementPath::parse("app.EventMapper.search"))
        .unwrap();
    assert_eq!(
        template,
        json!({
            "keyword": "string",
            "since": "2023-01-01T00:00:00",
            "kinds": ["string"],
            "order": "string"
        })
    );
}

#[test]
fn search_renders_every_dynamic_tag() {
    let mappers = mappers();
    let signatures = signatures();
    let previewer = SqlPreviewer::new(&mappers).with_signatures(&signatures);
    let path = StatementPath::parse("app.EventMapper.search");

    let sql = previewer
        .generate_sql(
            &path,
            r#"{"keyword": "db", "since": "2024-05-01 08:30:00", "kinds": ["a", "b"], "order": "created_at DESC"}"#,
        )
        .unwrap();
    assert_eq!(
        sql,
        "SELECT id, kind, created_at FROM events WHERE name LIKE '%db%' \
         AND created_at >= '2024-05-01T08:30:00' AND kind IN ('a','b') \
         ORDER BY created_at DESC LIMIT 20 OFFSET 0"
    );

    let sql = previewer
        .generate_sql(&path, r#"{"keyword": "x", "kinds": ["a"], "order": "id"}"#)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT id, kind, created_at FROM events WHERE name LIKE '%x%' AND kind = 'a' \
         ORDER BY id LIMIT 20 OFFSET 0"
    );
}

#[test]
fn empty_list_keeps_the_in_parentheses() {
    let mappers = mappers();
    let signatures = signatures();
    let sql = SqlPreviewer::new(&mappers)
        .with_signatures(&signatures)
        .generate_sql(
            &StatementPath::parse("app.EventMapper.search"),
            r#"{"kinds": [], "order": "id"}"#,
        )
        .unwrap();
    assert_eq!(
        sql,
        "SELECT id, kind, created_at FROM events WHERE kind IN () ORDER BY id LIMIT 20 OFFSET 0"
    );
}

#[test]
fn scalar_parameter_type_accepts_wrapped_and_bare_values() {
    let mappers = mappers();
    let previewer = SqlPreviewer::new(&mappers);
    let path = StatementPath::parse("app.EventMapper.touch");

    assert_eq!(
        previewer.generate_parameter_template(&path).unwrap(),
        json!({"_parameter": 1})
    );
    assert_eq!(
        previewer.generate_sql(&path, r#"{"_parameter": 9}"#).unwrap(),
        "UPDATE events SET seen = TRUE WHERE id = 9"
    );
    assert_eq!(
        previewer.generate_sql(&path, "9").unwrap(),
        "UPDATE events SET seen = TRUE WHERE id = 9"
    );
}

#[test]
fn array_argument_is_bound_as_array() {
    let mappers = mappers();
    let signatures = signatures();
    let previewer = SqlPreviewer::new(&mappers).with_signatures(&signatures);
    let sql = previewer
        .generate_sql(&StatementPath::parse("app.EventMapper.purge"), r#"{"array": [3, 4]}"#)
        .unwrap();
    assert_eq!(sql, "DELETE FROM events WHERE id IN (3,4)");
}

#[test]
fn strict_includes_reject_missing_fragments() {
    let mut mappers = MapperRegistry::new();
    mappers
        .load_str(r#"<mapper namespace="m"><select id="s">SELECT <include refid="gone"/> 1</select></mapper>"#)
        .unwrap();
    let path = StatementPath::parse("m.s");

    assert_eq!(SqlPreviewer::new(&mappers).generate_sql(&path, "{}").unwrap(), "SELECT 1");

    let strict = RenderOptions {
        strict_includes: true,
        ..RenderOptions::default()
    };
    let err = SqlPreviewer::new(&mappers)
        .with_options(strict)
        .generate_sql(&path, "{}")
        .unwrap_err();
    assert!(err.is_fragment_not_found());
}
