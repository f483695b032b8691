use batislens_core::prelude::*;
use batislens_macros::type_ref;
use serde_json::json;

fn library_types() -> StaticTypes {
    StaticTypes::new()
        .with(
            ClassDescriptor::class("shop.Order")
                .with_field("id", type_ref!("long"))
                .with_field("status", type_ref!("shop.Status"))
                .with_field("customer", type_ref!("shop.Customer"))
                .with_field("lines", type_ref!("java.util.List<shop.Line>")),
        )
        .with(
            ClassDescriptor::class("shop.Customer")
                .with_field("name", type_ref!("string"))
                .with_field("referrer", type_ref!("shop.Customer")),
        )
        .with(
            ClassDescriptor::class("shop.Line")
                .with_field("sku", type_ref!("string"))
                .with_field("price", type_ref!("decimal")),
        )
        .with(ClassDescriptor::enumeration(
            "shop.Status",
            vec!["OPEN".into(), "SHIPPED".into()],
        ))
}

#[test]
fn no_parameters_and_no_type_is_a_map() {
    let shape = ShapeResolver::new(&NoTypes).resolve(None, None);
    assert_eq!(shape, ParameterShape::untyped_map());
}

#[test]
fn anonymous_bean_template_is_keyed_by_fields() {
    let types = library_types();
    let declarations = [ParameterDeclaration::unnamed(type_ref!("shop.Order"), 0)];
    let shape = ShapeResolver::new(&types).resolve(None, Some(&declarations));
    assert!(shape.is_java_bean());

    let template = JsonConverter::new(&types).to_template(&shape);
    assert_eq!(
        template,
        json!({
            "id": 1,
            "status": "OPEN",
            "customer": {"name": "string", "referrer": {}},
            "lines": [{"sku": "string", "price": "100.00"}]
        })
    );
}

#[test]
fn multiple_shape_round_trips_through_the_context() {
    let types = library_types();
    let declarations = [
        ParameterDeclaration::named("id", type_ref!("java.lang.Integer"), 0),
        ParameterDeclaration::named("since", type_ref!("java.time.LocalDate"), 1),
        ParameterDeclaration::named("status", type_ref!("shop.Status"), 2),
        ParameterDeclaration::named("skus", type_ref!("java.util.List<String>"), 3),
        ParameterDeclaration::named("total", type_ref!("java.math.BigDecimal"), 4),
    ];
    let shape = ShapeResolver::new(&types).resolve(None, Some(&declarations));
    let payload = json!({
        "id": 42,
        "since": "2024-02-29",
        "status": "SHIPPED",
        "skus": ["a", "b"],
        "total": 19.5
    });

    let context = JsonConverter::new(&types).to_context(&payload, &shape);
    for declaration in shape.declarations() {
        let key = declaration.key();
        assert_eq!(context[&*key].to_json(), payload[&*key], "for {}", key);
    }
    assert_eq!(context["param1"], Value::Int(42));
}

#[test]
fn generated_templates_render() {
    let mut mappers = MapperRegistry::new();
    mappers
        .load_str(
            r#"<mapper namespace="shop.OrderMapper">
                <select id="find" parameterType="shop.Order">
                    SELECT * FROM orders
                    <where>
                        <if test="id != null">AND id = #{id}</if>
                        <if test="status != null">AND status = #{status}</if>
                        <if test="customer != null">AND customer = #{customer.name}</if>
                        <if test="lines != null and !lines.isEmpty()">
                            AND sku IN
                            <foreach collection="lines" item="line" open="(" separator=", " close=")">#{line.sku}</foreach>
                        </if>
                    </where>
                </select>
            </mapper>"#,
        )
        .unwrap();
    let types = library_types();
    let previewer = SqlPreviewer::new(&mappers).with_types(&types);
    let path = StatementPath::parse("shop.OrderMapper.find");

    let template = previewer.generate_parameter_template(&path).unwrap();
    assert_eq!(
        previewer.generate_sql_from_value(&path, &template).unwrap(),
        "SELECT * FROM orders WHERE id = 1 AND status = 'OPEN' AND customer = 'string' AND sku IN ('string')"
    );
}

#[test]
fn container_parameter_types_bind_like_mybatis() {
    let resolver = ShapeResolver::new(&NoTypes);
    assert!(resolver.resolve(Some("hashmap"), None).is_map());
    assert_eq!(resolver.resolve(Some("list"), None).declarations()[0].key(), "list");
    assert_eq!(resolver.resolve(Some("int[]"), None).declarations()[0].key(), "array");
    assert!(resolver.resolve(Some("string"), None).is_java_bean());

    let mut mappers = MapperRegistry::new();
    mappers
        .load_str(
            r#"<mapper namespace="shop.LineMapper">
                <select id="byName" parameterType="map">SELECT * FROM line WHERE sku = #{sku}</select>
                <select id="bySkus" parameterType="list">
                    SELECT * FROM line WHERE sku IN
                    <foreach collection="list" item="sku" open="(" close=")">#{sku}</foreach>
                </select>
            </mapper>"#,
        )
        .unwrap();
    let previewer = SqlPreviewer::new(&mappers);
    assert_eq!(
        previewer
            .generate_sql(&StatementPath::parse("shop.LineMapper.byName"), r#"{"sku": "a"}"#)
            .unwrap(),
        "SELECT * FROM line WHERE sku = 'a'"
    );
    assert_eq!(
        previewer
            .generate_sql(&StatementPath::parse("shop.LineMapper.bySkus"), r#"{"list": ["a", "b"]}"#)
            .unwrap(),
        "SELECT * FROM line WHERE sku IN ('a','b')"
    );
}
