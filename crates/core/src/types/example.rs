use serde_json::{json, Value as Json};

use super::{ClassDescriptor, ScalarKind};

/// Key used for example map entries when the key type is unknown or textual.
pub const EXAMPLE_MAP_KEY: &str = "key";

/// The fixed example for a scalar kind.
///
/// Examples are illustrative and deterministic; the same type always yields
/// the same JSON so generated templates are stable.
pub fn scalar_example(kind: ScalarKind, class: Option<&ClassDescriptor>) -> Json {
    match kind {
        ScalarKind::Boolean => json!(true),
        ScalarKind::Byte | ScalarKind::Short | ScalarKind::Int | ScalarKind::Long => json!(1),
        ScalarKind::BigInteger => json!(100),
        ScalarKind::Float | ScalarKind::Double => json!(1.0),
        ScalarKind::Char => json!("A"),
        ScalarKind::String => json!("string"),
        ScalarKind::BigDecimal => json!("100.00"),
        ScalarKind::Date => json!("2023-01-01T00:00:00Z"),
        ScalarKind::LocalDate => json!("2023-01-01"),
        ScalarKind::LocalDateTime => json!("2023-01-01T00:00:00"),
        ScalarKind::LocalTime => json!("12:00:00"),
        ScalarKind::Uuid => json!("00000000-0000-0000-0000-000000000000"),
        ScalarKind::Enum => class
            .and_then(|class| class.enum_constants.first())
            .map_or_else(|| json!("VALUE"), |constant| json!(constant)),
        ScalarKind::Object => json!("value"),
    }
}

/// Stand-in element for a sequence whose element type is unknown.
pub fn placeholder_element() -> Json {
    json!("element")
}

/// Stand-in for a map whose value type is unknown.
pub fn placeholder_map() -> Json {
    json!({ EXAMPLE_MAP_KEY: "value" })
}

/// Example key for a map with the given key kind: integral keys use `"1"`.
pub fn example_map_key(key: Option<ScalarKind>) -> &'static str {
    match key {
        Some(ScalarKind::Byte | ScalarKind::Short | ScalarKind::Int | ScalarKind::Long) => "1",
        _ => EXAMPLE_MAP_KEY,
    }
}
