//! MyBatis' built-in type aliases for `parameterType` attributes.

/// Expands a MyBatis type alias to its qualified Java type.
///
/// Matching is case-insensitive, like MyBatis' alias registry. Array
/// suffixes are preserved: `int[]` is `java.lang.Integer[]` while `_int[]`
/// is the primitive `int[]`. Names that are not aliases are returned
/// unchanged.
pub fn expand_alias(name: &str) -> String {
    let name = name.trim();
    let (base, dims) = match name.find('[') {
        Some(idx) => (&name[..idx], &name[idx..]),
        None => (name, ""),
    };

    let expanded = match base.to_ascii_lowercase().as_str() {
        "string" => "java.lang.String",
        "byte" => "java.lang.Byte",
        "char" | "character" => "java.lang.Character",
        "long" => "java.lang.Long",
        "short" => "java.lang.Short",
        "int" | "integer" => "java.lang.Integer",
        "double" => "java.lang.Double",
        "float" => "java.lang.Float",
        "boolean" => "java.lang.Boolean",
        "_byte" => "byte",
        "_char" | "_character" => "char",
        "_long" => "long",
        "_short" => "short",
        "_int" | "_integer" => "int",
        "_double" => "double",
        "_float" => "float",
        "_boolean" => "boolean",
        "date" => "java.util.Date",
        "decimal" | "bigdecimal" => "java.math.BigDecimal",
        "biginteger" => "java.math.BigInteger",
        "object" => "java.lang.Object",
        "map" => "java.util.Map",
        "hashmap" => "java.util.HashMap",
        "list" => "java.util.List",
        "arraylist" => "java.util.ArrayList",
        "collection" => "java.util.Collection",
        "iterator" => "java.util.Iterator",
        _ => return name.to_string(),
    };

    format!("{}{}", expanded, dims)
}
