use super::{TypeRef, TypeResolver};

/// The classification every shape/schema/coercion decision branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Scalar(ScalarKind),
    Array,
    List,
    Set,
    Map,
    /// A bean whose fields are enumerated through the type resolver.
    Composite,
}

/// Primitive, wrapper, string and the other value-like Java types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    BigDecimal,
    BigInteger,
    /// `java.util.Date`, `Timestamp`, `Instant` and zoned date-times.
    Date,
    LocalDate,
    LocalDateTime,
    LocalTime,
    Uuid,
    Enum,
    /// `java.lang.Object` and `Number`; no useful structure.
    Object,
}

impl TypeCategory {
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Arrays, lists and sets.
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Array | Self::List | Self::Set)
    }
}

fn scalar_kind(name: &str) -> Option<ScalarKind> {
    let kind = match name {
        "boolean" | "java.lang.Boolean" | "Boolean" => ScalarKind::Boolean,
        "byte" | "java.lang.Byte" | "Byte" => ScalarKind::Byte,
        "short" | "java.lang.Short" | "Short" => ScalarKind::Short,
        "int" | "java.lang.Integer" | "Integer" => ScalarKind::Int,
        "long" | "java.lang.Long" | "Long" => ScalarKind::Long,
        "float" | "java.lang.Float" | "Float" => ScalarKind::Float,
        "double" | "java.lang.Double" | "Double" => ScalarKind::Double,
        "char" | "java.lang.Character" | "Character" => ScalarKind::Char,
        "java.lang.String" | "String" | "java.lang.CharSequence" | "CharSequence" => {
            ScalarKind::String
        }
        "java.math.BigDecimal" | "BigDecimal" => ScalarKind::BigDecimal,
        "java.math.BigInteger" | "BigInteger" => ScalarKind::BigInteger,
        "java.util.Date"
        | "java.sql.Timestamp"
        | "Timestamp"
        | "java.time.Instant"
        | "Instant"
        | "java.time.OffsetDateTime"
        | "OffsetDateTime"
        | "java.time.ZonedDateTime"
        | "ZonedDateTime" => ScalarKind::Date,
        "java.time.LocalDate" | "LocalDate" | "java.sql.Date" => ScalarKind::LocalDate,
        "java.time.LocalDateTime" | "LocalDateTime" => ScalarKind::LocalDateTime,
        "java.time.LocalTime" | "LocalTime" | "java.sql.Time" => ScalarKind::LocalTime,
        "java.util.UUID" | "UUID" => ScalarKind::Uuid,
        "java.lang.Object" | "Object" | "java.lang.Number" | "Number" => ScalarKind::Object,
        _ => return None,
    };
    Some(kind)
}

fn container_category(name: &str) -> Option<TypeCategory> {
    let simple = name.strip_prefix("java.util.").unwrap_or(name);
    let category = match simple {
        "List" | "ArrayList" | "LinkedList" | "Collection" | "Queue" | "Deque"
        | "ArrayDeque" | "Vector" => TypeCategory::List,
        "java.lang.Iterable" | "Iterable" => TypeCategory::List,
        "Set" | "HashSet" | "LinkedHashSet" | "TreeSet" | "SortedSet" | "NavigableSet" => {
            TypeCategory::Set
        }
        "Map" | "HashMap" | "LinkedHashMap" | "TreeMap" | "SortedMap" | "NavigableMap"
        | "Hashtable" | "Properties" | "concurrent.ConcurrentHashMap" => TypeCategory::Map,
        _ => return None,
    };
    Some(category)
}

impl TypeRef {
    /// Classifies this type. Well-known JDK names are recognised directly,
    /// enums need the resolver, and anything else is a composite.
    pub fn category(&self, types: &dyn TypeResolver) -> TypeCategory {
        if self.is_array() {
            return TypeCategory::Array;
        }
        if let Some(kind) = scalar_kind(&self.name) {
            return TypeCategory::Scalar(kind);
        }
        if let Some(category) = container_category(&self.name) {
            return category;
        }
        match types.resolve_type(&self.name) {
            Some(class) if class.is_enum() => TypeCategory::Scalar(ScalarKind::Enum),
            _ => TypeCategory::Composite,
        }
    }

    pub fn is_map_like(&self) -> bool {
        !self.is_array() && container_category(&self.name) == Some(TypeCategory::Map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassDescriptor, NoTypes, StaticTypes};

    fn category(text: &str) -> TypeCategory {
        TypeRef::parse(text).unwrap().category(&NoTypes)
    }

    #[test]
    fn classifies_jdk_types() {
        assert_eq!(category("int"), TypeCategory::Scalar(ScalarKind::Int));
        assert_eq!(category("java.lang.String"), TypeCategory::Scalar(ScalarKind::String));
        assert_eq!(category("java.sql.Date"), TypeCategory::Scalar(ScalarKind::LocalDate));
        assert_eq!(category("java.time.Instant"), TypeCategory::Scalar(ScalarKind::Date));
        assert_eq!(category("int[]"), TypeCategory::Array);
        assert_eq!(category("java.util.List<java.lang.Long>"), TypeCategory::List);
        assert_eq!(category("java.util.HashSet<String>"), TypeCategory::Set);
        assert_eq!(category("java.util.Map<String, Object>"), TypeCategory::Map);
        assert_eq!(category("com.example.Blog"), TypeCategory::Composite);
    }

    #[test]
    fn enums_need_the_resolver() {
        let types = StaticTypes::new().with(ClassDescriptor::enumeration(
            "com.example.Status",
            vec!["ACTIVE".into(), "CLOSED".into()],
        ));
        let ty = TypeRef::named("com.example.Status");
        assert_eq!(ty.category(&types), TypeCategory::Scalar(ScalarKind::Enum));
        assert_eq!(ty.category(&NoTypes), TypeCategory::Composite);
    }
}
