use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// A typed parameter value.
///
/// Mirrors the Java values a mapper statement would receive at runtime.
/// Numeric variants keep their declared width so that rendering and
/// arithmetic behave like the boxed Java type would.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInteger(i128),
    /// Decimal text, kept verbatim so `100.00` renders as written.
    Decimal(String),
    /// A JSON number for which no target type was known.
    Number(serde_json::Number),
    String(String),
    Date(DateTime<Utc>),
    LocalDate(NaiveDate),
    LocalDateTime(NaiveDateTime),
    LocalTime(NaiveTime),
    Uuid(Uuid),
    Enum { type_name: String, constant: String },
    List(Vec<Value>),
    Set(Vec<Value>),
    Array(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Byte(_)
                | Self::Short(_)
                | Self::Int(_)
                | Self::Long(_)
                | Self::Float(_)
                | Self::Double(_)
                | Self::BigInteger(_)
                | Self::Decimal(_)
                | Self::Number(_)
        )
    }

    /// True for numbers without a fractional part in their type.
    pub fn is_integral(&self) -> bool {
        match self {
            Self::Byte(_) | Self::Short(_) | Self::Int(_) | Self::Long(_) | Self::BigInteger(_) => {
                true
            }
            Self::Number(n) => n.is_i64() || n.is_u64(),
            _ => false,
        }
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String(_) | Self::Char(_))
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Byte(v) => Some(*v as i128),
            Self::Short(v) => Some(*v as i128),
            Self::Int(v) => Some(*v as i128),
            Self::Long(v) => Some(*v as i128),
            Self::BigInteger(v) => Some(*v),
            Self::Number(n) => n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            Self::Decimal(text) => text.parse().ok(),
            Self::Number(n) => n.as_f64(),
            other => other.as_i128().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a list, set, or array value.
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Set(items) | Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Truthiness used for `test` attributes.
    ///
    /// Booleans are taken as-is, numbers are true when nonzero, strings when
    /// non-empty, collections when they have elements. `null` is false and
    /// any other value is true.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::String(s) => !s.is_empty(),
            Self::List(items) | Self::Set(items) | Self::Array(items) => !items.is_empty(),
            number if number.is_numeric() => number.as_f64().map_or(true, |v| v != 0.0),
            _ => true,
        }
    }

    /// Short name of the Java type this value stands for, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "Boolean",
            Self::Char(_) => "Character",
            Self::Byte(_) => "Byte",
            Self::Short(_) => "Short",
            Self::Int(_) => "Integer",
            Self::Long(_) => "Long",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::BigInteger(_) => "BigInteger",
            Self::Decimal(_) => "BigDecimal",
            Self::Number(_) => "Number",
            Self::String(_) => "String",
            Self::Date(_) => "Date",
            Self::LocalDate(_) => "LocalDate",
            Self::LocalDateTime(_) => "LocalDateTime",
            Self::LocalTime(_) => "LocalTime",
            Self::Uuid(_) => "UUID",
            Self::Enum { .. } => "Enum",
            Self::List(_) => "List",
            Self::Set(_) => "Set",
            Self::Array(_) => "Array",
            Self::Map(_) => "Map",
        }
    }

    /// Renders the value as an inlined SQL literal for `#{}` placeholders.
    ///
    /// This is where the preview departs from a real execution: MyBatis would
    /// bind a `?` parameter, the preview splices a literal instead. Strings and
    /// other textual values are single-quoted with embedded quotes doubled,
    /// numbers and booleans are written bare, `null` becomes `NULL`.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(b) => b.to_string(),
            number if number.is_numeric() => number.to_string(),
            other => quote_sql(&other.to_string()),
        }
    }

    /// Infers a value from JSON alone, with no target type.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => Self::Number(n.clone()),
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(fields) => Self::Map(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Serializes the value back into the loose JSON representation.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Byte(_) | Self::Short(_) | Self::Int(_) | Self::Long(_) => {
                self.as_i128().map_or(Json::Null, |v| Json::from(v as i64))
            }
            Self::BigInteger(v) => match i64::try_from(*v) {
                Ok(small) => Json::from(small),
                Err(_) => Json::String(v.to_string()),
            },
            Self::Float(v) => float_json(*v as f64),
            Self::Double(v) => float_json(*v),
            Self::Decimal(text) => text
                .parse::<serde_json::Number>()
                .map(Json::Number)
                .unwrap_or_else(|_| Json::String(text.clone())),
            Self::Number(n) => Json::Number(n.clone()),
            Self::List(items) | Self::Set(items) | Self::Array(items) => {
                Json::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Map(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            other => Json::String(other.to_string()),
        }
    }
}

fn float_json(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

pub(crate) fn quote_sql(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Writes a floating point number the way Java's `toString` does for
/// ordinary magnitudes: whole numbers keep a trailing `.0`.
fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        write!(f, "{:.1}", v)
    } else {
        write!(f, "{}", v)
    }
}

fn write_joined<'a, I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator<Item = &'a Value>,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// The raw string form, as Java's `String.valueOf` would print it.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Char(c) => write!(f, "{}", c),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Short(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Long(v) => write!(f, "{}", v),
            Self::Float(v) => write_float(f, *v as f64),
            Self::Double(v) => write_float(f, *v),
            Self::BigInteger(v) => write!(f, "{}", v),
            Self::Decimal(text) => f.write_str(text),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => f.write_str(s),
            Self::Date(d) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Self::LocalDate(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::LocalDateTime(d) => write!(f, "{}", d.format(DATE_TIME_FORMAT)),
            Self::LocalTime(t) => write!(f, "{}", t.format(TIME_FORMAT)),
            Self::Uuid(u) => write!(f, "{}", u),
            Self::Enum { constant, .. } => f.write_str(constant),
            Self::List(items) | Self::Set(items) | Self::Array(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Self::Map(fields) => {
                f.write_str("{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.truthy());
        assert!(!Value::Int(0).truthy());
        assert!(Value::Double(0.5).truthy());
        assert!(!Value::string("").truthy());
        assert!(Value::string("x").truthy());
        assert!(!Value::List(vec![]).truthy());
        assert!(Value::Array(vec![Value::Null]).truthy());
        assert!(Value::Map(IndexMap::new()).truthy());
        assert!(!Value::Decimal("0.00".into()).truthy());
    }

    #[test]
    fn sql_literals() {
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
        assert_eq!(Value::Int(30).to_sql_literal(), "30");
        assert_eq!(Value::Bool(true).to_sql_literal(), "true");
        assert_eq!(Value::string("O'Brien").to_sql_literal(), "'O''Brien'");
        assert_eq!(Value::Decimal("100.00".into()).to_sql_literal(), "100.00");
        assert_eq!(Value::Double(1.0).to_sql_literal(), "1.0");
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(Value::LocalDate(day).to_sql_literal(), "'2024-01-01'");
    }

    #[test]
    fn display_matches_java_collections() {
        let list = Value::from(vec![1, 2, 3]);
        assert_eq!(list.to_string(), "[1, 2, 3]");

        let mut fields = IndexMap::new();
        fields.insert("a".to_string(), Value::Int(1));
        fields.insert("b".to_string(), Value::string("x"));
        assert_eq!(Value::Map(fields).to_string(), "{a=1, b=x}");
    }

    #[test]
    fn untyped_json_inference() {
        let value = Value::from_json(&json!({"ids": [1, 2], "name": "Alice", "gone": null}));
        let Value::Map(fields) = &value else {
            panic!("expected a map, got {:?}", value);
        };
        assert!(matches!(fields["ids"], Value::List(ref items) if items.len() == 2));
        assert_eq!(fields["name"], Value::string("Alice"));
        assert!(fields["gone"].is_null());
        assert_eq!(value.to_json(), json!({"ids": [1, 2], "name": "Alice", "gone": null}));
    }
}
