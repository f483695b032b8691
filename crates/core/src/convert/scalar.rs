//! Scalar coercions from JSON values to typed [`Value`]s.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::Value as Json;
use uuid::Uuid;

use crate::model::{Value, DATE_FORMAT, DATE_TIME_FORMAT, TIME_FORMAT};
use crate::types::{ClassDescriptor, ScalarKind};

const SQL_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FRACTIONAL_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Coerces one JSON scalar to `kind`.
///
/// Returns `None` when the JSON cannot represent a value of that kind, in
/// which case the caller passes the value through untyped.
pub(crate) fn coerce_scalar(
    json: &Json,
    kind: ScalarKind,
    class: Option<&ClassDescriptor>,
) -> Option<Value> {
    match kind {
        ScalarKind::Boolean => match json {
            Json::Bool(b) => Some(Value::Bool(*b)),
            Json::String(s) => s.trim().parse().ok().map(Value::Bool),
            _ => None,
        },
        // Narrowing wraps like a Java cast.
        ScalarKind::Byte => integral(json).map(|v| Value::Byte(v as i8)),
        ScalarKind::Short => integral(json).map(|v| Value::Short(v as i16)),
        ScalarKind::Int => integral(json).map(|v| Value::Int(v as i32)),
        ScalarKind::Long => integral(json).map(|v| Value::Long(v as i64)),
        ScalarKind::BigInteger => integral(json).map(Value::BigInteger),
        ScalarKind::Float => floating(json).map(|v| Value::Float(v as f32)),
        ScalarKind::Double => floating(json).map(Value::Double),
        ScalarKind::BigDecimal => decimal(json).map(Value::Decimal),
        ScalarKind::Char => match json {
            Json::String(s) => s.chars().next().map(Value::Char),
            _ => None,
        },
        ScalarKind::String => match json {
            Json::String(s) => Some(Value::String(s.clone())),
            Json::Number(n) => Some(Value::String(n.to_string())),
            Json::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        ScalarKind::Date => match json {
            Json::String(s) => parse_date(s).map(Value::Date),
            Json::Number(n) => n
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
                .map(Value::Date),
            _ => None,
        },
        ScalarKind::LocalDate => text(json)
            .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
            .map(Value::LocalDate),
        ScalarKind::LocalDateTime => text(json)
            .and_then(parse_local_date_time)
            .map(Value::LocalDateTime),
        ScalarKind::LocalTime => text(json)
            .and_then(|s| NaiveTime::parse_from_str(s, TIME_FORMAT).ok())
            .map(Value::LocalTime),
        ScalarKind::Uuid => text(json)
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(Value::Uuid),
        ScalarKind::Enum => {
            let constant = text(json)?;
            let known = class.map_or(true, |class| {
                class.enum_constants.is_empty()
                    || class.enum_constants.iter().any(|c| c == constant)
            });
            known.then(|| Value::Enum {
                type_name: class.map(|c| c.name.clone()).unwrap_or_default(),
                constant: constant.to_string(),
            })
        }
        ScalarKind::Object => Some(Value::from_json(json)),
    }
}

fn text(json: &Json) -> Option<&str> {
    json.as_str().map(str::trim)
}

/// The integral part of a JSON number, truncated toward zero.
fn integral(json: &Json) -> Option<i128> {
    match json {
        Json::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i128)),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn floating(json: &Json) -> Option<f64> {
    match json {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn decimal(json: &Json) -> Option<String> {
    match json {
        Json::Number(n) => Some(n.to_string()),
        Json::String(s) => {
            let s = s.trim();
            is_decimal_text(s).then(|| s.to_string())
        }
        _ => None,
    }
}

fn is_decimal_text(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    !(whole.is_empty() && fraction.is_empty())
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit())
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(local) = parse_local_date_time(s) {
        return Some(local.and_utc());
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

fn parse_local_date_time(s: &str) -> Option<NaiveDateTime> {
    [DATE_TIME_FORMAT, FRACTIONAL_DATE_TIME_FORMAT, SQL_DATE_TIME_FORMAT]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}
