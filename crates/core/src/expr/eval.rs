use std::cmp::Ordering;

use super::parser::{BinaryOp, Expr, UnaryOp};
use super::{EvalError, ExpressionEvaluator};
use crate::context::VariableScope;
use crate::model::Value;

/// The built-in evaluator for the OGNL subset used in mapper files.
///
/// Unknown names evaluate to `null`. Reading a property, index or method
/// through `null` is an error, as it is in OGNL.
#[derive(Debug, Default, Clone, Copy)]
pub struct OgnlEvaluator;

impl ExpressionEvaluator for OgnlEvaluator {
    fn evaluate(&self, expression: &str, scope: &dyn VariableScope) -> Result<Value, EvalError> {
        let expr = Expr::parse(expression)?;
        eval(&expr, scope)
    }
}

fn eval(expr: &Expr, scope: &dyn VariableScope) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ident(name) => Ok(scope.lookup(name).cloned().unwrap_or(Value::Null)),
        Expr::List(items) => items
            .iter()
            .map(|item| eval(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Member { target, name } => property(eval(target, scope)?, name),
        Expr::Index { target, index } => {
            let target = eval(target, scope)?;
            let index = eval(index, scope)?;
            element(target, &index)
        }
        Expr::Call {
            target,
            method,
            args,
        } => {
            let target = eval(target, scope)?;
            let args = args
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call(target, method, &args)
        }
        Expr::Unary { op, operand } => {
            let operand = eval(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!operand.truthy())),
                UnaryOp::Neg => negate(operand),
            }
        }
        Expr::Binary { op, lhs, rhs } => match op {
            BinaryOp::And => {
                let lhs = eval(lhs, scope)?;
                Ok(Value::Bool(lhs.truthy() && eval(rhs, scope)?.truthy()))
            }
            BinaryOp::Or => {
                let lhs = eval(lhs, scope)?;
                Ok(Value::Bool(lhs.truthy() || eval(rhs, scope)?.truthy()))
            }
            op => {
                let lhs = eval(lhs, scope)?;
                let rhs = eval(rhs, scope)?;
                binary(*op, &lhs, &rhs)
            }
        },
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if eval(condition, scope)?.truthy() {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
    }
}

fn property(target: Value, name: &str) -> Result<Value, EvalError> {
    match target {
        Value::Null => Err(EvalError::NullTarget {
            member: name.to_string(),
        }),
        Value::Map(mut fields) => Ok(fields.swap_remove(name).unwrap_or(Value::Null)),
        Value::List(items) | Value::Set(items) | Value::Array(items) => match name {
            "size" | "length" => Ok(Value::Int(items.len() as i32)),
            "empty" | "isEmpty" => Ok(Value::Bool(items.is_empty())),
            _ => Err(EvalError::UnknownProperty {
                property: name.to_string(),
                type_name: "List",
            }),
        },
        Value::String(text) if name == "empty" => Ok(Value::Bool(text.is_empty())),
        Value::Enum { constant, .. } if name == "name" => Ok(Value::String(constant)),
        other => Err(EvalError::UnknownProperty {
            property: name.to_string(),
            type_name: other.type_name(),
        }),
    }
}

fn element(target: Value, index: &Value) -> Result<Value, EvalError> {
    match target {
        Value::Null => Err(EvalError::NullTarget {
            member: format!("[{}]", index),
        }),
        Value::Map(mut fields) => Ok(fields.swap_remove(&index.to_string()).unwrap_or(Value::Null)),
        Value::List(items) | Value::Set(items) | Value::Array(items) => {
            let Some(position) = index.as_i128() else {
                return Err(EvalError::TypeMismatch {
                    operator: "[]".to_string(),
                    left: "List",
                    right: index.type_name(),
                });
            };
            let len = items.len();
            usize::try_from(position)
                .ok()
                .and_then(|position| items.into_iter().nth(position))
                .ok_or(EvalError::IndexOutOfBounds {
                    index: position,
                    len,
                })
        }
        other => Err(EvalError::TypeMismatch {
            operator: "[]".to_string(),
            left: other.type_name(),
            right: index.type_name(),
        }),
    }
}

fn expect_args(method: &str, args: &[Value], count: usize) -> Result<(), EvalError> {
    if args.len() == count {
        Ok(())
    } else {
        Err(EvalError::BadArguments {
            method: method.to_string(),
            message: format!("expected {} argument(s), got {}", count, args.len()),
        })
    }
}

fn string_arg(method: &str, args: &[Value], position: usize) -> Result<String, EvalError> {
    match args.get(position) {
        Some(Value::Null) | None => Err(EvalError::BadArguments {
            method: method.to_string(),
            message: format!("argument {} must not be null", position + 1),
        }),
        Some(value) => Ok(value.to_string()),
    }
}

fn index_arg(method: &str, args: &[Value], position: usize) -> Result<usize, EvalError> {
    args.get(position)
        .and_then(Value::as_i128)
        .and_then(|index| usize::try_from(index).ok())
        .ok_or_else(|| EvalError::BadArguments {
            method: method.to_string(),
            message: format!("argument {} must be a non-negative integer", position + 1),
        })
}

fn call(target: Value, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    if target.is_null() {
        return Err(EvalError::NullTarget {
            member: format!("{}()", method),
        });
    }

    let unknown = |target: &Value| EvalError::UnknownMethod {
        method: method.to_string(),
        type_name: target.type_name(),
    };

    match method {
        "toString" => {
            expect_args(method, args, 0)?;
            Ok(Value::String(target.to_string()))
        }
        "equals" => {
            expect_args(method, args, 1)?;
            Ok(Value::Bool(loose_equals(&target, &args[0])))
        }
        _ => match &target {
            Value::String(text) => string_method(text, method, args)?.ok_or_else(|| unknown(&target)),
            Value::List(items) | Value::Set(items) | Value::Array(items) => match method {
                "size" | "length" => {
                    expect_args(method, args, 0)?;
                    Ok(Value::Int(items.len() as i32))
                }
                "isEmpty" => {
                    expect_args(method, args, 0)?;
                    Ok(Value::Bool(items.is_empty()))
                }
                "contains" => {
                    expect_args(method, args, 1)?;
                    Ok(Value::Bool(items.iter().any(|item| loose_equals(item, &args[0]))))
                }
                "get" => {
                    expect_args(method, args, 1)?;
                    element(target.clone(), &args[0])
                }
                "indexOf" => {
                    expect_args(method, args, 1)?;
                    let position = items.iter().position(|item| loose_equals(item, &args[0]));
                    Ok(Value::Int(position.map_or(-1, |p| p as i32)))
                }
                _ => Err(unknown(&target)),
            },
            Value::Map(fields) => match method {
                "size" => {
                    expect_args(method, args, 0)?;
                    Ok(Value::Int(fields.len() as i32))
                }
                "isEmpty" => {
                    expect_args(method, args, 0)?;
                    Ok(Value::Bool(fields.is_empty()))
                }
                "containsKey" => {
                    expect_args(method, args, 1)?;
                    Ok(Value::Bool(fields.contains_key(&args[0].to_string())))
                }
                "containsValue" => {
                    expect_args(method, args, 1)?;
                    Ok(Value::Bool(fields.values().any(|v| loose_equals(v, &args[0]))))
                }
                "get" => {
                    expect_args(method, args, 1)?;
                    Ok(fields.get(&args[0].to_string()).cloned().unwrap_or(Value::Null))
                }
                _ => Err(unknown(&target)),
            },
            Value::Enum { constant, .. } if method == "name" => {
                expect_args(method, args, 0)?;
                Ok(Value::String(constant.clone()))
            }
            _ => Err(unknown(&target)),
        },
    }
}

/// String methods; `Ok(None)` when `method` is not one of them.
fn string_method(text: &str, method: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    let value = match method {
        "length" => {
            expect_args(method, args, 0)?;
            Value::Int(text.chars().count() as i32)
        }
        "isEmpty" => {
            expect_args(method, args, 0)?;
            Value::Bool(text.is_empty())
        }
        "trim" => {
            expect_args(method, args, 0)?;
            Value::String(text.trim().to_string())
        }
        "toUpperCase" => {
            expect_args(method, args, 0)?;
            Value::String(text.to_uppercase())
        }
        "toLowerCase" => {
            expect_args(method, args, 0)?;
            Value::String(text.to_lowercase())
        }
        "contains" => {
            expect_args(method, args, 1)?;
            Value::Bool(text.contains(string_arg(method, args, 0)?.as_str()))
        }
        "startsWith" => {
            expect_args(method, args, 1)?;
            Value::Bool(text.starts_with(string_arg(method, args, 0)?.as_str()))
        }
        "endsWith" => {
            expect_args(method, args, 1)?;
            Value::Bool(text.ends_with(string_arg(method, args, 0)?.as_str()))
        }
        "equalsIgnoreCase" => {
            expect_args(method, args, 1)?;
            match &args[0] {
                Value::Null => Value::Bool(false),
                other => Value::Bool(text.to_lowercase() == other.to_string().to_lowercase()),
            }
        }
        "indexOf" => {
            expect_args(method, args, 1)?;
            let needle = string_arg(method, args, 0)?;
            let position = text
                .find(needle.as_str())
                .map_or(-1, |byte| text[..byte].chars().count() as i32);
            Value::Int(position)
        }
        "substring" => {
            if !(1..=2).contains(&args.len()) {
                expect_args(method, args, 2)?;
            }
            let chars: Vec<char> = text.chars().collect();
            let start = index_arg(method, args, 0)?;
            let end = match args.len() {
                1 => chars.len(),
                _ => index_arg(method, args, 1)?,
            };
            if start > end || end > chars.len() {
                return Err(EvalError::IndexOutOfBounds {
                    index: end.max(start) as i128,
                    len: chars.len(),
                });
            }
            Value::String(chars[start..end].iter().collect())
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn negate(value: Value) -> Result<Value, EvalError> {
    let negated = match &value {
        Value::Byte(v) => v.checked_neg().map(Value::Byte),
        Value::Short(v) => v.checked_neg().map(Value::Short),
        Value::Int(v) => v.checked_neg().map(Value::Int),
        Value::Long(v) => v.checked_neg().map(Value::Long),
        Value::BigInteger(v) => v.checked_neg().map(Value::BigInteger),
        Value::Float(v) => Some(Value::Float(-v)),
        Value::Double(v) => Some(Value::Double(-v)),
        Value::Decimal(text) => Some(Value::Decimal(match text.strip_prefix('-') {
            Some(positive) => positive.to_string(),
            None => format!("-{}", text),
        })),
        Value::Number(_) => value.as_f64().map(|v| match value.as_i128() {
            Some(int) => Value::BigInteger(-int),
            None => Value::Double(-v),
        }),
        _ => None,
    };
    negated.ok_or(EvalError::TypeMismatch {
        operator: "-".to_string(),
        left: value.type_name(),
        right: value.type_name(),
    })
}

fn mismatch(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::TypeMismatch {
        operator: op.symbol().to_string(),
        left: lhs.type_name(),
        right: rhs.type_name(),
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(loose_equals(lhs, rhs))),
        BinaryOp::Ne => Ok(Value::Bool(!loose_equals(lhs, rhs))),
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
            let ordering = compare(lhs, rhs).ok_or_else(|| mismatch(op, lhs, rhs))?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Gt => ordering == Ordering::Greater,
                BinaryOp::Le => ordering != Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::In | BinaryOp::NotIn => {
            let found = match rhs {
                Value::Map(fields) => fields.contains_key(&lhs.to_string()),
                other => other
                    .elements()
                    .ok_or_else(|| mismatch(op, lhs, rhs))?
                    .iter()
                    .any(|item| loose_equals(lhs, item)),
            };
            Ok(Value::Bool(found == (op == BinaryOp::In)))
        }
        BinaryOp::Add if lhs.is_textual() || rhs.is_textual() => {
            Ok(Value::String(format!("{}{}", lhs, rhs)))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, lhs, rhs)
        }
        BinaryOp::And | BinaryOp::Or => Ok(Value::Bool(match op {
            BinaryOp::And => lhs.truthy() && rhs.truthy(),
            _ => lhs.truthy() || rhs.truthy(),
        })),
    }
}

/// Numeric view of a value for comparisons: numbers as-is, numeric strings
/// parsed, and the empty string as zero.
fn numeric_view(value: &Value) -> Option<f64> {
    match value {
        Value::String(text) if text.trim().is_empty() => Some(0.0),
        Value::String(text) => text.trim().parse().ok(),
        Value::Char(c) => Some(*c as u32 as f64),
        other if other.is_numeric() => other.as_f64(),
        _ => None,
    }
}

/// OGNL-style equality: numbers compare by value, also against numeric
/// strings; characters, enums and strings compare by text.
pub(crate) fn loose_equals(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (l, r) if l.is_numeric() && r.is_numeric() => match (l.as_i128(), r.as_i128()) {
            (Some(a), Some(b)) => a == b,
            _ => l.as_f64() == r.as_f64(),
        },
        (l, r) if l.is_numeric() || r.is_numeric() => {
            let textual = |v: &Value| matches!(v, Value::String(_));
            if textual(l) || textual(r) {
                numeric_view(l).zip(numeric_view(r)).is_some_and(|(a, b)| a == b)
            } else {
                false
            }
        }
        (
            Value::String(_) | Value::Char(_) | Value::Enum { .. },
            Value::String(_) | Value::Char(_) | Value::Enum { .. },
        ) => lhs.to_string() == rhs.to_string(),
        (Value::List(a) | Value::Set(a) | Value::Array(a), Value::List(b) | Value::Set(b) | Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| loose_equals(x, y))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| loose_equals(value, other)))
        }
        (l, r) => l == r,
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Null, _) | (_, Value::Null) => None,
        (l, r) if l.is_numeric() && r.is_numeric() => match (l.as_i128(), r.as_i128()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => l.as_f64()?.partial_cmp(&r.as_f64()?),
        },
        (l, r) if l.is_numeric() || r.is_numeric() => {
            numeric_view(l)?.partial_cmp(&numeric_view(r)?)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Char(_) | Value::String(_), Value::Char(_) | Value::String(_)) => {
            Some(lhs.to_string().cmp(&rhs.to_string()))
        }
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::LocalDate(a), Value::LocalDate(b)) => Some(a.cmp(b)),
        (Value::LocalDateTime(a), Value::LocalDateTime(b)) => Some(a.cmp(b)),
        (Value::LocalTime(a), Value::LocalTime(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Width of the integral result, following Java's binary numeric promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum IntWidth {
    Int,
    Long,
    Big,
}

fn int_width(value: &Value) -> IntWidth {
    match value {
        Value::Byte(_) | Value::Short(_) | Value::Int(_) => IntWidth::Int,
        Value::Long(_) | Value::Number(_) => IntWidth::Long,
        _ => IntWidth::Big,
    }
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    if !(lhs.is_numeric() && rhs.is_numeric()) {
        return Err(mismatch(op, lhs, rhs));
    }

    if let (Some(a), Some(b)) = (lhs.as_i128(), rhs.as_i128()) {
        if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0 {
            return Err(EvalError::DivisionByZero);
        }
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div => a.checked_div(b),
            _ => a.checked_rem(b),
        }
        .ok_or(EvalError::TypeMismatch {
            operator: op.symbol().to_string(),
            left: "overflowing integer",
            right: "overflowing integer",
        })?;

        let value = match int_width(lhs).max(int_width(rhs)) {
            IntWidth::Int => i32::try_from(result).map(Value::Int).ok(),
            IntWidth::Long => i64::try_from(result).map(Value::Long).ok(),
            IntWidth::Big => None,
        };
        return Ok(value.unwrap_or(Value::BigInteger(result)));
    }

    let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else {
        return Err(mismatch(op, lhs, rhs));
    };
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    };
    Ok(match (lhs, rhs) {
        (Value::Float(_), Value::Float(_)) => Value::Float(result as f32),
        _ => Value::Double(result),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn scope() -> IndexMap<String, Value> {
        let mut author = IndexMap::new();
        author.insert("name".to_string(), Value::string("Ann"));

        let mut bindings = IndexMap::new();
        bindings.insert("name".to_string(), Value::string("Alice"));
        bindings.insert("age".to_string(), Value::Int(30));
        bindings.insert("empty".to_string(), Value::string(""));
        bindings.insert("ids".to_string(), Value::from(vec![1, 2, 3]));
        bindings.insert("author".to_string(), Value::Map(author));
        bindings.insert("status".to_string(), Value::Int(0));
        bindings
    }

    fn eval_str(expression: &str) -> Result<Value, EvalError> {
        OgnlEvaluator.evaluate(expression, &scope())
    }

    fn truthy(expression: &str) -> bool {
        eval_str(expression)
            .unwrap_or_else(|err| panic!("'{}' failed: {}", expression, err))
            .truthy()
    }

    #[test]
    fn null_checks_and_missing_names() {
        assert!(truthy("name != null"));
        assert!(truthy("missing == null"));
        assert!(!truthy("missing != null and missing != ''"));
    }

    #[test]
    fn word_operators_match_symbols() {
        assert!(truthy("age gte 18 and age lt 65"));
        assert!(truthy("age eq 30 or false"));
        assert!(truthy("not (age neq 30)"));
    }

    #[test]
    fn numbers_compare_with_numeric_strings() {
        assert!(truthy("age == '30'"));
        assert!(truthy("status == ''"));
        assert!(!truthy("name == 1"));
        assert!(truthy("1 == 1.0"));
    }

    #[test]
    fn collection_and_string_methods() {
        assert!(truthy("ids.size() == 3"));
        assert!(truthy("ids.size == 3"));
        assert!(truthy("!ids.isEmpty()"));
        assert!(truthy("ids.contains(2)"));
        assert!(truthy("2 in ids"));
        assert!(truthy("name.startsWith('Al') && name.length() == 5"));
        assert!(truthy("name.trim().toUpperCase() == 'ALICE'"));
        assert!(truthy("name.equalsIgnoreCase('alice')"));
        assert_eq!(eval_str("name.substring(1, 3)").unwrap(), Value::string("li"));
        assert_eq!(eval_str("name.indexOf('c')").unwrap(), Value::Int(3));
        assert_eq!(eval_str("ids[1]").unwrap(), Value::Int(2));
    }

    #[test]
    fn arithmetic_and_concatenation() {
        assert_eq!(eval_str("age + 1").unwrap(), Value::Int(31));
        assert_eq!(eval_str("age / 4").unwrap(), Value::Int(7));
        assert_eq!(eval_str("age / 4.0").unwrap(), Value::Double(7.5));
        assert_eq!(eval_str("'%' + name + '%'").unwrap(), Value::string("%Alice%"));
        assert_eq!(eval_str("'x' + missing").unwrap(), Value::string("xnull"));
        assert_eq!(eval_str("age / 0").unwrap_err(), EvalError::DivisionByZero);
    }

    #[test]
    fn nested_properties_and_ternary() {
        assert_eq!(eval_str("author.name").unwrap(), Value::string("Ann"));
        assert_eq!(eval_str("author.missing").unwrap(), Value::Null);
        assert_eq!(
            eval_str("age > 18 ? 'adult' : 'minor'").unwrap(),
            Value::string("adult")
        );
    }

    #[test]
    fn navigating_through_null_fails() {
        let err = eval_str("missing.name").unwrap_err();
        assert!(err.is_null_target());
        assert!(eval_str("missing.size()").unwrap_err().is_null_target());
    }

    #[test]
    fn ordering_null_is_a_type_error() {
        assert!(matches!(
            eval_str("missing > 1").unwrap_err(),
            EvalError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn unknown_methods_are_reported() {
        assert!(matches!(
            eval_str("name.frobnicate()").unwrap_err(),
            EvalError::UnknownMethod { ref method, .. } if method == "frobnicate"
        ));
    }
}
