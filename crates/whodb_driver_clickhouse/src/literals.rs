//! Literal formatting and parsing for ClickHouse compound values.
//!
//! Writing side: typed values render into the literal grammar the server
//! accepts (`[1, 2, 3]`, `('hello', 42, 3.14)`, `{'k': 1}`). Reading side:
//! user-entered literals parse recursively against the declared type into
//! typed values, so malformed input fails before any SQL is built.

use crate::types::{ChType, split_top_level};
use whodb_core::{CoreError, Result};

/// A typed ClickHouse value produced by `parse_value`.
#[derive(Debug, Clone, PartialEq)]
pub enum ChValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Array(Vec<ChValue>),
    Tuple(Vec<ChValue>),
    Map(Vec<(ChValue, ChValue)>),
}

/// Parses a user-entered literal against the declared type.
pub fn parse_value(raw: &str, declared: &ChType) -> Result<ChValue> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return Ok(ChValue::Null);
    }

    match declared.core_type() {
        ChType::Array(element) => {
            let inner = strip_delimiters(raw, '[', ']')
                .ok_or_else(|| CoreError::bad_request(format!("malformed array: {raw}")))?;
            let elements = split_elements(inner)?
                .iter()
                .map(|part| parse_value(part, element))
                .collect::<Result<Vec<_>>>()?;
            Ok(ChValue::Array(elements))
        }
        ChType::Tuple(items) => {
            let inner = strip_delimiters(raw, '(', ')')
                .ok_or_else(|| CoreError::bad_request(format!("malformed tuple: {raw}")))?;
            let parts = split_elements(inner)?;
            if parts.len() != items.len() {
                return Err(CoreError::bad_request(format!(
                    "tuple has {} elements, type expects {}",
                    parts.len(),
                    items.len()
                )));
            }
            let elements = parts
                .iter()
                .zip(items)
                .map(|(part, ty)| parse_value(part, ty))
                .collect::<Result<Vec<_>>>()?;
            Ok(ChValue::Tuple(elements))
        }
        ChType::Map(key_type, value_type) => {
            let inner = strip_delimiters(raw, '{', '}')
                .ok_or_else(|| CoreError::bad_request(format!("malformed map: {raw}")))?;
            let mut entries = Vec::new();
            for part in split_elements(inner)? {
                let Some((key_part, value_part)) = split_map_entry(&part) else {
                    return Err(CoreError::bad_request(format!(
                        "malformed map entry: {part}"
                    )));
                };
                entries.push((
                    parse_value(&key_part, key_type)?,
                    parse_value(&value_part, value_type)?,
                ));
            }
            Ok(ChValue::Map(entries))
        }
        core => parse_scalar(raw, core),
    }
}

fn parse_scalar(raw: &str, core: &ChType) -> Result<ChValue> {
    let unquoted = unquote(raw);

    match core {
        ChType::Enum { values, .. } => {
            if values.iter().any(|(name, _)| name == &unquoted) {
                return Ok(ChValue::Str(unquoted));
            }
            if let Ok(number) = unquoted.parse::<i32>() {
                if values.iter().any(|(_, v)| *v == number) {
                    return Ok(ChValue::Int(i64::from(number)));
                }
            }
            Err(CoreError::bad_request(format!(
                "value {raw} is not a member of the enum"
            )))
        }
        ChType::Decimal { .. } => {
            unquoted
                .parse::<f64>()
                .map_err(|_| CoreError::bad_request(format!("invalid decimal: {raw}")))?;
            // Keep the text form so precision survives.
            Ok(ChValue::Str(unquoted))
        }
        ChType::DateTime { .. } | ChType::FixedString(_) => Ok(ChValue::Str(unquoted)),
        ChType::Simple(name) => parse_simple_scalar(&unquoted, raw, name),
        // Wrappers were stripped by the caller; containers handled above.
        _ => Err(CoreError::bad_request(format!(
            "cannot parse {raw} as a scalar"
        ))),
    }
}

/// Scalar dispatch keyed on the base type name. This is the static
/// rendering of a reflective sized-integer switch: each branch constructs
/// the native value the binding layer expects.
fn parse_simple_scalar(unquoted: &str, raw: &str, name: &str) -> Result<ChValue> {
    match name {
        "Int8" | "Int16" | "Int32" | "Int64" => unquoted
            .parse::<i64>()
            .map(ChValue::Int)
            .map_err(|_| CoreError::bad_request(format!("invalid {name}: {raw}"))),
        "UInt8" | "UInt16" | "UInt32" | "UInt64" => unquoted
            .parse::<u64>()
            .map(ChValue::UInt)
            .map_err(|_| CoreError::bad_request(format!("invalid {name}: {raw}"))),
        "Int128" | "Int256" | "UInt128" | "UInt256" => {
            // Wider than native integers; validated digit-wise and carried
            // as text.
            let body = unquoted.strip_prefix('-').unwrap_or(unquoted);
            if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit()) {
                return Err(CoreError::bad_request(format!("invalid {name}: {raw}")));
            }
            Ok(ChValue::Str(unquoted.to_string()))
        }
        "Float32" | "Float64" => unquoted
            .parse::<f64>()
            .map(ChValue::Float)
            .map_err(|_| CoreError::bad_request(format!("invalid {name}: {raw}"))),
        "Bool" => match unquoted.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(ChValue::Bool(true)),
            "false" | "0" => Ok(ChValue::Bool(false)),
            _ => Err(CoreError::bad_request(format!("invalid Bool: {raw}"))),
        },
        _ => Ok(ChValue::Str(unquoted.to_string())),
    }
}

/// Renders a typed value into the literal grammar. Strings are
/// single-quoted; map keys sort lexically.
pub fn format_literal(value: &ChValue) -> String {
    match value {
        ChValue::Null => "NULL".to_string(),
        ChValue::Bool(b) => b.to_string(),
        ChValue::Int(i) => i.to_string(),
        ChValue::UInt(u) => u.to_string(),
        ChValue::Float(f) => f.to_string(),
        ChValue::Str(s) => quote(s),
        ChValue::Array(items) => {
            let rendered: Vec<String> = items.iter().map(format_literal).collect();
            format!("[{}]", rendered.join(", "))
        }
        ChValue::Tuple(items) => {
            let rendered: Vec<String> = items.iter().map(format_literal).collect();
            format!("({})", rendered.join(", "))
        }
        ChValue::Map(entries) => {
            let mut sorted: Vec<&(ChValue, ChValue)> = entries.iter().collect();
            sorted.sort_by_key(|(k, _)| format_literal(k));
            let rendered: Vec<String> = sorted
                .iter()
                .map(|(k, v)| format!("{}: {}", format_literal(k), format_literal(v)))
                .collect();
            format!("{{{}}}", rendered.join(", "))
        }
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        trimmed[1..trimmed.len() - 1]
            .replace("\\'", "'")
            .replace("\\\\", "\\")
    } else {
        trimmed.to_string()
    }
}

fn strip_delimiters(raw: &str, open: char, close: char) -> Option<&str> {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix(open)?;
    stripped.strip_suffix(close)
}

/// Splits container elements on top-level commas; empty input means an
/// empty container, not one empty element.
fn split_elements(inner: &str) -> Result<Vec<String>> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(inner)
}

/// Splits `'key': value` at the top-level colon, respecting quotes and
/// nesting.
fn split_map_entry(part: &str) -> Option<(String, String)> {
    let mut depth = 0i32;
    let mut in_quote = false;
    let chars: Vec<char> = part.chars().collect();
    let mut index = 0;

    while index < chars.len() {
        let c = chars[index];
        if in_quote {
            if c == '\\' {
                index += 1;
            } else if c == '\'' {
                in_quote = false;
            }
        } else {
            match c {
                '\'' => in_quote = true,
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                ':' if depth == 0 => {
                    let key: String = chars[..index].iter().collect();
                    let value: String = chars[index + 1..].iter().collect();
                    return Some((key.trim().to_string(), value.trim().to_string()));
                }
                _ => {}
            }
        }
        index += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_type;

    fn round_trip(raw: &str, type_str: &str) -> String {
        let ty = parse_type(type_str).unwrap();
        format_literal(&parse_value(raw, &ty).unwrap())
    }

    #[test]
    fn array_round_trips() {
        assert_eq!(round_trip("[1, 2, 3]", "Array(Int32)"), "[1, 2, 3]");
        assert_eq!(
            round_trip("['a', 'b']", "Array(String)"),
            "['a', 'b']"
        );
        assert_eq!(round_trip("[]", "Array(Int32)"), "[]");
    }

    #[test]
    fn tuple_round_trips_with_mixed_types() {
        assert_eq!(
            round_trip("('hello', 42, 3.14)", "Tuple(String, Int32, Float64)"),
            "('hello', 42, 3.14)"
        );
    }

    #[test]
    fn map_keys_sort_lexically() {
        assert_eq!(
            round_trip("{'key2': 20, 'key1': 10}", "Map(String, Int32)"),
            "{'key1': 10, 'key2': 20}"
        );
    }

    #[test]
    fn nested_containers_parse_recursively() {
        assert_eq!(
            round_trip(
                "[('x', [1, 2]), ('y', [])]",
                "Array(Tuple(String, Array(Int8)))"
            ),
            "[('x', [1, 2]), ('y', [])]"
        );
    }

    #[test]
    fn quoted_commas_do_not_split_elements() {
        assert_eq!(
            round_trip("['a,b', 'c']", "Array(String)"),
            "['a,b', 'c']"
        );
    }

    #[test]
    fn tuple_arity_is_enforced() {
        let ty = parse_type("Tuple(String, Int32)").unwrap();
        assert!(parse_value("('only one')", &ty).is_err());
    }

    #[test]
    fn scalars_type_check() {
        let int32 = parse_type("Int32").unwrap();
        assert_eq!(parse_value("42", &int32).unwrap(), ChValue::Int(42));
        assert!(parse_value("forty-two", &int32).is_err());

        let uint8 = parse_type("UInt8").unwrap();
        assert!(parse_value("-1", &uint8).is_err());

        let bool_ty = parse_type("Bool").unwrap();
        assert_eq!(parse_value("true", &bool_ty).unwrap(), ChValue::Bool(true));
    }

    #[test]
    fn enum_accepts_members_only() {
        let ty = parse_type("Enum8('red' = 1, 'green' = 2)").unwrap();
        assert_eq!(
            parse_value("red", &ty).unwrap(),
            ChValue::Str("red".to_string())
        );
        assert_eq!(parse_value("2", &ty).unwrap(), ChValue::Int(2));
        assert!(parse_value("blue", &ty).is_err());
    }

    #[test]
    fn big_integers_stay_textual() {
        let ty = parse_type("Int128").unwrap();
        assert_eq!(
            parse_value("170141183460469231731687303715884105727", &ty).unwrap(),
            ChValue::Str("170141183460469231731687303715884105727".to_string())
        );
        assert!(parse_value("12x4", &ty).is_err());
    }

    #[test]
    fn strings_escape_embedded_quotes() {
        let ty = parse_type("String").unwrap();
        let parsed = parse_value("it's", &ty).unwrap();
        assert_eq!(format_literal(&parsed), "'it\\'s'");
    }

    #[test]
    fn nullable_wrapper_is_transparent() {
        let ty = parse_type("Nullable(Int32)").unwrap();
        assert_eq!(parse_value("7", &ty).unwrap(), ChValue::Int(7));
        assert_eq!(parse_value("", &ty).unwrap(), ChValue::Null);
    }
}
