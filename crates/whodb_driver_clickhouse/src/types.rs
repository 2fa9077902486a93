//! ClickHouse type-string grammar.
//!
//! The server describes columns with a composable grammar
//! (`Nullable(Array(LowCardinality(String)))`, `Map(String, Int32)`,
//! `Decimal64(4)`). Everything downstream (literal formatting, value
//! parsing, constraint extraction) works off the parsed form.

use whodb_core::{CoreError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum ChType {
    /// Wrapper: the inner type may be NULL.
    Nullable(Box<ChType>),
    /// Wrapper: dictionary-encoded storage, transparent to values.
    LowCardinality(Box<ChType>),
    /// Homogeneous sequence.
    Array(Box<ChType>),
    /// Heterogeneous positional record.
    Tuple(Vec<ChType>),
    /// Ordered mapping.
    Map(Box<ChType>, Box<ChType>),
    /// String-to-int bijection; width 8 or 16.
    Enum { width: u8, values: Vec<(String, i32)> },
    Decimal { precision: u32, scale: u32 },
    /// DateTime with optional sub-second scale (`DateTime64(3)`).
    DateTime { scale: Option<u32> },
    FixedString(usize),
    /// Everything else, by base name (`Int64`, `UUID`, `IPv6`, ...).
    Simple(String),
}

impl ChType {
    /// Strips modifier wrappers iteratively down to the core type.
    pub fn core_type(&self) -> &ChType {
        match self {
            ChType::Nullable(inner) | ChType::LowCardinality(inner) => inner.core_type(),
            other => other,
        }
    }

    /// Whether any wrapper level is `Nullable`.
    pub fn is_nullable(&self) -> bool {
        match self {
            ChType::Nullable(_) => true,
            ChType::LowCardinality(inner) => inner.is_nullable(),
            _ => false,
        }
    }

    /// Base name used for HTTP parameter binding (`{p1:Int64}`).
    pub fn binding_name(&self) -> String {
        match self.core_type() {
            ChType::Enum { .. } => "String".to_string(),
            ChType::Decimal { precision, scale } => format!("Decimal({precision}, {scale})"),
            ChType::DateTime { scale: Some(s) } => format!("DateTime64({s})"),
            ChType::DateTime { scale: None } => "DateTime".to_string(),
            ChType::FixedString(n) => format!("FixedString({n})"),
            ChType::Array(inner) => format!("Array({})", inner.binding_name()),
            ChType::Tuple(items) => format!(
                "Tuple({})",
                items
                    .iter()
                    .map(|t| t.binding_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            ChType::Map(key, value) => {
                format!("Map({}, {})", key.binding_name(), value.binding_name())
            }
            ChType::Simple(name) => name.clone(),
            ChType::Nullable(_) | ChType::LowCardinality(_) => unreachable!(),
        }
    }
}

/// Parses a ClickHouse type string.
pub fn parse_type(raw: &str) -> Result<ChType> {
    let trimmed = raw.trim();

    if let Some(inner) = strip_wrapper(trimmed, "Nullable") {
        return Ok(ChType::Nullable(Box::new(parse_type(inner)?)));
    }
    if let Some(inner) = strip_wrapper(trimmed, "LowCardinality") {
        return Ok(ChType::LowCardinality(Box::new(parse_type(inner)?)));
    }
    if let Some(inner) = strip_wrapper(trimmed, "Array") {
        return Ok(ChType::Array(Box::new(parse_type(inner)?)));
    }
    if let Some(inner) = strip_wrapper(trimmed, "Tuple") {
        let items = split_top_level(inner)?
            .into_iter()
            .map(|part| parse_type(strip_tuple_field_name(&part)))
            .collect::<Result<Vec<_>>>()?;
        return Ok(ChType::Tuple(items));
    }
    if let Some(inner) = strip_wrapper(trimmed, "Map") {
        let parts = split_top_level(inner)?;
        if parts.len() != 2 {
            return Err(CoreError::bad_request(format!(
                "malformed Map type: {raw}"
            )));
        }
        return Ok(ChType::Map(
            Box::new(parse_type(&parts[0])?),
            Box::new(parse_type(&parts[1])?),
        ));
    }
    if let Some(inner) = strip_wrapper(trimmed, "Enum8") {
        return Ok(ChType::Enum {
            width: 8,
            values: parse_enum_values(inner)?,
        });
    }
    if let Some(inner) = strip_wrapper(trimmed, "Enum16") {
        return Ok(ChType::Enum {
            width: 16,
            values: parse_enum_values(inner)?,
        });
    }
    if let Some(inner) = strip_wrapper(trimmed, "Decimal") {
        let parts = split_top_level(inner)?;
        if parts.len() != 2 {
            return Err(CoreError::bad_request(format!(
                "malformed Decimal type: {raw}"
            )));
        }
        return Ok(ChType::Decimal {
            precision: parse_number(&parts[0])?,
            scale: parse_number(&parts[1])?,
        });
    }
    // Sized decimals carry the precision in the name; only the scale is a
    // parameter.
    for (name, precision) in [
        ("Decimal32", 9u32),
        ("Decimal64", 18),
        ("Decimal128", 38),
        ("Decimal256", 76),
    ] {
        if let Some(inner) = strip_wrapper(trimmed, name) {
            return Ok(ChType::Decimal {
                precision,
                scale: parse_number(inner)?,
            });
        }
    }
    if let Some(inner) = strip_wrapper(trimmed, "DateTime64") {
        let parts = split_top_level(inner)?;
        let Some(scale) = parts.first() else {
            return Err(CoreError::bad_request(format!(
                "malformed DateTime64 type: {raw}"
            )));
        };
        return Ok(ChType::DateTime {
            scale: Some(parse_number(scale)?),
        });
    }
    if trimmed == "DateTime" || strip_wrapper(trimmed, "DateTime").is_some() {
        return Ok(ChType::DateTime { scale: None });
    }
    if let Some(inner) = strip_wrapper(trimmed, "FixedString") {
        return Ok(ChType::FixedString(parse_number(inner)? as usize));
    }

    if trimmed.is_empty() {
        return Err(CoreError::bad_request("empty type string"));
    }
    Ok(ChType::Simple(trimmed.to_string()))
}

fn strip_wrapper<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    let rest = raw.strip_prefix(name)?;
    let rest = rest.strip_prefix('(')?;
    rest.strip_suffix(')')
}

/// Tuple elements may be named (`Tuple(x Int32, y String)`).
fn strip_tuple_field_name(part: &str) -> &str {
    let trimmed = part.trim();
    match trimmed.split_once(' ') {
        Some((first, rest)) if !first.contains('(') && type_like(rest) => rest.trim(),
        _ => trimmed,
    }
}

fn type_like(candidate: &str) -> bool {
    candidate
        .trim()
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase())
}

fn parse_number(raw: &str) -> Result<u32> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::bad_request(format!("expected a number, got {raw}")))
}

/// `'red' = 1, 'green' = 2` -> [("red", 1), ("green", 2)].
fn parse_enum_values(inner: &str) -> Result<Vec<(String, i32)>> {
    let mut values = Vec::new();
    for part in split_top_level(inner)? {
        let Some((name_part, number_part)) = part.rsplit_once('=') else {
            return Err(CoreError::bad_request(format!(
                "malformed enum entry: {part}"
            )));
        };
        let name = name_part.trim();
        let name = name
            .strip_prefix('\'')
            .and_then(|n| n.strip_suffix('\''))
            .ok_or_else(|| CoreError::bad_request(format!("malformed enum entry: {part}")))?;
        let number: i32 = number_part.trim().parse().map_err(|_| {
            CoreError::bad_request(format!("malformed enum value: {part}"))
        })?;
        values.push((name.replace("\\'", "'"), number));
    }
    Ok(values)
}

/// Splits on top-level commas, respecting `()[]{}` nesting and
/// single-quoted regions. The splitter never breaks inside a literal, so
/// `Map(String, Tuple(Int8, Int8))` and `Enum8('a,b' = 1)` both split
/// correctly.
pub fn split_top_level(raw: &str) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quote {
            current.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            } else if c == '\'' {
                in_quote = false;
            }
            continue;
        }

        match c {
            '\'' => {
                in_quote = true;
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(CoreError::bad_request(format!(
                        "unbalanced brackets in: {raw}"
                    )));
                }
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    if depth != 0 || in_quote {
        return Err(CoreError::bad_request(format!(
            "unbalanced brackets or quotes in: {raw}"
        )));
    }

    let tail = current.trim();
    if !tail.is_empty() {
        parts.push(tail.to_string());
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_unwrap_iteratively() {
        let parsed = parse_type("LowCardinality(Nullable(String))").unwrap();
        assert!(parsed.is_nullable());
        assert_eq!(parsed.core_type(), &ChType::Simple("String".to_string()));
    }

    #[test]
    fn nested_containers_parse() {
        let parsed = parse_type("Array(Tuple(String, Int32))").unwrap();
        let ChType::Array(inner) = parsed else {
            panic!("expected array");
        };
        assert_eq!(
            *inner,
            ChType::Tuple(vec![
                ChType::Simple("String".to_string()),
                ChType::Simple("Int32".to_string()),
            ])
        );
    }

    #[test]
    fn map_parses_key_and_value() {
        let parsed = parse_type("Map(String, Nullable(Int64))").unwrap();
        let ChType::Map(key, value) = parsed else {
            panic!("expected map");
        };
        assert_eq!(*key, ChType::Simple("String".to_string()));
        assert!(value.is_nullable());
    }

    #[test]
    fn enum_values_parse_with_widths() {
        let parsed = parse_type("Enum8('red' = 1, 'green' = 2)").unwrap();
        assert_eq!(
            parsed,
            ChType::Enum {
                width: 8,
                values: vec![("red".to_string(), 1), ("green".to_string(), 2)],
            }
        );
        assert!(matches!(
            parse_type("Enum16('a' = -200)").unwrap(),
            ChType::Enum { width: 16, .. }
        ));
    }

    #[test]
    fn decimal_widths_derive_precision() {
        assert_eq!(
            parse_type("Decimal(10, 2)").unwrap(),
            ChType::Decimal {
                precision: 10,
                scale: 2
            }
        );
        assert_eq!(
            parse_type("Decimal64(4)").unwrap(),
            ChType::Decimal {
                precision: 18,
                scale: 4
            }
        );
        assert_eq!(
            parse_type("Decimal256(10)").unwrap(),
            ChType::Decimal {
                precision: 76,
                scale: 10
            }
        );
    }

    #[test]
    fn datetime64_keeps_scale() {
        assert_eq!(
            parse_type("DateTime64(3)").unwrap(),
            ChType::DateTime { scale: Some(3) }
        );
        assert_eq!(
            parse_type("DateTime").unwrap(),
            ChType::DateTime { scale: None }
        );
    }

    #[test]
    fn splitter_respects_nesting_and_quotes() {
        assert_eq!(
            split_top_level("String, Tuple(Int8, Int8), Int32").unwrap(),
            vec!["String", "Tuple(Int8, Int8)", "Int32"]
        );
        assert_eq!(
            split_top_level("'a,b' = 1, 'c' = 2").unwrap(),
            vec!["'a,b' = 1", "'c' = 2"]
        );
        assert!(split_top_level("Tuple(Int8").is_err());
    }

    #[test]
    fn named_tuple_fields_drop_their_names() {
        let parsed = parse_type("Tuple(x Int32, y String)").unwrap();
        assert_eq!(
            parsed,
            ChType::Tuple(vec![
                ChType::Simple("Int32".to_string()),
                ChType::Simple("String".to_string()),
            ])
        );
    }
}
