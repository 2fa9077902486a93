use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Typed intermediate between user-entered strings and driver bindings.
///
/// Plugins coerce incoming strings into this enum based on the declared
/// column type (`convert_string_value`), then lower each variant to their
/// driver's native parameter representation. Display formatting follows the
/// universal result conventions: NULL renders as the empty string so the
/// `Rows` cell grid never needs a separate null marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// JSON kept as raw text for exact round-trip preservation.
    Json(String),
    /// Decimal kept as text to preserve exact precision.
    Decimal(String),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Renders the value as a result cell string.
    pub fn as_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) | Value::Json(s) | Value::Decimal(s) => s.clone(),
            Value::Bytes(b) => format!("0x{}", hex_lower(b)),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.format("%H:%M:%S").to_string(),
        }
    }

    /// Parses a raw string into a typed value for a broad type category.
    ///
    /// Drivers that need finer distinctions (sized integers, dialect
    /// temporal grammars) refine the result themselves.
    pub fn parse_as(raw: &str, category: crate::metadata::TypeCategory) -> crate::Result<Value> {
        use crate::metadata::TypeCategory;

        if raw.is_empty() {
            return Ok(Value::Null);
        }

        match category {
            TypeCategory::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "t" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "f" | "0" | "no" => Ok(Value::Bool(false)),
                other => Err(crate::CoreError::bad_request(format!(
                    "invalid boolean value: {other}"
                ))),
            },
            TypeCategory::Numeric => {
                if let Ok(i) = raw.parse::<i64>() {
                    return Ok(Value::Int(i));
                }
                if raw.parse::<f64>().is_ok() {
                    // Preserve the textual form for exact decimals.
                    return Ok(Value::Decimal(raw.to_string()));
                }
                Err(crate::CoreError::bad_request(format!(
                    "invalid numeric value: {raw}"
                )))
            }
            TypeCategory::DateTime => parse_temporal(raw),
            TypeCategory::Json => Ok(Value::Json(raw.to_string())),
            TypeCategory::Text | TypeCategory::Other => Ok(Value::Text(raw.to_string())),
        }
    }
}

fn parse_temporal(raw: &str) -> crate::Result<Value> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Value::DateTime(dt.with_timezone(&Utc)));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(Value::DateTime(dt.and_utc()));
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Value::Date(d));
    }
    if let Ok(t) = NaiveTime::parse_from_str(raw, "%H:%M:%S") {
        return Ok(Value::Time(t));
    }
    Err(crate::CoreError::bad_request(format!(
        "invalid date/time value: {raw}"
    )))
}

fn hex_lower(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_display_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TypeCategory;

    #[test]
    fn null_renders_as_empty_string() {
        assert_eq!(Value::Null.as_display_string(), "");
    }

    #[test]
    fn bytes_render_with_0x_prefix() {
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).as_display_string(), "0xdead");
    }

    #[test]
    fn timestamps_use_canonical_format() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap()
            .and_utc();
        assert_eq!(
            Value::DateTime(dt).as_display_string(),
            "2024-03-09 14:05:00"
        );
    }

    #[test]
    fn numeric_parse_keeps_decimal_text() {
        assert_eq!(
            Value::parse_as("12.500", TypeCategory::Numeric).unwrap(),
            Value::Decimal("12.500".to_string())
        );
        assert_eq!(
            Value::parse_as("42", TypeCategory::Numeric).unwrap(),
            Value::Int(42)
        );
    }

    #[test]
    fn empty_string_parses_to_null() {
        assert_eq!(
            Value::parse_as("", TypeCategory::Text).unwrap(),
            Value::Null
        );
    }
}
