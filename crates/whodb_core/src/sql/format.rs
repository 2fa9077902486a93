//! Default result-cell formatting shared by the relational plugins.
//!
//! Dialects with richer type systems override per column (see the
//! ClickHouse plugin); everything else lands on these conventions:
//! numeric values keep their canonical decimal text, timestamps render as
//! `YYYY-MM-DD HH:MM:SS`, pure dates as `YYYY-MM-DD`, bytes as `0x`-hex,
//! booleans as `true`/`false`, and NULL as the empty string.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub fn format_bool(value: bool) -> String {
    value.to_string()
}

pub fn format_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

pub fn format_timestamp(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

/// Canonicalizes a floating-point cell: integral values drop the trailing
/// `.0` the driver may attach, everything else keeps Rust's shortest
/// round-trippable form.
pub fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_format_as_prefixed_hex() {
        assert_eq!(format_bytes(&[0x00, 0xff, 0x10]), "0x00ff10");
    }

    #[test]
    fn floats_drop_integral_fraction() {
        assert_eq!(format_float(3.0), "3");
        assert_eq!(format_float(3.25), "3.25");
    }

    #[test]
    fn timestamp_format_is_second_precision() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(format_timestamp(dt), "2024-01-02 03:04:05");
    }
}
