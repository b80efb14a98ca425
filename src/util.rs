// Utility helpers for parsing and basic statistics.
//
// This module centralizes all the "dirty" CSV/number handling so the
// rest of the code can assume clean, typed values.
use num_format::{Locale, ToFormattedString};

/// Coerce a raw sales cell into a non-negative `f64`.
///
/// This is a total function: it never fails and never yields `NaN`.
///
/// - Missing or blank cells become `0.0`.
/// - The longest leading numeric prefix is used, so `"1.5M"` reads as `1.5`
///   and `"bad"` reads as `0.0`.
/// - Non-finite and negative results are clamped to `0.0`.
pub fn coerce_sales(s: Option<&str>) -> f64 {
    let Some(s) = s else {
        return 0.0;
    };
    let prefix = numeric_prefix(s.trim_start());
    match prefix.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// Whether a raw cell is a well-formed, non-negative number that coercion
/// reads verbatim. Used for load diagnostics only.
pub fn is_clean_sales(s: Option<&str>) -> bool {
    parse_f64_safe(s).is_some_and(|v| v.is_finite() && v >= 0.0)
}

/// Return the longest prefix of `s` that looks like a decimal literal:
/// optional sign, digits with an optional fraction, optional exponent.
fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0usize;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        // A lone "." after digits is still part of the literal ("5." == 5).
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return "";
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    &s[..end]
}

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (spaces, text).
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    s.parse::<f64>().ok()
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i32>().ok()
}

/// Release year of a title. Accepts `2006` and `2006.0`; anything else
/// (including `N/A`) is treated as unknown.
pub fn parse_year(s: Option<&str>) -> Option<i32> {
    parse_i32_safe(s).or_else(|| {
        let v = parse_f64_safe(s)?;
        if v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 {
            Some(v as i32)
        } else {
            None
        }
    })
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values, used for
    // counts in console messages (e.g., `16,598 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_missing_and_garbage() {
        assert_eq!(coerce_sales(None), 0.0);
        assert_eq!(coerce_sales(Some("")), 0.0);
        assert_eq!(coerce_sales(Some("   ")), 0.0);
        assert_eq!(coerce_sales(Some("bad")), 0.0);
        assert_eq!(coerce_sales(Some("N/A")), 0.0);
        assert_eq!(coerce_sales(Some(".")), 0.0);
    }

    #[test]
    fn test_coerce_numeric_prefix() {
        assert_eq!(coerce_sales(Some("1.5")), 1.5);
        assert_eq!(coerce_sales(Some(" 2.25 ")), 2.25);
        assert_eq!(coerce_sales(Some("1.5M")), 1.5);
        assert_eq!(coerce_sales(Some(".5")), 0.5);
        assert_eq!(coerce_sales(Some("5.")), 5.0);
        assert_eq!(coerce_sales(Some("1e2")), 100.0);
        assert_eq!(coerce_sales(Some("3e")), 3.0);
        assert_eq!(coerce_sales(Some("1,234")), 1.0);
    }

    #[test]
    fn test_coerce_clamps_negative_and_non_finite() {
        assert_eq!(coerce_sales(Some("-3")), 0.0);
        assert_eq!(coerce_sales(Some("1e400")), 0.0);
        assert_eq!(coerce_sales(Some("NaN")), 0.0);
        assert_eq!(coerce_sales(Some("Infinity")), 0.0);
    }

    #[test]
    fn test_is_clean_sales() {
        assert!(is_clean_sales(Some("0.41")));
        assert!(is_clean_sales(Some("0")));
        assert!(!is_clean_sales(Some("1.5M")));
        assert!(!is_clean_sales(Some("")));
        assert!(!is_clean_sales(None));
        assert!(!is_clean_sales(Some("-1")));
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year(Some("2006")), Some(2006));
        assert_eq!(parse_year(Some(" 1998 ")), Some(1998));
        assert_eq!(parse_year(Some("2006.0")), Some(2006));
        assert_eq!(parse_year(Some("N/A")), None);
        assert_eq!(parse_year(Some("2006.5")), None);
        assert_eq!(parse_year(None), None);
    }

    #[test]
    fn test_average() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(0.0, 1), "0.0");
        assert_eq!(format_number(-12.5, 1), "-12.5");
        assert_eq!(format_number(82.74, 0), "83");
    }

    #[test]
    fn test_format_int() {
        assert_eq!(format_int(16598u64), "16,598");
    }
}
