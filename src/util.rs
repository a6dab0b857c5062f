// Parsing and formatting helpers.
//
// CSV cells arrive as loose strings; everything past the loader works with
// typed values. Formatting only happens at the console/CSV edge.
use crate::metrics::Measure;
use num_format::{Locale, ToFormattedString};

/// Parse a CSV cell into `f64`, forgiving the usual export noise.
///
/// - Trims whitespace.
/// - Rejects values with letters other than an exponent marker (`NaN`,
///   `n/a`, `inf`), so `4.5e6` still parses.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    // Years sometimes come through as `2010.0` after a spreadsheet round trip.
    s.parse::<i32>()
        .ok()
        .or_else(|| s.strip_suffix(".0").and_then(|t| t.parse::<i32>().ok()))
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus `1,234,567.89` style grouping of the integer part.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_measure(m: Measure, decimals: usize) -> String {
    match m.value() {
        Some(v) => format_number(v, decimals),
        None => "n/a".to_string(),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
