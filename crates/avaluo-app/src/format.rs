// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;
use time::macros::format_description;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidMoney,
    NegativeMoney,
    InvalidInt,
    InvalidFloat,
    InvalidWeight,
    InvalidYear,
    InvalidDate,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMoney => f.write_str("invalid money value"),
            Self::NegativeMoney => f.write_str("negative money value"),
            Self::InvalidInt => f.write_str("invalid integer value"),
            Self::InvalidFloat => f.write_str("invalid decimal value"),
            Self::InvalidWeight => f.write_str("invalid weight value"),
            Self::InvalidYear => f.write_str("invalid year value"),
            Self::InvalidDate => f.write_str("invalid date value"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";

/// Whole-dollar display used on comparable cards and the summary panel.
pub fn format_dollars(cents: i64) -> String {
    let (sign, cents) = normalize_sign(cents);
    format!("{sign}${}", comma_format(cents / 100))
}

pub fn format_signed_dollars(cents: i64) -> String {
    if cents > 0 {
        format!("+{}", format_dollars(cents))
    } else {
        format_dollars(cents)
    }
}

pub fn format_compact_dollars(cents: i64) -> String {
    let (sign, cents) = normalize_sign(cents);
    let dollars = (cents as f64) / 100.0;
    if dollars < 1000.0 {
        return format!("{sign}${dollars:.0}");
    }

    let (value, suffix) = if dollars < 1_000_000.0 {
        (dollars / 1000.0, "k")
    } else if dollars < 1_000_000_000.0 {
        (dollars / 1_000_000.0, "M")
    } else {
        (dollars / 1_000_000_000.0, "B")
    };

    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract().abs() < f64::EPSILON {
        format!("{sign}${rounded:.0}{suffix}")
    } else {
        format!("{sign}${rounded:.1}{suffix}")
    }
}

pub fn format_percent(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract().abs() < f64::EPSILON {
        format!("{rounded:.0}%")
    } else {
        format!("{rounded:.1}%")
    }
}

pub fn format_ratio_percent(ratio: f64) -> String {
    format_percent(ratio * 100.0)
}

pub fn format_weight(weight: f64) -> String {
    format!("{weight:.2}")
}

pub fn format_distance(miles: f64) -> String {
    format!("{miles:.1} mi")
}

pub fn format_date(value: Option<Date>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .expect("date format is valid")
}

pub fn parse_date(input: &str) -> ValidationResult<Date> {
    Date::parse(input.trim(), &format_description!("[year]-[month]-[day]"))
        .map_err(|_| ValidationError::InvalidDate)
}

/// Remote strings are rendered verbatim inside terminal cells; control
/// bytes would corrupt the screen, so they are dropped and newlines become
/// spaces.
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch == '\n' || ch == '\r' || ch == '\t' {
            if !out.ends_with(' ') {
                out.push(' ');
            }
        } else if !ch.is_control() {
            out.push(ch);
        }
    }
    out.trim().to_string()
}

pub fn parse_required_dollars(input: &str) -> ValidationResult<i64> {
    parse_dollars(input.trim())
}

pub fn parse_optional_dollars(input: &str) -> ValidationResult<Option<i64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_dollars(trimmed).map(Some)
}

/// Weight override input: empty clears the override, otherwise a
/// multiplier in (0, 10].
pub fn parse_weight_override(input: &str) -> ValidationResult<Option<f64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidWeight)?;
    if !value.is_finite() || value <= 0.0 || value > 10.0 {
        return Err(ValidationError::InvalidWeight);
    }
    Ok(Some(value))
}

pub fn parse_required_int(input: &str) -> ValidationResult<u32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidInt);
    }
    trimmed.parse::<u32>().map_err(|_| ValidationError::InvalidInt)
}

pub fn parse_optional_int(input: &str) -> ValidationResult<Option<u32>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_required_int(trimmed).map(Some)
}

pub fn parse_required_float(input: &str) -> ValidationResult<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidFloat);
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidFloat)?;
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidFloat);
    }
    Ok(value)
}

pub fn parse_optional_float(input: &str) -> ValidationResult<Option<f64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_required_float(trimmed).map(Some)
}

pub fn parse_optional_year(input: &str) -> ValidationResult<Option<i32>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value = trimmed
        .parse::<i32>()
        .map_err(|_| ValidationError::InvalidYear)?;
    if !(1800..=2100).contains(&value) {
        return Err(ValidationError::InvalidYear);
    }
    Ok(Some(value))
}

fn parse_dollars(input: &str) -> ValidationResult<i64> {
    let clean = input.replace(',', "");
    if clean.starts_with('-') {
        return Err(ValidationError::NegativeMoney);
    }

    let clean = clean.strip_prefix('$').unwrap_or(&clean);
    if clean.is_empty() {
        return Err(ValidationError::InvalidMoney);
    }

    let parts = clean.split('.').collect::<Vec<_>>();
    if parts.len() > 2 {
        return Err(ValidationError::InvalidMoney);
    }

    let whole = parse_digits(parts[0], true)?;
    if whole > i64::MAX / 100 {
        return Err(ValidationError::InvalidMoney);
    }

    let mut frac = 0i64;
    if parts.len() == 2 {
        if parts[1].len() > 2 {
            return Err(ValidationError::InvalidMoney);
        }
        frac = parse_digits(parts[1], false)?;
        if parts[1].len() == 1 {
            frac = frac.checked_mul(10).ok_or(ValidationError::InvalidMoney)?;
        }
    }

    whole
        .checked_mul(100)
        .and_then(|value| value.checked_add(frac))
        .ok_or(ValidationError::InvalidMoney)
}

fn parse_digits(input: &str, allow_empty: bool) -> ValidationResult<i64> {
    if input.is_empty() {
        if allow_empty {
            return Ok(0);
        }
        return Err(ValidationError::InvalidMoney);
    }
    if !input.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ValidationError::InvalidMoney);
    }
    input
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidMoney)
}

fn comma_format(value: i64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let mut chars = digits.chars().collect::<Vec<_>>();
    let mut count = 0usize;
    while let Some(ch) = chars.pop() {
        if count == 3 {
            out.push(',');
            count = 0;
        }
        out.push(ch);
        count += 1;
    }
    out.chars().rev().collect()
}

fn normalize_sign(cents: i64) -> (&'static str, i64) {
    if cents >= 0 {
        return ("", cents);
    }
    if cents == i64::MIN {
        ("-", i64::MAX)
    } else {
        ("-", -cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn dollars_render_with_commas() {
        assert_eq!(format_dollars(51_234_000), "$512,340");
        assert_eq!(format_dollars(-350_000), "-$3,500");
        assert_eq!(format_dollars(0), "$0");
    }

    #[test]
    fn signed_dollars_carry_an_explicit_plus() {
        assert_eq!(format_signed_dollars(310_000), "+$3,100");
        assert_eq!(format_signed_dollars(-310_000), "-$3,100");
        assert_eq!(format_signed_dollars(0), "$0");
    }

    #[test]
    fn compact_dollars_use_suffixes() {
        assert_eq!(format_compact_dollars(51_234_000), "$512.3k");
        assert_eq!(format_compact_dollars(120_000_000), "$1.2M");
        assert_eq!(format_compact_dollars(50_000), "$500");
    }

    #[test]
    fn percent_trims_trailing_zero() {
        assert_eq!(format_percent(97.0), "97%");
        assert_eq!(format_percent(82.46), "82.5%");
        assert_eq!(format_ratio_percent(0.97), "97%");
    }

    #[test]
    fn weight_input_rules() {
        assert_eq!(parse_weight_override(""), Ok(None));
        assert_eq!(parse_weight_override(" 1.5 "), Ok(Some(1.5)));
        assert_eq!(parse_weight_override("0"), Err(ValidationError::InvalidWeight));
        assert_eq!(parse_weight_override("-2"), Err(ValidationError::InvalidWeight));
        assert_eq!(parse_weight_override("11"), Err(ValidationError::InvalidWeight));
        assert_eq!(parse_weight_override("abc"), Err(ValidationError::InvalidWeight));
    }

    #[test]
    fn dollar_input_accepts_commas_and_symbols() {
        assert_eq!(parse_required_dollars("$512,340"), Ok(51_234_000));
        assert_eq!(parse_required_dollars("512340.5"), Ok(51_234_050));
        assert_eq!(parse_required_dollars("-5"), Err(ValidationError::NegativeMoney));
        assert_eq!(parse_optional_dollars("  "), Ok(None));
    }

    #[test]
    fn sanitize_strips_control_bytes() {
        assert_eq!(sanitize_text("12 Elm\x1b[31m St"), "12 Elm[31m St");
        assert_eq!(sanitize_text("line one\nline two"), "line one line two");
        assert_eq!(sanitize_text("  padded  "), "padded");
    }

    #[test]
    fn dates_render_iso() {
        assert_eq!(format_date(Some(date!(2026 - 04 - 15))), "2026-04-15");
        assert_eq!(format_date(None), "");
        assert_eq!(parse_date("2026-04-15"), Ok(date!(2026 - 04 - 15)));
        assert!(parse_date("04/15/2026").is_err());
    }

    #[test]
    fn year_bounds() {
        assert_eq!(parse_optional_year("1984"), Ok(Some(1984)));
        assert_eq!(parse_optional_year(""), Ok(None));
        assert_eq!(parse_optional_year("1512"), Err(ValidationError::InvalidYear));
    }
}
