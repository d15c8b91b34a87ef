//! Parsing and formatting of the single-clock interval-string syntax:
//! `"[lo, hi]" | "[lo, hi)" | "(lo, hi]" | "(lo, hi)"`, with `"-"`/`"+"`
//! sentinels for the unbounded ends.

use dta_core::rational::Rational;

use crate::errors::FormatError;

/// A parsed bound: `None` means unbounded on that side (`"-"` below the
/// interval, `"+"` above it); `Some((value, closed))` otherwise.
pub type ParsedInterval = (Option<(Rational, bool)>, Option<(Rational, bool)>);

pub fn parse_interval(s: &str) -> Result<ParsedInterval, FormatError> {
    let trimmed = s.trim();
    let invalid = || FormatError::InvalidInterval(s.to_string());

    let mut chars = trimmed.chars();
    let open = chars.next().ok_or_else(invalid)?;
    let close = trimmed.chars().last().ok_or_else(invalid)?;
    if trimmed.len() < 2 {
        return Err(invalid());
    }

    let closed_lo = match open {
        '[' => true,
        '(' => false,
        _ => return Err(invalid()),
    };
    let closed_hi = match close {
        ']' => true,
        ')' => false,
        _ => return Err(invalid()),
    };

    let inner = &trimmed[1..trimmed.len() - 1];
    let (lo_str, hi_str) = inner.split_once(',').ok_or_else(invalid)?;
    let lo_str = lo_str.trim();
    let hi_str = hi_str.trim();

    let lo = if lo_str == "-" { None } else { Some((parse_rational(lo_str, s)?, closed_lo)) };
    let hi = if hi_str == "+" { None } else { Some((parse_rational(hi_str, s)?, closed_hi)) };
    Ok((lo, hi))
}

fn parse_rational(s: &str, whole: &str) -> Result<Rational, FormatError> {
    let invalid = || FormatError::InvalidInterval(whole.to_string());
    if let Some((n, d)) = s.split_once('/') {
        let n: i64 = n.trim().parse().map_err(|_| invalid())?;
        let d: i64 = d.trim().parse().map_err(|_| invalid())?;
        return Ok(Rational::from_ratio(n, d));
    }
    if let Some((whole_part, frac)) = s.split_once('.') {
        let denom = 10i64.checked_pow(frac.len() as u32).ok_or_else(invalid)?;
        let frac_n: i64 = frac.parse().map_err(|_| invalid())?;
        let whole_n: i64 = whole_part.parse().map_err(|_| invalid())?;
        let sign = if whole_part.trim_start().starts_with('-') { -1 } else { 1 };
        let numer = whole_n * denom + sign * frac_n;
        return Ok(Rational::from_ratio(numer, denom));
    }
    let n: i64 = s.parse().map_err(|_| invalid())?;
    Ok(Rational::from_integer(n))
}

/// Renders a bound pair back to interval-string syntax. A missing lower
/// bound always prints as an explicit `0`, since `"[0, ...)"` and the `"-"`
/// sentinel mean the same thing; only import needs to accept `"-"`.
pub fn format_interval(lo: (Rational, bool), hi: Option<(Rational, bool)>) -> String {
    let lo_bracket = if lo.1 { '[' } else { '(' };
    let (hi_str, hi_bracket) = match hi {
        Some((v, closed)) => (format!("{v}"), if closed { ']' } else { ')' }),
        None => ("+".to_string(), ')'),
    };
    format!("{lo_bracket}{lo_val}, {hi_str}{hi_bracket}", lo_val = lo.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_closed_interval() {
        let (lo, hi) = parse_interval("[1, 3]").unwrap();
        assert_eq!(lo, Some((Rational::from_integer(1), true)));
        assert_eq!(hi, Some((Rational::from_integer(3), true)));
    }

    #[test]
    fn parses_half_open_interval() {
        let (_, hi) = parse_interval("[0, 3)").unwrap();
        assert_eq!(hi, Some((Rational::from_integer(3), false)));
    }

    #[test]
    fn parses_unbounded_sentinels() {
        let (lo, hi) = parse_interval("(-, +)").unwrap();
        assert_eq!(lo, None);
        assert_eq!(hi, None);
    }

    #[test]
    fn parses_fraction_bound() {
        let (lo, _) = parse_interval("[1/2, +)").unwrap();
        assert_eq!(lo, Some((Rational::from_ratio(1, 2), true)));
    }

    #[test]
    fn parses_decimal_bound() {
        let (lo, _) = parse_interval("[1.5, +)").unwrap();
        assert_eq!(lo, Some((Rational::from_ratio(3, 2), true)));
    }

    #[test]
    fn rejects_malformed_brackets() {
        assert!(parse_interval("1, 3").is_err());
    }

    #[test]
    fn round_trips_through_format() {
        let rendered = format_interval((Rational::from_integer(1), true), Some((Rational::from_integer(3), false)));
        assert_eq!(rendered, "[1, 3)");
        let (lo, hi) = parse_interval(&rendered).unwrap();
        assert_eq!(lo, Some((Rational::from_integer(1), true)));
        assert_eq!(hi, Some((Rational::from_integer(3), false)));
    }
}
