use std::fmt;

/// Amounts are stored as integer cents so aggregation never accumulates
/// floating-point error. Positive values are income, negative values expenses.
pub type Cents = i64;

/// Default currency symbol used when rendering amounts.
pub const DEFAULT_CURRENCY: &str = "Rs";

/// Largest magnitude a single amount may have: one trillion currency units.
pub const MAX_AMOUNT_CENTS: Cents = 100_000_000_000_000;

/// True when `cents` lies within `-MAX_AMOUNT_CENTS..=MAX_AMOUNT_CENTS`.
pub fn within_amount_limit(cents: Cents) -> bool {
    cents.unsigned_abs() <= MAX_AMOUNT_CENTS.unsigned_abs()
}

/// Format cents as a plain decimal string.
/// Example: 65000 -> "650.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    format!("{}{}", sign, format_magnitude(cents.unsigned_abs()))
}

/// Format an amount with a currency symbol, sign in front of the symbol.
/// Example: ("Rs", -5000) -> "-Rs 50.00"
pub fn format_money(symbol: &str, cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    format!("{}{} {}", sign, symbol, format_magnitude(cents.unsigned_abs()))
}

/// Like [`format_money`], but always shows the sign ("+Rs 10.00").
pub fn format_signed_money(symbol: &str, cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "+" };
    format!("{}{} {}", sign, symbol, format_magnitude(cents.unsigned_abs()))
}

fn format_magnitude(magnitude: u64) -> String {
    format!("{}.{:02}", magnitude / 100, magnitude % 100)
}

/// Parse user-entered amount text into cents.
///
/// Accepts an optional leading sign, whole units and up to two decimal
/// places (extra places are truncated). Example: "-12.5" -> -1250.
/// Amounts beyond [`MAX_AMOUNT_CENTS`] are rejected as [`ParseCentsError::Overflow`].
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseCentsError::Empty);
    }

    let (negative, digits) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (units_str, fraction_str) = digits.split_once('.').unwrap_or((digits, ""));
    if units_str.is_empty() && fraction_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }
    if !units_str.bytes().all(|b| b.is_ascii_digit())
        || !fraction_str.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParseCentsError::Overflow)?
    };

    let fraction: i64 = match fraction_str.len() {
        0 => 0,
        1 => fraction_str.parse::<i64>().map_err(|_| ParseCentsError::InvalidFormat)? * 10,
        _ => fraction_str[..2]
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .filter(|c| *c <= MAX_AMOUNT_CENTS)
        .ok_or(ParseCentsError::Overflow)?;

    Ok(if negative { -cents } else { cents })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseCentsError {
    Empty,
    InvalidFormat,
    Overflow,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::Empty => write!(f, "amount is empty"),
            ParseCentsError::InvalidFormat => write!(f, "amount is not a number"),
            ParseCentsError::Overflow => write!(f, "amount is too large"),
        }
    }
}

impl std::error::Error for ParseCentsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(65000), "650.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-1234), "-12.34");
        assert_eq!(format_cents(i64::MIN), "-92233720368547758.08");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money("Rs", 100000), "Rs 1000.00");
        assert_eq!(format_money("Rs", -5000), "-Rs 50.00");
        assert_eq!(format_signed_money("$", 1050), "+$ 10.50");
        assert_eq!(format_signed_money("$", -1050), "-$ 10.50");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("1000"), Ok(100000));
        assert_eq!(parse_cents("-200"), Ok(-20000));
        assert_eq!(parse_cents("+12.5"), Ok(1250));
        assert_eq!(parse_cents(" 0.99 "), Ok(99));
        assert_eq!(parse_cents(".5"), Ok(50));
        assert_eq!(parse_cents("7."), Ok(700));
        assert_eq!(parse_cents("3.14159"), Ok(314));
    }

    #[test]
    fn test_parse_cents_rejects_garbage() {
        assert_eq!(parse_cents(""), Err(ParseCentsError::Empty));
        assert_eq!(parse_cents("   "), Err(ParseCentsError::Empty));
        assert_eq!(parse_cents("abc"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("NaN"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("1.2.3"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("-"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("."), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("1e5"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(
            parse_cents("99999999999999999999"),
            Err(ParseCentsError::Overflow)
        );
    }

    #[test]
    fn test_parse_cents_limit() {
        assert_eq!(parse_cents("1000000000000"), Ok(MAX_AMOUNT_CENTS));
        assert_eq!(parse_cents("-1000000000000.00"), Ok(-MAX_AMOUNT_CENTS));
        assert_eq!(
            parse_cents("1000000000000.01"),
            Err(ParseCentsError::Overflow)
        );
        assert_eq!(
            parse_cents("92233720368547758"),
            Err(ParseCentsError::Overflow)
        );
        assert!(within_amount_limit(-MAX_AMOUNT_CENTS));
        assert!(!within_amount_limit(MAX_AMOUNT_CENTS + 1));
        assert!(!within_amount_limit(i64::MIN));
    }

    #[test]
    fn test_format_money_extremes() {
        assert_eq!(format_money("Rs", i64::MIN), "-Rs 92233720368547758.08");
        assert_eq!(format_signed_money("Rs", i64::MAX), "+Rs 92233720368547758.07");
    }
}
