use thiserror::Error;

/// Amounts are integer hundredths of a unit, so 2000.00 is `200_000`.
pub type Cents = i64;

/// Lowest balance an account may hold after opening or after any debit.
pub const MINIMUM_BALANCE: Cents = 200_000;

/// Render cents as "1234.56" (negative values keep their sign).
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// `format_cents` for by-reference callers such as error messages.
pub(crate) fn display_cents(cents: &Cents) -> String {
    format_cents(*cents)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCentsError {
    #[error("amount is empty")]
    Empty,
    #[error("invalid amount '{0}'")]
    InvalidFormat(String),
    #[error("amount '{0}' has more than two decimal places")]
    TooManyDecimals(String),
    #[error("amount '{0}' is too large")]
    Overflow(String),
}

/// Parse "50", "50.5" or "50.05" into cents. More than two decimals is rejected
/// rather than rounded.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseCentsError::Empty);
    }

    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let invalid = || ParseCentsError::InvalidFormat(trimmed.to_string());
    let (units_str, fraction_str) = match digits.split_once('.') {
        Some((units, fraction)) => (units, fraction),
        None => (digits, ""),
    };

    if units_str.is_empty() && fraction_str.is_empty() {
        return Err(invalid());
    }
    if !units_str.chars().all(|c| c.is_ascii_digit())
        || !fraction_str.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }
    if fraction_str.len() > 2 {
        return Err(ParseCentsError::TooManyDecimals(trimmed.to_string()));
    }

    let overflow = || ParseCentsError::Overflow(trimmed.to_string());
    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| overflow())?
    };
    let fraction: i64 = match fraction_str.len() {
        0 => 0,
        1 => fraction_str.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction_str.parse().map_err(|_| invalid())?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or_else(overflow)?;
    Ok(if negative { -cents } else { cents })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(200_000), "2000.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-150), "-1.50");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("2000"), Ok(200_000));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents("12.05"), Ok(1205));
        assert_eq!(parse_cents(".75"), Ok(75));
        assert_eq!(parse_cents(" 10 "), Ok(1000));
        assert_eq!(parse_cents("-3.20"), Ok(-320));
    }

    #[test]
    fn test_parse_cents_rejects_garbage() {
        assert_eq!(parse_cents(""), Err(ParseCentsError::Empty));
        assert!(matches!(
            parse_cents("1.2.3"),
            Err(ParseCentsError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_cents("abc"),
            Err(ParseCentsError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_cents("."),
            Err(ParseCentsError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_cents("10.999"),
            Err(ParseCentsError::TooManyDecimals(_))
        ));
        assert!(matches!(
            parse_cents("99999999999999999999"),
            Err(ParseCentsError::Overflow(_))
        ));
    }
}
