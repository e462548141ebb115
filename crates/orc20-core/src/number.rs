//! Strict parsing of numeric strings found in payloads
//!
//! Every numeric payload field is carried as text and must satisfy:
//!
//! 1. not blank (surrounding whitespace is otherwise tolerated)
//! 2. no leading plus sign
//! 3. for decimals: no leading or trailing decimal point, at most one point
//! 4. parseable exactly, with no precision loss

use bigdecimal::BigDecimal;
use std::str::FromStr;

/// Reasons a numeric string is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumberError {
    /// Empty or whitespace-only string
    #[error("blank number")]
    Blank,
    /// Explicit plus sign
    #[error("leading plus sign in {0:?}")]
    PlusSign(String),
    /// Leading, trailing or repeated decimal point
    #[error("misplaced decimal point in {0:?}")]
    MisplacedPoint(String),
    /// Anything else that does not parse exactly
    #[error("malformed number {0:?}")]
    Malformed(String),
}

fn trimmed(text: &str) -> Result<&str, NumberError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(NumberError::Blank);
    }
    if text.starts_with('+') {
        return Err(NumberError::PlusSign(text.to_string()));
    }
    Ok(text)
}

/// Parse a 32-bit integer
pub fn parse_int(text: &str) -> Result<i32, NumberError> {
    let text = trimmed(text)?;
    text.parse::<i32>()
        .map_err(|_| NumberError::Malformed(text.to_string()))
}

/// Parse a 64-bit integer
pub fn parse_long(text: &str) -> Result<i64, NumberError> {
    let text = trimmed(text)?;
    text.parse::<i64>()
        .map_err(|_| NumberError::Malformed(text.to_string()))
}

/// Parse an exact decimal, keeping the scale as written (`"1.10"` has scale 2)
pub fn parse_decimal(text: &str) -> Result<BigDecimal, NumberError> {
    let text = trimmed(text)?;
    if text.starts_with('.') || text.ends_with('.') || text.matches('.').count() > 1 {
        return Err(NumberError::MisplacedPoint(text.to_string()));
    }
    if !is_decimal_literal(text) {
        return Err(NumberError::Malformed(text.to_string()));
    }
    BigDecimal::from_str(text).map_err(|_| NumberError::Malformed(text.to_string()))
}

/// Number of fractional digits as written; negative for positive exponents
pub fn scale_of(value: &BigDecimal) -> i64 {
    value.as_bigint_and_exponent().1
}

/// Whether `value` carries more fractional digits than `decimals` allows.
/// An absent value never exceeds.
pub fn exceeds_precision(value: Option<&BigDecimal>, decimals: u32) -> bool {
    value.is_some_and(|value| scale_of(value) > i64::from(decimals))
}

// sign? digits-with-one-point (exponent)?
fn is_decimal_literal(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (&body[..at], Some(&body[at + 1..])),
        None => (body, None),
    };
    let mantissa_ok = mantissa.chars().any(|c| c.is_ascii_digit())
        && mantissa.chars().all(|c| c.is_ascii_digit() || c == '.');
    let exponent_ok = match exponent {
        None => true,
        Some(exp) => {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        }
    };
    mantissa_ok && exponent_ok
}
