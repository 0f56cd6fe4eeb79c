use crate::error::Error;

/// Parse a decimal or prefixed (`0x`, `0b`, `0o`) literal with an optional sign.
pub fn parse_number(s: &str) -> Result<i64, Error> {
    let err = || Error::ParseNumber(s.to_string());
    let (neg, body) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    if body.is_empty() || body.starts_with(['-', '+']) {
        return Err(err());
    }
    let value = parse_with_prefix(body).ok_or_else(err)?;
    Ok(if neg { -value } else { value })
}

fn parse_with_prefix(s: &str) -> Option<i64> {
    let (radix, digits) = match s.get(0..2) {
        Some("0x" | "0X") => (16, &s[2..]),
        Some("0b" | "0B") => (2, &s[2..]),
        Some("0o" | "0O") => (8, &s[2..]),
        _ => (10, s),
    };
    // from_str_radix would accept a second sign here
    if digits.starts_with(['-', '+']) {
        return None;
    }
    i64::from_str_radix(digits, radix).ok()
}

/// True when the operand is spelled like a literal rather than a name.
pub fn is_literal(s: &str) -> bool {
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    body.starts_with(|c: char| c.is_ascii_digit())
}
