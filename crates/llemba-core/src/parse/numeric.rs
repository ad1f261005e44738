use lazy_static::lazy_static;
use regex::Regex;

pub const DEFAULT_MIN: i64 = 0;
pub const DEFAULT_MAX: i64 = 100;

lazy_static! {
    /// "85 out of 100", "85/100", "85 / 100".
    static ref FRACTION: Regex = Regex::new(r"(\d+)\s*(?:out of|/)\s*(\d+)").unwrap();
    /// Standalone integer token.
    static ref INTEGER: Regex = Regex::new(r"\b\d+\b").unwrap();
    static ref DECIMAL_DIGIT: Regex = Regex::new(r"^\p{Nd}$").unwrap();
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT.is_match(c.encode_utf8(&mut buf))
}

/// Value of any Unicode decimal digit (`٨`, `８`, `९`, ...).
///
/// Decimal digits are encoded in contiguous runs of complete 0-9 blocks, so
/// the offset from the start of the run, mod 10, is the digit value.
fn digit_value(c: char) -> Option<i64> {
    if let Some(d) = c.to_digit(10) {
        return Some(i64::from(d));
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let mut start = u32::from(c);
    while let Some(prev) = start.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        start -= 1;
    }
    Some(i64::from((u32::from(c) - start) % 10))
}

/// Reads a `\d+` token in any script. `None` only on overflow.
fn to_number(token: &str) -> Option<i64> {
    token.chars().try_fold(0i64, |acc, c| {
        acc.checked_mul(10)?.checked_add(digit_value(c)?)
    })
}

/// Extracts a score in `[min, max]` from a free-text answer.
///
/// A fraction is trusted first, but only when its denominator is exactly
/// `max`; otherwise the first standalone integer inside the range wins.
pub fn parse_number(text: &str, min: i64, max: i64) -> Option<i64> {
    let in_range = |v: i64| (min..=max).contains(&v);

    if let Some(caps) = FRACTION.captures(text) {
        let score = to_number(&caps[1]);
        let total = to_number(&caps[2]);
        if let (Some(score), Some(total)) = (score, total) {
            if in_range(score) && total == max {
                return Some(score);
            }
        }
    }

    // Tokens too large for i64 cannot be in range.
    INTEGER
        .find_iter(text)
        .filter_map(|m| to_number(m.as_str()))
        .find(|&v| in_range(v))
}
