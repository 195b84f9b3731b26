//! Brazilian phone mask applied as the user types.

use crate::constants::phone::{LANDLINE_DIGITS, MOBILE_DIGITS};

/// Keep only ASCII digits, capped at a full mobile number
pub fn digits(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(MOBILE_DIGITS)
        .collect()
}

/// Apply the progressive `(DD) NNNNN-NNNN` mask.
///
/// Punctuation is stripped first, so feeding back an already formatted
/// value yields the same string.
pub fn format(raw: &str) -> String {
    let digits = digits(raw);
    let len = digits.len();

    match len {
        0..=2 => digits,
        3..=7 => format!("({}) {}", &digits[..2], &digits[2..]),
        _ => {
            // landlines carry a 4-digit first group
            let split = if len == LANDLINE_DIGITS { 6 } else { 7 };
            format!("({}) {}-{}", &digits[..2], &digits[2..split], &digits[split..])
        }
    }
}

/// Split into area code (`ddd`) and local number for checkout links.
///
/// Returns `None` when there are fewer than three digits.
pub fn split(raw: &str) -> Option<(String, String)> {
    let digits = digits(raw);
    if digits.len() < 3 {
        return None;
    }
    Some((digits[..2].to_string(), digits[2..].to_string()))
}

/// Basic shape check: a full landline or mobile number
pub fn is_complete(raw: &str) -> bool {
    let count = raw.chars().filter(|c| c.is_ascii_digit()).count();
    count == LANDLINE_DIGITS || count == MOBILE_DIGITS
}
