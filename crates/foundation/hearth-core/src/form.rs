//! Form input and lenient numeric coercion
//!
//! The form hands over whatever text the user typed. Numeric fields are read
//! by their longest numeric prefix; text with no numeric prefix becomes the
//! non-numeric sentinel (`None`), which is still sent to the server as `null`.

use crate::model::PredictionRequest;
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Raw text of the five house fields, exactly as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    pub area: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub country: String,
    pub city: String,
}

impl FormInput {
    pub fn new(
        area: impl Into<String>,
        bedrooms: impl Into<String>,
        bathrooms: impl Into<String>,
        country: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            area: area.into(),
            bedrooms: bedrooms.into(),
            bathrooms: bathrooms.into(),
            country: country.into(),
            city: city.into(),
        }
    }

    /// Build a fresh payload: area and bathrooms as floats, bedrooms as an
    /// integer, country and city untouched.
    pub fn to_request(&self) -> PredictionRequest {
        PredictionRequest {
            area: parse_float(&self.area),
            bedrooms: parse_int(&self.bedrooms),
            bathrooms: parse_float(&self.bathrooms),
            country: self.country.clone(),
            city: self.city.clone(),
        }
    }
}

fn skip_leading_space(text: &str) -> &str {
    text.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

fn count_digits(bytes: &[u8], from: usize) -> usize {
    bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Parse the longest decimal prefix of `text` as a float.
///
/// Accepts an optional sign, `Infinity`, digits with an optional fraction and
/// an optional exponent (only when it has digits). Returns `None` when no
/// digit is found.
pub fn parse_float(text: &str) -> Option<f64> {
    let s = skip_leading_space(text);
    let bytes = s.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    if s[end..].starts_with("Infinity") {
        return Some(if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_digits = count_digits(bytes, end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(bytes, end + 1);
        if frac_digits > 0 || int_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(bytes, exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Parse the leading integer of `text`.
///
/// Stops at the first character that is not a digit, so `"3.7"` reads as 3.
/// A `0x`/`0X` prefix switches to hexadecimal. Returns `None` when there are
/// no digits. Values beyond `i64` are kept as the nearest float.
pub fn parse_int(text: &str) -> Option<Number> {
    let s = skip_leading_space(text);
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        _ => (10, rest),
    };

    let len = digits
        .bytes()
        .take_while(|b| (*b as char).is_digit(radix))
        .count();
    if len == 0 {
        return None;
    }
    let digits = &digits[..len];

    if let Ok(value) = i64::from_str_radix(digits, radix) {
        return Some(Number::from(if negative { -value } else { value }));
    }

    let magnitude = if radix == 10 {
        digits.parse::<f64>().ok()?
    } else {
        digits.bytes().fold(0.0, |acc, b| {
            acc * radix as f64 + (b as char).to_digit(radix).unwrap_or(0) as f64
        })
    };
    Number::from_f64(if negative { -magnitude } else { magnitude })
}
