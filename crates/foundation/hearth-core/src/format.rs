//! Locale-aware whole-number formatting for price display.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number locales the display knows how to group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NumberLocale {
    /// 1,234,567
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    /// 1.234.567
    #[serde(rename = "de-DE")]
    DeDe,
    /// 1 234 567 (narrow no-break space)
    #[serde(rename = "fr-FR")]
    FrFr,
    /// 12,34,567
    #[serde(rename = "en-IN")]
    EnIn,
}

impl NumberLocale {
    pub fn tag(&self) -> &'static str {
        match self {
            NumberLocale::EnUs => "en-US",
            NumberLocale::DeDe => "de-DE",
            NumberLocale::FrFr => "fr-FR",
            NumberLocale::EnIn => "en-IN",
        }
    }

    fn separator(&self) -> &'static str {
        match self {
            NumberLocale::EnUs | NumberLocale::EnIn => ",",
            NumberLocale::DeDe => ".",
            NumberLocale::FrFr => "\u{202f}",
        }
    }

    /// Size of the first group from the right, then of every group after it.
    fn group_sizes(&self) -> (usize, usize) {
        match self {
            NumberLocale::EnIn => (3, 2),
            _ => (3, 3),
        }
    }
}

impl fmt::Display for NumberLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for NumberLocale {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "en-us" | "en" => Ok(NumberLocale::EnUs),
            "de-de" | "de" => Ok(NumberLocale::DeDe),
            "fr-fr" | "fr" => Ok(NumberLocale::FrFr),
            "en-in" => Ok(NumberLocale::EnIn),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

/// Format `value` with no fractional digits and the locale's digit grouping.
///
/// Halves round away from zero. A value that rounds to zero prints as `0`.
pub fn format_grouped(value: f64, locale: NumberLocale) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-∞" } else { "∞" }.to_string();
    }

    let rounded = value.round();
    if rounded == 0.0 {
        return "0".to_string();
    }

    let digits = format!("{:.0}", rounded.abs());
    let grouped = group_digits(&digits, locale);
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn group_digits(digits: &str, locale: NumberLocale) -> String {
    let (first, rest) = locale.group_sizes();
    if digits.len() <= first {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - first);
    let mut groups = vec![tail];
    let mut remaining = head;
    while remaining.len() > rest {
        let (h, t) = remaining.split_at(remaining.len() - rest);
        groups.push(t);
        remaining = h;
    }
    groups.push(remaining);
    groups.reverse();
    groups.join(locale.separator())
}
