//! The result display and how each phase renders as text

use crate::format::{format_grouped, NumberLocale};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shown while a request is outstanding.
pub const PENDING_TEXT: &str = "Calculating...";

/// Contents of the single display region.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DisplayState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// A request is outstanding
    Pending,
    /// The endpoint returned a price
    Estimate { price: f64 },
    /// The endpoint answered with a non-success status
    Rejected { message: String },
    /// The request or its response could not be completed
    ConnectionError { description: String },
}

/// Coarse lifecycle phase: `Idle → Pending → (Success | Error)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Pending,
    Success,
    Error,
}

impl DisplayState {
    pub fn phase(&self) -> Phase {
        match self {
            DisplayState::Idle => Phase::Idle,
            DisplayState::Pending => Phase::Pending,
            DisplayState::Estimate { .. } => Phase::Success,
            DisplayState::Rejected { .. } | DisplayState::ConnectionError { .. } => Phase::Error,
        }
    }

    pub fn render(&self, style: &DisplayStyle) -> String {
        match self {
            DisplayState::Idle => String::new(),
            DisplayState::Pending => PENDING_TEXT.to_string(),
            DisplayState::Estimate { price } => format!(
                "Predicted Price: {} {} {}",
                style.currency_symbol,
                format_grouped(*price, style.locale),
                style.currency_code
            ),
            DisplayState::Rejected { message } => format!("Error: {}", message),
            DisplayState::ConnectionError { description } => {
                format!("Connection error: {}", description)
            }
        }
    }
}

/// How prices are presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayStyle {
    pub locale: NumberLocale,
    pub currency_symbol: String,
    pub currency_code: String,
}

impl Default for DisplayStyle {
    fn default() -> Self {
        Self {
            locale: NumberLocale::EnUs,
            currency_symbol: "﷼".to_string(),
            currency_code: "SAR".to_string(),
        }
    }
}

/// What happens when a new submission starts while another is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResubmitPolicy {
    /// Every submission runs to completion; the last to settle owns the display.
    #[default]
    LastWriterWins,
    /// A new submission aborts the in-flight one; only the newest may write.
    CancelOnResubmit,
}

impl fmt::Display for ResubmitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResubmitPolicy::LastWriterWins => write!(f, "last-writer-wins"),
            ResubmitPolicy::CancelOnResubmit => write!(f, "cancel-on-resubmit"),
        }
    }
}

impl FromStr for ResubmitPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "last-writer-wins" | "lww" => Ok(ResubmitPolicy::LastWriterWins),
            "cancel-on-resubmit" | "cancel" => Ok(ResubmitPolicy::CancelOnResubmit),
            other => Err(format!("unknown resubmit policy: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_each_phase() {
        let style = DisplayStyle::default();

        assert_eq!(DisplayState::Idle.render(&style), "");
        assert_eq!(DisplayState::Pending.render(&style), "Calculating...");
        assert_eq!(
            DisplayState::Estimate { price: 1234567.0 }.render(&style),
            "Predicted Price: ﷼ 1,234,567 SAR"
        );
        assert_eq!(
            DisplayState::Rejected { message: "model unavailable".into() }.render(&style),
            "Error: model unavailable"
        );
        assert_eq!(
            DisplayState::ConnectionError { description: "connection refused".into() }
                .render(&style),
            "Connection error: connection refused"
        );
    }

    #[test]
    fn test_render_custom_style() {
        let style = DisplayStyle {
            locale: NumberLocale::DeDe,
            currency_symbol: "€".into(),
            currency_code: "EUR".into(),
        };
        assert_eq!(
            DisplayState::Estimate { price: 450000.0 }.render(&style),
            "Predicted Price: € 450.000 EUR"
        );
    }

    #[test]
    fn test_phases() {
        assert_eq!(DisplayState::default().phase(), Phase::Idle);
        assert_eq!(DisplayState::Pending.phase(), Phase::Pending);
        assert_eq!(DisplayState::Estimate { price: 1.0 }.phase(), Phase::Success);
        assert_eq!(
            DisplayState::ConnectionError { description: String::new() }.phase(),
            Phase::Error
        );
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("cancel".parse::<ResubmitPolicy>(), Ok(ResubmitPolicy::CancelOnResubmit));
        assert_eq!(
            "last-writer-wins".parse::<ResubmitPolicy>(),
            Ok(ResubmitPolicy::LastWriterWins)
        );
        assert!("queue".parse::<ResubmitPolicy>().is_err());
        assert_eq!(ResubmitPolicy::CancelOnResubmit.to_string(), "cancel-on-resubmit");
    }
}
