//! # Hearth Core
//!
//! Shared data model for the Hearth price estimator:
//! - **Form input**: raw text of the five house fields, coerced leniently
//! - **Wire types**: the `/predict` payload and the response outcome
//! - **Display**: the single text region and how each phase renders
//!
//! ## Usage
//!
//! ```
//! use hearth_core::{DisplayState, DisplayStyle, FormInput};
//!
//! let form = FormInput::new("120", "3", "2", "Saudi Arabia", "Riyadh");
//! let request = form.to_request();
//! assert_eq!(request.bedrooms, Some(3.into()));
//!
//! let shown = DisplayState::Estimate { price: 1234567.0 }.render(&DisplayStyle::default());
//! assert_eq!(shown, "Predicted Price: ﷼ 1,234,567 SAR");
//! ```

pub mod display;
pub mod form;
pub mod format;
pub mod model;

pub use display::{DisplayState, DisplayStyle, Phase, ResubmitPolicy, PENDING_TEXT};
pub use form::{parse_float, parse_int, FormInput};
pub use format::{format_grouped, NumberLocale};
pub use model::{HealthStatus, PredictionOutcome, PredictionRequest};

/// Result type for Hearth operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the prediction endpoint.
///
/// The transport and response variants display as the bare description so
/// they can be dropped straight into `Connection error: <description>`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    MalformedResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
