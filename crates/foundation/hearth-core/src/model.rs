//! Wire types for the prediction endpoint

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Body of `POST /predict`.
///
/// Numeric fields that could not be read from the form are `None` and go over
/// the wire as `null`; so do non-finite floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PredictionRequest {
    pub area: Option<f64>,
    /// Integer-parsed; digit runs past `i64` stay numeric as a float.
    pub bedrooms: Option<Number>,
    pub bathrooms: Option<f64>,
    pub country: String,
    pub city: String,
}

/// What the endpoint said about a request.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    /// `status == "success"` with a numeric prediction
    Estimate { price: f64 },
    /// Any other status, with the server's message
    Rejected {
        status: Option<String>,
        message: String,
    },
}

impl PredictionOutcome {
    /// Interpret a response body.
    ///
    /// The HTTP status code plays no part: error statuses that carry a JSON
    /// body are read like any other. A body that is not JSON is a
    /// [`Error::Parse`]; JSON of the wrong shape is a
    /// [`Error::MalformedResponse`].
    pub fn from_json(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let status = value.get("status").and_then(Value::as_str);

        if status == Some("success") {
            let price = value
                .get("prediction")
                .and_then(Value::as_f64)
                .ok_or_else(|| {
                    Error::MalformedResponse(
                        "success response has no numeric prediction".to_string(),
                    )
                })?;
            return Ok(PredictionOutcome::Estimate { price });
        }

        let message = match value.get("message") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => {
                return Err(Error::MalformedResponse(format!(
                    "response with status {} has no message",
                    status.map(|s| format!("{:?}", s)).unwrap_or_else(|| "<missing>".into())
                )))
            }
            Some(other) => other.to_string(),
        };

        Ok(PredictionOutcome::Rejected {
            status: status.map(str::to_string),
            message,
        })
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" && self.model_loaded
    }
}
