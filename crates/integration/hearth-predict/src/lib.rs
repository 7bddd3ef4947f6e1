//! # Hearth Predict
//!
//! Client for the house price prediction endpoint.
//!
//! - `POST /predict` with the JSON payload, one attempt, no retries
//! - `GET /health` next to it
//!
//! ```ignore
//! use hearth_predict::{PredictClient, Predictor};
//!
//! let client = PredictClient::new("http://localhost:5000/predict")?;
//! let outcome = client.predict(&form.to_request()).await?;
//! ```

use async_trait::async_trait;
use hearth_config::{parse_endpoint, HearthConfig};
use hearth_core::{Error, HealthStatus, PredictionOutcome, PredictionRequest, Result};
use std::time::Duration;
use url::Url;

/// Anything that can turn a request into an outcome.
///
/// This is the pure half of a submission: no display, no side effects beyond
/// the call itself.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionOutcome>;
}

/// HTTP prediction client
pub struct PredictClient {
    /// Prediction endpoint
    endpoint: Url,
    /// Health endpoint
    health: Url,
    /// HTTP client
    http: reqwest::Client,
}

impl PredictClient {
    /// Client for `endpoint` with no request timeout
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        Self::build(endpoint, None)
    }

    pub fn from_config(config: &HearthConfig) -> Result<Self> {
        Self::build(config.endpoint_url()?, config.timeout())
    }

    fn build(endpoint: Url, timeout: Option<Duration>) -> Result<Self> {
        let health = endpoint.join("health").map_err(|e| Error::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Connection(format!("cannot build HTTP client: {}", describe(&e))))?;

        Ok(Self {
            endpoint,
            health,
            http,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Query `GET /health`
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .http
            .get(self.health.clone())
            .send()
            .await
            .map_err(|e| Error::Connection(describe(&e)))?;

        if !response.status().is_success() {
            return Err(Error::Connection(format!("HTTP {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Connection(describe(&e)))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Predictor for PredictClient {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionOutcome> {
        tracing::debug!(endpoint = %self.endpoint, ?request, "sending prediction request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Connection(describe(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Connection(describe(&e)))?;
        tracing::debug!(%status, bytes = body.len(), "prediction response received");

        PredictionOutcome::from_json(&body)
    }
}

/// Flatten an error and its sources into one line.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(HeaderMap, Value)>>>;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request() -> PredictionRequest {
        PredictionRequest {
            area: Some(180.0),
            bedrooms: Some(3.into()),
            bathrooms: Some(2.5),
            country: "Saudi Arabia".into(),
            city: "Riyadh".into(),
        }
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        assert!(PredictClient::new("not a url").is_err());
        assert!(PredictClient::new("file:///tmp/predict").is_err());
    }

    #[test]
    fn test_health_url_derived() {
        let client = PredictClient::new("http://localhost:5000/predict").unwrap();
        assert_eq!(client.health.as_str(), "http://localhost:5000/health");
        assert_eq!(client.endpoint().path(), "/predict");
    }

    #[tokio::test]
    async fn test_sends_one_json_request() {
        let seen: Seen = Arc::default();
        let router = Router::new()
            .route(
                "/predict",
                post(
                    |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        seen.lock().unwrap().push((headers, body));
                        Json(json!({"status": "success", "prediction": 1234567}))
                    },
                ),
            )
            .with_state(seen.clone());
        let base = serve(router).await;

        let client = PredictClient::new(&format!("{}/predict", base)).unwrap();
        let outcome = client.predict(&request()).await.unwrap();
        assert_eq!(outcome, PredictionOutcome::Estimate { price: 1234567.0 });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (headers, body) = &seen[0];
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(
            body,
            &json!({
                "Area": 180.0,
                "Bedrooms": 3,
                "Bathrooms": 2.5,
                "Country": "Saudi Arabia",
                "City": "Riyadh"
            })
        );
        assert!(body["Bedrooms"].is_i64());
    }

    #[tokio::test]
    async fn test_error_status_with_json_body_is_rejection() {
        let router = Router::new().route(
            "/predict",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "status": "error",
                        "message": "Missing required fields: ['City']"
                    })),
                )
            }),
        );
        let base = serve(router).await;

        let client = PredictClient::new(&format!("{}/predict", base)).unwrap();
        let outcome = client.predict(&request()).await.unwrap();
        assert_eq!(
            outcome,
            PredictionOutcome::Rejected {
                status: Some("error".into()),
                message: "Missing required fields: ['City']".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_non_json_body_is_parse_error() {
        let router = Router::new().route(
            "/predict",
            post(|| async { (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").into_response() }),
        );
        let base = serve(router).await;

        let client = PredictClient::new(&format!("{}/predict", base)).unwrap();
        let result = client.predict(&request()).await;
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = PredictClient::new(&format!("http://{}/predict", addr)).unwrap();
        match client.predict(&request()).await {
            Err(Error::Connection(description)) => assert!(!description.is_empty()),
            other => panic!("expected connection error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_reported_as_connection_error() {
        let router = Router::new().route(
            "/predict",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"status": "success", "prediction": 1}))
            }),
        );
        let base = serve(router).await;

        let mut config = HearthConfig::default();
        config.endpoint = format!("{}/predict", base);
        config.timeout_secs = Some(1);

        let client = PredictClient::from_config(&config).unwrap();
        let result = client.predict(&request()).await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[tokio::test]
    async fn test_health() {
        let router = Router::new().route(
            "/health",
            get(|| async {
                Json(json!({"status": "healthy", "model_loaded": true, "version": "1.0.0"}))
            }),
        );
        let base = serve(router).await;

        let client = PredictClient::new(&format!("{}/predict", base)).unwrap();
        let health = client.health().await.unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.version.as_deref(), Some("1.0.0"));
    }
}
