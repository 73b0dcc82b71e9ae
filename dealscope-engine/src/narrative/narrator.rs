//! Insight narrator client
//!
//! The narrator receives a [`NarrativeRequest`] as JSON and answers with
//! `{"insight": "<text>"}`. Anything else is a [`NarratorError`].

use super::payload::NarrativeRequest;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("dealscope/", env!("CARGO_PKG_VERSION"));

/// Narrator client errors
#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Narrator not configured")]
    NotConfigured,
}

/// Turns a numeric summary into prose
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &'static str;

    async fn narrate(&self, request: &NarrativeRequest) -> Result<String, NarratorError>;
}

/// Narrator behind an HTTP endpoint
pub struct HttpNarrator {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpNarrator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, NarratorError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| NarratorError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Narrator for HttpNarrator {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn narrate(&self, request: &NarrativeRequest) -> Result<String, NarratorError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            kind = request.kind.as_str(),
            items = request.items.len(),
            "Requesting narrative"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| NarratorError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NarratorError::Api(status.as_u16(), error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| NarratorError::Network(e.to_string()))?;
        parse_insight(&body)
    }
}

/// Narrator used when no endpoint is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNarrator;

#[async_trait]
impl Narrator for DisabledNarrator {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn narrate(&self, _request: &NarrativeRequest) -> Result<String, NarratorError> {
        Err(NarratorError::NotConfigured)
    }
}

/// Extract the `insight` string from a narrator response body
///
/// Accepts only a JSON object whose `insight` is a non-blank string.
pub fn parse_insight(body: &str) -> Result<String, NarratorError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| NarratorError::MalformedResponse(e.to_string()))?;

    match value.get("insight").and_then(|v| v.as_str()) {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Some(_) => Err(NarratorError::MalformedResponse("empty insight".to_string())),
        None => Err(NarratorError::MalformedResponse(
            "missing string field 'insight'".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::payload::DatasetKind;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn forecast_request() -> NarrativeRequest {
        NarrativeRequest {
            kind: DatasetKind::Forecast,
            dimension: None,
            items: Vec::new(),
        }
    }

    /// Answer one request with `status_line` and `body`, returning the endpoint
    async fn one_shot_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            // Drain headers and the JSON body before answering
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let content_length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}/insight", addr)
    }

    #[test]
    fn test_parse_insight() {
        assert_eq!(parse_insight(r#"{"insight": " Tech leads. "}"#).unwrap(), "Tech leads.");
    }

    #[test]
    fn test_parse_insight_rejects_bad_shapes() {
        for body in ["not json", "[]", r#"{"insight": 3}"#, r#"{"text": "hi"}"#, r#"{"insight": "  "}"#] {
            assert!(
                matches!(parse_insight(body), Err(NarratorError::MalformedResponse(_))),
                "accepted {:?}",
                body
            );
        }
    }

    #[tokio::test]
    async fn test_disabled_narrator() {
        let request = NarrativeRequest {
            kind: DatasetKind::Ranking,
            dimension: None,
            items: Vec::new(),
        };
        let result = DisabledNarrator.narrate(&request).await;
        assert!(matches!(result, Err(NarratorError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let narrator = HttpNarrator::new("http://127.0.0.1:9/insight", Duration::from_secs(2)).unwrap();
        let request = NarrativeRequest {
            kind: DatasetKind::Forecast,
            dimension: None,
            items: Vec::new(),
        };
        let result = narrator.narrate(&request).await;
        assert!(matches!(result, Err(NarratorError::Network(_))));
    }

    #[tokio::test]
    async fn test_success_status_returns_insight() {
        let endpoint = one_shot_server("200 OK", r#"{"insight": "Closed deals are climbing."}"#).await;
        let narrator = HttpNarrator::new(endpoint, Duration::from_secs(5)).unwrap();

        let text = narrator.narrate(&forecast_request()).await.unwrap();
        assert_eq!(text, "Closed deals are climbing.");
    }

    #[tokio::test]
    async fn test_error_status_is_api_error() {
        let endpoint = one_shot_server("500 Internal Server Error", r#"{"error":"model offline"}"#).await;
        let narrator = HttpNarrator::new(endpoint, Duration::from_secs(5)).unwrap();

        match narrator.narrate(&forecast_request()).await {
            Err(NarratorError::Api(status, text)) => {
                assert_eq!(status, 500);
                assert!(text.contains("model offline"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_with_bad_body_is_malformed() {
        let endpoint = one_shot_server("200 OK", r#"{"text": "no insight field"}"#).await;
        let narrator = HttpNarrator::new(endpoint, Duration::from_secs(5)).unwrap();

        let result = narrator.narrate(&forecast_request()).await;
        assert!(matches!(result, Err(NarratorError::MalformedResponse(_))));
    }
}
