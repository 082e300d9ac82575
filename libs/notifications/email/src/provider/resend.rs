//! Resend email provider
//!
//! Sends emails via the Resend HTTP API.

use crate::provider::{EmailProvider, OutboundEmail, ProviderError, SendResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Resend API base URL
pub const RESEND_API_URL: &str = "https://api.resend.com";

pub struct ResendProvider {
    api_key: String,
    base_url: String,
    client: Client,
}

impl ResendProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: RESEND_API_URL.to_string(),
            client,
        })
    }

    /// Point the provider at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn emails_url(&self) -> String {
        format!("{}/emails", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: String,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

/// Map a non-2xx response onto a [`ProviderError`].
fn classify_status(status: StatusCode, body: String, retry_after: Option<u64>) -> ProviderError {
    match status.as_u16() {
        429 => ProviderError::RateLimited {
            retry_after_ms: retry_after.map(|secs| secs.saturating_mul(1000)),
        },
        401 | 403 => ProviderError::Auth,
        code => ProviderError::Api { status: code, body },
    }
}

#[async_trait]
impl EmailProvider for ResendProvider {
    async fn send(&self, email: &OutboundEmail) -> Result<SendResult, ProviderError> {
        let request = ResendRequest {
            from: email.sender(),
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
        };

        debug!(to = ?email.to, subject = %email.subject, "Sending email via Resend");

        let response = self
            .client
            .post(self.emails_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();

        if status.is_success() {
            let body: ResendResponse = response
                .json()
                .await
                .map_err(|e| ProviderError::Transport(e.to_string()))?;

            return Ok(SendResult {
                message_id: body.id,
            });
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let error_body = response.text().await.unwrap_or_default();

        error!(status = %status, error = %error_body, "Resend API error");

        Err(classify_status(status, error_body, retry_after))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::Auth);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "resend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn email() -> OutboundEmail {
        OutboundEmail {
            from: "noreply@cinecore.test".to_string(),
            from_name: "CineCore".to_string(),
            to: vec!["jane@example.com".to_string()],
            subject: "Welcome to CineCore".to_string(),
            html: "<p>Hello</p>".to_string(),
        }
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn provider(base_url: &str) -> ResendProvider {
        ResendProvider::new("re_test_key", Duration::from_secs(5))
            .unwrap()
            .with_base_url(base_url)
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, String::new(), Some(3)),
            ProviderError::RateLimited {
                retry_after_ms: Some(3000)
            }
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, String::new(), None),
            ProviderError::Auth
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, String::new(), None),
            ProviderError::Auth
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, "bad to".to_string(), None),
            ProviderError::Api { status: 422, ref body } if body == "bad to"
        ));
    }

    #[tokio::test]
    async fn test_send_posts_expected_body() {
        let captured: Arc<Mutex<Option<(HeaderMap, Value)>>> = Arc::new(Mutex::new(None));
        let sink = captured.clone();

        let app = Router::new().route(
            "/emails",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    *sink.lock().unwrap() = Some((headers, body));
                    Json(json!({ "id": "msg_123" }))
                }
            }),
        );
        let base_url = serve(app).await;

        let result = provider(&base_url).send(&email()).await.unwrap();
        assert_eq!(result.message_id, "msg_123");

        let (headers, body) = captured.lock().unwrap().take().unwrap();
        assert_eq!(headers["authorization"], "Bearer re_test_key");
        assert_eq!(body["from"], "CineCore <noreply@cinecore.test>");
        assert_eq!(body["to"], json!(["jane@example.com"]));
        assert_eq!(body["subject"], "Welcome to CineCore");
        assert_eq!(body["html"], "<p>Hello</p>");
    }

    #[tokio::test]
    async fn test_send_maps_rate_limit() {
        let app = Router::new().route(
            "/emails",
            post(|| async { (AxumStatus::TOO_MANY_REQUESTS, [("retry-after", "2")], "slow down") }),
        );
        let base_url = serve(app).await;

        let err = provider(&base_url).send(&email()).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::RateLimited {
                retry_after_ms: Some(2000)
            }
        ));
    }

    #[tokio::test]
    async fn test_send_maps_api_error() {
        let app = Router::new().route(
            "/emails",
            post(|| async { (AxumStatus::UNPROCESSABLE_ENTITY, "invalid `to` field") }),
        );
        let base_url = serve(app).await;

        let err = provider(&base_url).send(&email()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 422, .. }));
        assert!(err.to_string().contains("invalid `to` field"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let err = provider("http://127.0.0.1:1")
            .send(&email())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }

    #[tokio::test]
    async fn test_health_check_requires_key() {
        let blank = ResendProvider::new(" ", Duration::from_secs(1)).unwrap();
        assert!(blank.health_check().await.is_err());
        assert!(provider("http://127.0.0.1:1").health_check().await.is_ok());
    }
}
