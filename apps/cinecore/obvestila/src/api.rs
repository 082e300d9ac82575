//! HTTP surface: service info, liveness, readiness, metrics and API docs.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use email::{EmailDispatcher, EmailQueue, NotificationRequest, TemplateRegistry};
use messaging::nats::{ConsumerState, StreamConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub const SERVICE_NAME: &str = "obvestila";

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TemplateRegistry>,
    pub dispatcher: EmailDispatcher,
    pub consumer_state: watch::Receiver<ConsumerState>,
    pub metrics: PrometheusHandle,
}

/// What this service does and how to talk to it.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub service_name: String,
    pub description: String,
    pub queue_name: String,
    pub available_templates: Vec<String>,
    pub usage: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessStatus {
    /// `ready` or `not_ready`
    pub status: String,
    /// Queue consumer lifecycle state
    pub consumer: String,
    /// Whether the email provider reports itself usable
    pub provider: bool,
}

#[derive(OpenApi)]
#[openapi(
    paths(healthcheck, service_info, ready),
    components(schemas(ServiceInfo, ReadinessStatus, NotificationRequest)),
    tags((name = "obvestila", description = "CineCore email notification worker"))
)]
pub struct ApiDoc;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics))
        .route("/api/v1/obvestila/info", get(service_info))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "obvestila",
    responses((status = 200, description = "Process is alive", body = String))
)]
pub async fn healthcheck() -> &'static str {
    "OK"
}

/// Service description and the templates it can render
#[utoipa::path(
    get,
    path = "/api/v1/obvestila/info",
    tag = "obvestila",
    responses((status = 200, description = "Service information", body = ServiceInfo))
)]
pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service_name: SERVICE_NAME.to_string(),
        description: "Consumes email requests from a NATS JetStream queue, renders them from \
                      HTML templates and sends them through Resend on behalf of CineCore."
            .to_string(),
        queue_name: EmailQueue::SUBJECT.to_string(),
        available_templates: state.registry.names(),
        usage: format!(
            "Publish a JSON message to the '{}' queue: \
             {{\"to\": \"user@example.com\", \"template\": \"welcome\", \
             \"template_data\": {{\"Subject\": \"Welcome to CineCore\", \"UserName\": \"Jane\"}}}}",
            EmailQueue::SUBJECT
        ),
    })
}

/// Readiness probe: ready while the queue consumer is consuming and the
/// email provider passes its health check
#[utoipa::path(
    get,
    path = "/ready",
    tag = "obvestila",
    responses(
        (status = 200, description = "Consuming messages", body = ReadinessStatus),
        (status = 503, description = "Consumer or provider not ready", body = ReadinessStatus)
    )
)]
pub async fn ready(State(state): State<AppState>) -> Response {
    let consumer = *state.consumer_state.borrow();
    let provider = state.dispatcher.health_check().await;

    let (status, label) = match consumer {
        ConsumerState::Consuming if provider => (StatusCode::OK, "ready"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "not_ready"),
    };

    let body = ReadinessStatus {
        status: label.to_string(),
        consumer: consumer.to_string(),
        provider,
    };

    (status, Json(body)).into_response()
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}
