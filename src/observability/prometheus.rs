//! Prometheus HTTP endpoint for metrics scraping.
//!
//! Provides:
//! - `/metrics` - Prometheus text exposition of the generator's instruments
//! - `/health` - Basic health check
//! - `/ready` - Readiness check

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::{Encoder, Registry, TextEncoder, TEXT_FORMAT};
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Scrape endpoint state.
#[derive(Clone)]
pub struct ScrapeState {
    registry: Registry,
}

impl ScrapeState {
    /// Serve the given registry. The OpenTelemetry exporter collects into it
    /// on every gather.
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

/// Create the scrape HTTP router.
pub fn create_router(state: ScrapeState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(state)
}

/// Handle GET /metrics.
async fn metrics_handler(State(state): State<ScrapeState>) -> impl IntoResponse {
    let metric_families = state.registry.gather();

    let mut buffer = Vec::new();
    match TextEncoder::new().encode(&metric_families, &mut buffer) {
        Ok(()) => (StatusCode::OK, [(CONTENT_TYPE, TEXT_FORMAT)], buffer),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("Failed to encode metrics: {e}").into_bytes(),
            )
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn ready_handler() -> impl IntoResponse {
    (StatusCode::OK, "READY")
}

/// Run the scrape server on an already bound listener until `shutdown_rx`
/// changes or closes.
pub async fn run_prometheus_server(
    listener: TcpListener,
    registry: Registry,
    mut shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let app = create_router(ScrapeState::new(registry));

    tracing::info!(address = %listener.local_addr()?, "Serving Prometheus scrape endpoint");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("Scrape endpoint shutting down");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{measurement_attributes, LatencyRecorder};
    use crate::observability::metrics::{build_meter_provider, Instruments};
    use axum::body::Body;
    use axum::http::Request;
    use opentelemetry_sdk::Resource;
    use tower::ServiceExt;

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(ScrapeState::new(Registry::new()));
        let (status, body) = get_body(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_ready_endpoint() {
        let app = create_router(ScrapeState::new(Registry::new()));
        let (status, body) = get_body(app, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "READY");
    }

    #[tokio::test]
    async fn test_metrics_endpoint_exposes_latency_histogram() {
        let registry = Registry::new();
        let resource = Resource::builder().with_service_name("test").build();
        let provider = build_meter_provider(resource, &registry).unwrap();
        let instruments = Instruments::from_provider(&provider);

        LatencyRecorder::record(
            &instruments.request_latency,
            1234,
            &measurement_attributes(),
            None,
        );

        let app = create_router(ScrapeState::new(registry));
        let (status, body) = get_body(app, "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("request_latency"), "missing histogram:\n{body}");
        assert!(body.contains("1234"), "missing recorded sum:\n{body}");
    }

    #[tokio::test]
    async fn test_server_shuts_down_on_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = tokio::spawn(run_prometheus_server(
            listener,
            Registry::new(),
            shutdown_rx,
        ));

        shutdown_tx.send(true).unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
            .await
            .expect("server did not shut down")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let app = create_router(ScrapeState::new(Registry::new()));
        let (status, _) = get_body(app, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
