//! Logging and OpenTelemetry tracing setup.
//!
//! Configures:
//! - Console logging with structured format
//! - A tracer provider exporting spans to stdout, or to an OTLP collector
//!   when an endpoint is configured

use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::TelemetryError;

/// Instrumentation scope name for the simulated HTTP server spans.
pub const TRACER_NAME: &str = "exemplar-sim.http";

/// Initialize logging at the given level.
///
/// `RUST_LOG` directives take precedence over `log_level` when set.
///
/// # Panics
///
/// Panics if logging has already been initialized.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    tracing::info!(level = log_level, "Logging initialized");
}

/// Initialize logging for tests (only logs errors).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}

/// Build the tracer provider.
///
/// Spans go through a batch processor to the OTLP collector at
/// `otlp_endpoint` when given, otherwise through a simple processor to
/// stdout.
///
/// Must be called outside of an async runtime: the OTLP HTTP client is
/// blocking.
pub fn build_tracer_provider(
    resource: Resource,
    otlp_endpoint: Option<&str>,
) -> Result<SdkTracerProvider, TelemetryError> {
    let builder = SdkTracerProvider::builder().with_resource(resource);

    let provider = match otlp_endpoint {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_http()
                .with_endpoint(endpoint)
                .build()
                .map_err(|e| TelemetryError::Exporter(e.to_string()))?;
            tracing::info!(endpoint, "OTLP span exporter configured");
            builder.with_batch_exporter(exporter).build()
        }
        None => {
            tracing::debug!("No OTLP endpoint, logging spans to stdout");
            builder
                .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
                .build()
        }
    };

    Ok(provider)
}
