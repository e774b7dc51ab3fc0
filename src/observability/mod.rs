//! OpenTelemetry observability infrastructure.
//!
//! Provides:
//! - Structured logging
//! - A tracer provider for the simulated request spans
//! - A meter provider collected into a Prometheus registry
//! - HTTP endpoints for Prometheus scraping

pub mod metrics;
pub mod prometheus;
pub mod tracing;

use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use thiserror::Error;

use self::metrics::{build_meter_provider, Instruments};
use self::tracing::{build_tracer_provider, TRACER_NAME};
use crate::config::Config;

/// Error type for telemetry setup and teardown.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to build exporter: {0}")]
    Exporter(String),

    #[error("Failed to shut down {provider} provider: {reason}")]
    Shutdown {
        provider: &'static str,
        reason: String,
    },
}

/// Tracer and meter providers plus the registry the scrape endpoint serves.
pub struct Telemetry {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
    registry: ::prometheus::Registry,
    instruments: Instruments,
}

impl Telemetry {
    /// Build the providers described by `config`.
    ///
    /// Also installs the W3C trace-context propagator globally. Providers
    /// are not installed globally; callers hand out [`Telemetry::tracer`]
    /// and [`Telemetry::instruments`] explicitly.
    pub fn init(config: &Config) -> Result<Self, TelemetryError> {
        let resource = Resource::builder()
            .with_service_name(config.service_name.clone())
            .build();

        global::set_text_map_propagator(TraceContextPropagator::new());

        let tracer_provider =
            build_tracer_provider(resource.clone(), config.otel_endpoint.as_deref())?;

        let registry = ::prometheus::Registry::new();
        let meter_provider = build_meter_provider(resource, &registry)?;
        let instruments = Instruments::from_provider(&meter_provider);

        Ok(Self {
            tracer_provider,
            meter_provider,
            registry,
            instruments,
        })
    }

    /// Tracer for the simulated server spans.
    pub fn tracer(&self) -> <SdkTracerProvider as TracerProvider>::Tracer {
        self.tracer_provider.tracer(TRACER_NAME)
    }

    pub fn instruments(&self) -> &Instruments {
        &self.instruments
    }

    /// Registry to expose on the scrape endpoint.
    pub fn registry(&self) -> &::prometheus::Registry {
        &self.registry
    }

    /// Flush and shut down both providers.
    ///
    /// Both providers are always shut down; the first failure is returned.
    pub fn shutdown(self) -> Result<(), TelemetryError> {
        let traces = self
            .tracer_provider
            .shutdown()
            .map_err(|e| TelemetryError::Shutdown {
                provider: "tracer",
                reason: e.to_string(),
            });
        let metrics = self
            .meter_provider
            .shutdown()
            .map_err(|e| TelemetryError::Shutdown {
                provider: "meter",
                reason: e.to_string(),
            });
        traces.and(metrics)
    }
}
