//! OpenTelemetry metrics backed by a Prometheus registry.
//!
//! Instruments:
//! - request.latency: Histogram of simulated request latency in ms
//! - request.count: Counter for requests (declared, never incremented)

use opentelemetry::metrics::{Counter, Histogram, Meter, MeterProvider};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::Resource;
use prometheus::Registry;

use super::TelemetryError;

/// Instrumentation scope name for the generator's instruments.
pub const METER_NAME: &str = "exemplar-sim";

/// Instruments shared by every iteration of every run.
#[derive(Debug, Clone)]
pub struct Instruments {
    /// Histogram of simulated request latency in milliseconds.
    pub request_latency: Histogram<u64>,
    /// Request counter. Kept for parity with the instrument set; nothing
    /// increments it.
    pub request_count: Option<Counter<u64>>,
}

impl Instruments {
    /// Create the instrument set from a meter.
    pub fn new(meter: &Meter) -> Self {
        Self {
            request_latency: meter
                .u64_histogram("request.latency")
                .with_description("request latency")
                .with_unit("ms")
                .build(),
            request_count: Some(
                meter
                    .u64_counter("request.count")
                    .with_description("request count")
                    .build(),
            ),
        }
    }

    /// Create the instrument set from a provider's generator meter.
    pub fn from_provider(provider: &SdkMeterProvider) -> Self {
        Self::new(&provider.meter(METER_NAME))
    }
}

/// Build a meter provider whose metrics are collected into `registry`
/// whenever the registry is gathered.
pub fn build_meter_provider(
    resource: Resource,
    registry: &Registry,
) -> Result<SdkMeterProvider, TelemetryError> {
    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    Ok(SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(exporter)
        .build())
}
