//! Histogram recording with optional trace context.
//!
//! The OpenTelemetry metrics SDK samples exemplars from the context that is
//! current when a measurement is recorded. Recording "with context" therefore
//! means attaching the span's context around the `record` call; recording
//! "without context" attaches an empty context so an ambient span can never
//! leak into the sample.

use opentelemetry::metrics::Histogram;
use opentelemetry::{Context, KeyValue};

/// Sink for latency measurements.
pub trait LatencyRecorder {
    /// Record `latency` (ms) with `attributes`.
    ///
    /// When `cx` is `Some`, the measurement is linked to that trace context.
    fn record(&self, latency: u64, attributes: &[KeyValue], cx: Option<&Context>);
}

impl LatencyRecorder for Histogram<u64> {
    fn record(&self, latency: u64, attributes: &[KeyValue], cx: Option<&Context>) {
        let _guard = match cx {
            Some(cx) => cx.clone().attach(),
            None => Context::new().attach(),
        };
        Histogram::<u64>::record(self, latency, attributes);
    }
}

impl<R: LatencyRecorder + ?Sized> LatencyRecorder for &R {
    fn record(&self, latency: u64, attributes: &[KeyValue], cx: Option<&Context>) {
        (**self).record(latency, attributes, cx);
    }
}
