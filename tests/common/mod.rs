//! Test utilities for exemplar-sim integration tests.
//!
//! Provides:
//! - A recording histogram that captures every measurement
//! - A scripted latency source
//! - An SDK tracer backed by the in-memory span exporter

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use exemplar_sim::generator::{GeneratorSettings, LatencyRecorder, LatencySource};
use opentelemetry::trace::{SpanContext, TraceContextExt, TracerProvider};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};

/// One captured `record` call.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub latency: u64,
    pub attributes: Vec<KeyValue>,
    /// Span context attached to the measurement, if any.
    pub span_context: Option<SpanContext>,
    /// Finished spans at the moment of recording, when a probe is set.
    pub finished_spans: Option<usize>,
}

/// Histogram fake that keeps every measurement.
///
/// Clones share storage, so a test can keep one handle while the
/// generator owns another.
#[derive(Clone, Default)]
pub struct RecordingHistogram {
    records: Arc<Mutex<Vec<Recorded>>>,
    exporter: Option<InMemorySpanExporter>,
}

impl RecordingHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also note how many spans had finished at each recording.
    pub fn with_span_probe(exporter: InMemorySpanExporter) -> Self {
        Self {
            records: Arc::default(),
            exporter: Some(exporter),
        }
    }

    pub fn records(&self) -> Vec<Recorded> {
        self.records.lock().unwrap().clone()
    }

    pub fn with_context(&self) -> usize {
        self.records()
            .iter()
            .filter(|r| r.span_context.is_some())
            .count()
    }

    pub fn without_context(&self) -> usize {
        self.records()
            .iter()
            .filter(|r| r.span_context.is_none())
            .count()
    }
}

impl LatencyRecorder for RecordingHistogram {
    fn record(&self, latency: u64, attributes: &[KeyValue], cx: Option<&Context>) {
        let finished_spans = self
            .exporter
            .as_ref()
            .map(|e| e.get_finished_spans().unwrap().len());
        self.records.lock().unwrap().push(Recorded {
            latency,
            attributes: attributes.to_vec(),
            span_context: cx.map(|cx| cx.span().span_context().clone()),
            finished_spans,
        });
    }
}

/// Latency source replaying a fixed script, then repeating its last value.
pub struct ScriptedLatency {
    script: VecDeque<u64>,
    last: u64,
}

impl ScriptedLatency {
    pub fn new(values: impl IntoIterator<Item = u64>) -> Self {
        Self {
            script: values.into_iter().collect(),
            last: 0,
        }
    }
}

impl LatencySource for ScriptedLatency {
    fn next_latency(&mut self) -> u64 {
        if let Some(value) = self.script.pop_front() {
            self.last = value;
        }
        self.last
    }
}

/// SDK tracer provider exporting synchronously into memory.
pub fn in_memory_tracing() -> (SdkTracerProvider, InMemorySpanExporter) {
    let exporter = InMemorySpanExporter::default();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    (provider, exporter)
}

/// Tracer for the simulated server spans.
pub fn tracer(provider: &SdkTracerProvider) -> <SdkTracerProvider as TracerProvider>::Tracer {
    provider.tracer("exemplar-sim-test")
}

/// Default settings with a short interval.
pub fn fast_settings() -> GeneratorSettings {
    GeneratorSettings {
        interval: Duration::from_millis(10),
        ..GeneratorSettings::default()
    }
}
