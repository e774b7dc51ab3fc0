//! exemplar-sim: synthetic OpenTelemetry traffic for exemplar experiments.
//!
//! The binary serves a Prometheus scrape endpoint and, once per interval,
//! simulates a `GET /` request: it opens a server span, draws a random
//! latency and records it into a histogram. Slow requests are recorded with
//! the span's context attached so the metrics pipeline can link the sample
//! to the trace that produced it.
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`generator`]: The timed latency loop and its injectable seams
//! - [`observability`]: Logging, tracer/meter providers, scrape endpoint

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // generator::GeneratorSettings is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod config;
pub mod generator;
pub mod observability;

pub use generator::{
    Generator, GeneratorSettings, InterruptPolicy, LatencyRecorder, LatencySource, LogPolicy,
    RandomLatency, RunSummary,
};
