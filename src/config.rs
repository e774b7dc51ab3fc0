//! Configuration parsing for exemplar-sim.
//!
//! Supports:
//! - A required positional scrape port
//! - CLI options with environment variable fallbacks
//! - Defaults that reproduce the reference run (500 iterations, 1s apart)

use clap::Parser;
use std::time::Duration;

use crate::generator::{
    GeneratorSettings, InterruptPolicy, LogPolicy, DEFAULT_INTERVAL_MS, DEFAULT_ITERATIONS,
    DEFAULT_THRESHOLD,
};

/// Emit synthetic request latencies linked to trace spans, scraped by Prometheus.
#[derive(Parser, Debug, Clone)]
#[command(name = "exemplar-sim")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Port for the Prometheus scrape endpoint
    #[arg(env = "EXEMPLAR_SIM_PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Host address the scrape endpoint binds to
    #[arg(long, env = "EXEMPLAR_SIM_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Number of simulated requests
    #[arg(
        short = 'n',
        long,
        env = "EXEMPLAR_SIM_ITERATIONS",
        default_value_t = DEFAULT_ITERATIONS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub iterations: u64,

    /// Pause between simulated requests, in milliseconds
    #[arg(long, env = "EXEMPLAR_SIM_INTERVAL_MS", default_value_t = DEFAULT_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Latencies above this value (ms) are recorded with trace context
    #[arg(long, env = "EXEMPLAR_SIM_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: u64,

    /// Which iterations are logged
    #[arg(long, value_enum, default_value_t = LogPolicy::AboveThreshold)]
    pub log_policy: LogPolicy,

    /// Behavior when Ctrl+C interrupts the pause between requests
    #[arg(long = "on-interrupt", value_enum, default_value_t = InterruptPolicy::Continue)]
    pub interrupt_policy: InterruptPolicy,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// OpenTelemetry collector endpoint for span export (optional)
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otel_endpoint: Option<String>,

    /// Service name reported on spans and metrics
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "exemplar-sim")]
    pub service_name: String,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Settings for the latency generator.
    pub fn generator_settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            interval: Duration::from_millis(self.interval_ms),
            threshold: self.threshold,
            log_policy: self.log_policy,
            interrupt_policy: self.interrupt_policy,
        }
    }

    /// Address string for the scrape endpoint.
    pub fn metrics_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Create a configuration for tests that finishes quickly.
    #[cfg(test)]
    pub fn test_config(port: u16) -> Self {
        Self {
            port,
            host: "127.0.0.1".into(),
            iterations: 3,
            interval_ms: 10,
            log_level: "debug".into(),
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 9464,
            host: "0.0.0.0".into(),
            iterations: DEFAULT_ITERATIONS,
            interval_ms: DEFAULT_INTERVAL_MS,
            threshold: DEFAULT_THRESHOLD,
            log_policy: LogPolicy::AboveThreshold,
            interrupt_policy: InterruptPolicy::Continue,
            log_level: "info".into(),
            otel_endpoint: None,
            service_name: "exemplar-sim".into(),
        }
    }
}
