//! Synthetic telemetry generator.
//!
//! Runs a bounded loop where every iteration simulates one `GET /` request:
//!
//! 1. start a server span
//! 2. draw a latency
//! 3. record it into the latency histogram, linked to the span's context
//!    when the latency is above the threshold
//! 4. sleep for the configured interval
//! 5. end the span
//!
//! The tracer, the histogram and the latency source are all injected, so the
//! loop can be driven by the real SDK in the binary and by in-memory fakes
//! in tests.

pub mod latency;
pub mod recorder;

pub use latency::{LatencySource, RandomLatency, LATENCY_UPPER_BOUND};
pub use recorder::LatencyRecorder;

use std::time::Duration;

use clap::ValueEnum;
use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};
use tokio::sync::watch;

/// Name of the simulated server span.
pub const SPAN_NAME: &str = "GET /";

/// Latencies strictly above this value are recorded with trace context.
pub const DEFAULT_THRESHOLD: u64 = 8000;

/// Number of iterations a default run performs.
pub const DEFAULT_ITERATIONS: u64 = 500;

/// Pause between iterations, in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Pause between iterations.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(DEFAULT_INTERVAL_MS);

/// Attributes attached to every latency measurement.
pub fn measurement_attributes() -> [KeyValue; 1] {
    [KeyValue::new("feature", "Exemplar")]
}

/// What to do when the inter-iteration sleep is interrupted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum InterruptPolicy {
    /// Ignore the interrupt and move on to the next iteration.
    #[default]
    Continue,
    /// End the current span and return early.
    Stop,
}

/// Which iterations produce a log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogPolicy {
    /// Only iterations recorded with trace context.
    #[default]
    AboveThreshold,
    /// Every iteration.
    All,
    /// Nothing.
    Silent,
}

/// Tunables for a [`Generator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSettings {
    /// Sleep between iterations.
    pub interval: Duration,
    /// Latencies strictly greater than this carry trace context.
    pub threshold: u64,
    pub log_policy: LogPolicy,
    pub interrupt_policy: InterruptPolicy,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            threshold: DEFAULT_THRESHOLD,
            log_policy: LogPolicy::default(),
            interrupt_policy: InterruptPolicy::default(),
        }
    }
}

/// Outcome of a single [`Generator::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Iterations whose span was started, recorded and ended.
    pub completed: u64,
    /// Measurements recorded with trace context.
    pub with_context: u64,
    /// Measurements recorded without trace context.
    pub without_context: u64,
    /// True if the run returned early because of an interrupt.
    pub interrupted: bool,
}

/// Drives the simulated request loop.
pub struct Generator<T, H, L> {
    tracer: T,
    recorder: H,
    latency: L,
    settings: GeneratorSettings,
}

impl<T, H, L> Generator<T, H, L>
where
    T: Tracer,
    T::Span: Send + Sync + 'static,
    H: LatencyRecorder,
    L: LatencySource,
{
    /// Create a generator from its collaborators.
    pub fn new(tracer: T, recorder: H, latency: L, settings: GeneratorSettings) -> Self {
        Self {
            tracer,
            recorder,
            latency,
            settings,
        }
    }

    /// Run `iterations` simulated requests.
    ///
    /// Every value sent on `interrupts` cuts the current sleep short. Under
    /// [`InterruptPolicy::Continue`] the loop carries on and always performs
    /// all iterations; under [`InterruptPolicy::Stop`] it returns after
    /// ending the interrupted iteration's span. A closed channel never
    /// interrupts.
    pub async fn run(
        &mut self,
        iterations: u64,
        mut interrupts: watch::Receiver<bool>,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        for remaining in (1..=iterations).rev() {
            let span = self
                .tracer
                .span_builder(SPAN_NAME)
                .with_kind(SpanKind::Server)
                .start(&self.tracer);
            let cx = Context::current_with_span(span);

            let latency = self.latency.next_latency();
            let attributes = measurement_attributes();

            if latency > self.settings.threshold {
                if self.settings.log_policy != LogPolicy::Silent {
                    let span_context = cx.span().span_context().clone();
                    tracing::info!(remaining, latency, "Iterations to go");
                    tracing::info!(
                        latency,
                        trace_id = %span_context.trace_id(),
                        span_id = %span_context.span_id(),
                        "Recording latency with trace context"
                    );
                }
                self.recorder.record(latency, &attributes, Some(&cx));
                summary.with_context += 1;
            } else {
                if self.settings.log_policy == LogPolicy::All {
                    tracing::info!(remaining, latency, "Recording latency");
                }
                self.recorder.record(latency, &attributes, None);
                summary.without_context += 1;
            }

            let interrupted = self.pause(&mut interrupts).await;

            cx.span().end();
            summary.completed += 1;

            if interrupted {
                match self.settings.interrupt_policy {
                    InterruptPolicy::Continue => {
                        tracing::debug!(remaining, "Sleep interrupted, continuing");
                    }
                    InterruptPolicy::Stop => {
                        tracing::info!(
                            completed = summary.completed,
                            remaining = remaining - 1,
                            "Sleep interrupted, stopping"
                        );
                        summary.interrupted = true;
                        break;
                    }
                }
            }
        }

        summary
    }

    /// Sleep for the configured interval. Returns true if interrupted.
    async fn pause(&self, interrupts: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            () = tokio::time::sleep(self.settings.interval) => false,
            Ok(()) = interrupts.changed() => true,
        }
    }
}
