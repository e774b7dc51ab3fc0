//! exemplar-sim: synthetic request latencies linked to trace spans.
//!
//! # Usage
//!
//! ```bash
//! exemplar-sim 9464 --iterations 500 --interval-ms 1000
//! ```
//!
//! Prometheus can then scrape `http://<host>:9464/metrics`.
//!
//! Environment variables can also be used:
//! - `EXEMPLAR_SIM_PORT`: Scrape endpoint port
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: Send spans to a collector instead of stdout
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::Context as _;
use exemplar_sim::config::Config;
use exemplar_sim::generator::{Generator, RandomLatency, RunSummary};
use exemplar_sim::observability::prometheus::run_prometheus_server;
use exemplar_sim::observability::tracing::init_tracing;
use exemplar_sim::observability::Telemetry;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
  exemplar-sim v{}

  Configuration:
    Scrape:       http://{}/metrics
    Iterations:   {}
    Interval:     {} ms
    Threshold:    {} ms
    On interrupt: {:?}
    Spans:        {}
"#,
        version,
        config.metrics_addr(),
        config.iterations,
        config.interval_ms,
        config.threshold,
        config.interrupt_policy,
        config.otel_endpoint.as_deref().unwrap_or("stdout"),
    );
}

/// Resolve on SIGTERM. Never resolves where SIGTERM is unavailable.
#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

/// Route process signals.
///
/// The first Ctrl+C interrupts the generator's current pause, which the
/// generator handles per its interrupt policy. A second Ctrl+C or SIGTERM
/// requests shutdown through `stop_tx`.
async fn watch_signals(interrupt_tx: watch::Sender<bool>, stop_tx: watch::Sender<bool>) {
    let terminate = terminate();
    tokio::pin!(terminate);
    let mut interrupted = false;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
                    (&mut terminate).await;
                    tracing::info!("Received SIGTERM, initiating shutdown...");
                    break;
                }
                if interrupted {
                    tracing::info!("Received second SIGINT (Ctrl+C), initiating shutdown...");
                    break;
                }
                tracing::info!("Received SIGINT (Ctrl+C), press Ctrl+C again to shut down");
                interrupted = true;
                let _ = interrupt_tx.send(true);
            }
            () = &mut terminate => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
                break;
            }
        }
    }

    let _ = stop_tx.send(true);
}

/// Serve the scrape endpoint and run the generator.
///
/// Returns `None` when a shutdown signal ended the run early.
async fn run(config: Config, telemetry: &Telemetry) -> anyhow::Result<Option<RunSummary>> {
    let addr = config.metrics_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind scrape endpoint on {addr}"))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let registry = telemetry.registry().clone();
    let server = tokio::spawn(async move {
        if let Err(e) = run_prometheus_server(listener, registry, shutdown_rx).await {
            tracing::error!(error = %e, "Prometheus server error");
        }
    });

    let (interrupt_tx, interrupt_rx) = watch::channel(false);
    let (stop_tx, mut stop_rx) = watch::channel(false);
    tokio::spawn(watch_signals(interrupt_tx, stop_tx));

    let mut generator = Generator::new(
        telemetry.tracer(),
        telemetry.instruments().request_latency.clone(),
        RandomLatency::from_entropy(),
        config.generator_settings(),
    );
    // Dropping the in-flight iteration on shutdown ends its span.
    let summary = tokio::select! {
        summary = generator.run(config.iterations, interrupt_rx) => Some(summary),
        Ok(()) = stop_rx.changed() => {
            tracing::info!("Stopping generator");
            None
        }
    };

    let _ = shutdown_tx.send(true);
    server.await?;

    Ok(summary)
}

fn main() -> anyhow::Result<()> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    init_tracing(&config.log_level);

    // Providers are built before the runtime starts: the OTLP HTTP
    // client blocks and must not be created inside it.
    let telemetry = Telemetry::init(&config)?;

    print_banner(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(config, &telemetry));
    drop(runtime);

    if let Err(e) = telemetry.shutdown() {
        tracing::warn!(error = %e, "Telemetry shutdown failed");
    }

    match result? {
        Some(summary) => tracing::info!(
            completed = summary.completed,
            with_context = summary.with_context,
            without_context = summary.without_context,
            interrupted = summary.interrupted,
            "Exiting"
        ),
        None => tracing::info!("Exiting after shutdown signal"),
    }
    Ok(())
}
