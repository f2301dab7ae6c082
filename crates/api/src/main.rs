//! API server entry point.

use std::time::Duration;

use api::config::Config;
use catalog::PolicyTable;
use policy::RuleRegistry;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const AUDIT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Loads the policy file when configured, the built-in catalog otherwise.
fn load_registry(config: &Config) -> catalog::Result<RuleRegistry> {
    match &config.policy_file {
        Some(path) => PolicyTable::from_path(path)?.into_registry(),
        None => {
            tracing::info!("POLICY_FILE not set, using built-in commerce catalog");
            catalog::commerce_registry()
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Build the registry; a broken policy table stops startup
    let registry = match load_registry(&config) {
        Ok(registry) => registry,
        Err(err) => {
            tracing::error!(error = %err, "failed to load policies");
            std::process::exit(1);
        }
    };

    // 4. Create application state with the audit writer
    let (state, audit_worker) = api::create_default_state(registry, config.audit_buffer);
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 6. Flush queued audit records once the router (and its state) is gone
    match tokio::time::timeout(AUDIT_FLUSH_TIMEOUT, audit_worker.finish()).await {
        Ok(written) => tracing::info!(audit_records_written = written, "audit log flushed"),
        Err(_) => tracing::warn!("audit writer did not finish in time"),
    }
    tracing::info!("server shut down gracefully");
}
