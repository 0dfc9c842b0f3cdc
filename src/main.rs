//! Ventana Server
//!
//! Run with: cargo run (add `--features kube` for cluster discovery)
//!
//! Environment variables:
//! - VENTANA_HOST: Bind address (default: 0.0.0.0)
//! - VENTANA_PORT: Port number (default: 8080)
//! - VENTANA_DATASOURCES_FILE: Datasource config (default: etc/datasources.yml)
//! - VENTANA_ALERTING_FILE: Alert receivers (default: etc/alerting.yml)
//! - VENTANA_ALERTRULES_DIR: Rule file directory (default: etc/alertrules)
//! - RUST_LOG: Log level (default: info)

use ventana::api::{run_server, ServerConfig};
use ventana::discovery::ServiceRegistry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ventana=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    tracing::info!("Ventana configuration:");
    tracing::info!("  Listen: {}:{}", config.host, config.port);
    tracing::info!("  Datasources: {}", config.datasources_file.display());
    tracing::info!("  Alerting: {}", config.alerting_file.display());
    tracing::info!("  Alert rules: {}", config.alertrules_dir.display());

    #[cfg(feature = "kube")]
    let kube_registry = match ventana::discovery::KubeRegistry::try_default().await {
        Ok(registry) => Some(registry),
        Err(e) => {
            tracing::info!("Kubernetes registry unavailable: {}", e);
            None
        }
    };
    #[cfg(feature = "kube")]
    let registry = kube_registry
        .as_ref()
        .map(|r| r as &dyn ServiceRegistry);
    #[cfg(not(feature = "kube"))]
    let registry: Option<&dyn ServiceRegistry> = None;

    run_server(config, registry).await
}
