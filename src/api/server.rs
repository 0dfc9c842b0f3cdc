use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    alerting_plan, get_datasource, health_check, list_datasources, send_test_alert, AppState,
};
use crate::alerts::{AlertDispatcher, AlertingFile, AlertingPlan, DEFAULT_ALERTING_FILE};
use crate::config::{load_rule_files, load_yaml, DatasourcesConfig};
use crate::discovery::ServiceRegistry;
use crate::store::DatasourceStore;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub datasources_file: PathBuf,
    pub alerting_file: PathBuf,
    pub alertrules_dir: PathBuf,
}

impl ServerConfig {
    /// Read settings from `VENTANA_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let path_var = |name: &str, default: PathBuf| {
            std::env::var(name).map(PathBuf::from).unwrap_or(default)
        };

        Self {
            host: std::env::var("VENTANA_HOST").unwrap_or(defaults.host),
            port: std::env::var("VENTANA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            datasources_file: path_var("VENTANA_DATASOURCES_FILE", defaults.datasources_file),
            alerting_file: path_var("VENTANA_ALERTING_FILE", defaults.alerting_file),
            alertrules_dir: path_var("VENTANA_ALERTRULES_DIR", defaults.alertrules_dir),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            datasources_file: PathBuf::from("etc/datasources.yml"),
            alerting_file: PathBuf::from(DEFAULT_ALERTING_FILE),
            alertrules_dir: PathBuf::from("etc/alertrules"),
        }
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Datasources
        .route("/api/datasources", get(list_datasources))
        .route("/api/datasources/:name", get(get_datasource))
        // Alerting
        .route("/api/alerts", get(alerting_plan))
        .route("/api/alerts/test", post(send_test_alert))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Resolve datasources, assemble alerting, then serve HTTP until Ctrl+C
pub async fn run_server(
    config: ServerConfig,
    registry: Option<&dyn ServiceRegistry>,
) -> Result<(), Box<dyn std::error::Error>> {
    let datasources_config: DatasourcesConfig = load_yaml(&config.datasources_file)?;
    let store = Arc::new(DatasourceStore::load(datasources_config, registry).await?);
    for ds in store.datasources() {
        tracing::info!(
            name = %ds.name,
            ds_type = %ds.ds_type,
            url = %ds.url,
            main = ds.is_main,
            discovered = ds.is_discovered,
            "Datasource ready"
        );
    }

    let rule_files = load_rule_files(&config.alertrules_dir)?;
    let alerting_file = AlertingFile::load_or_default(Some(&config.alerting_file));

    // validate the plan once at startup; handlers rebuild it per request
    let plan = AlertingPlan::build(alerting_file.clone(), &rule_files, &store);
    match plan.alertmanager_url() {
        Some(url) => tracing::info!("Alert receiver: {}", url),
        None => tracing::warn!("No alert receiver configured"),
    }
    drop(plan);

    let state = Arc::new(AppState {
        store,
        rule_files,
        alerting_file,
        dispatcher: AlertDispatcher::new()?,
    });

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting Ventana server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Ventana server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertingEndpoint;
    use crate::config::{
        Datasource, DatasourceSelector, DatasourceSystem, DatasourceType, Rule, RuleFile,
        RuleGroup,
    };
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::collections::BTreeMap;
    use tower::util::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_state(alerting_file: AlertingFile) -> Arc<AppState> {
        let store = DatasourceStore::new(DatasourcesConfig {
            datasources: vec![
                Datasource::new(DatasourceType::Prometheus, "prometheus", "http://prometheus:9090"),
                Datasource::new(DatasourceType::Lethe, "lethe", "http://lethe:3100")
                    .with_basic_auth("admin", "hunter2"),
            ],
            ..Default::default()
        })
        .unwrap()
        .with_discovered(vec![Datasource {
            is_discovered: true,
            ..Datasource::new(
                DatasourceType::Prometheus,
                "prometheus.monitoring",
                "http://prometheus.monitoring:9090",
            )
        }]);

        let rule_files = vec![RuleFile {
            kind: None,
            common_labels: BTreeMap::new(),
            datasource_selector: DatasourceSelector::new(
                DatasourceSystem::Any,
                Some(DatasourceType::Prometheus),
            ),
            rule_groups: vec![RuleGroup {
                name: "sample".to_string(),
                interval: None,
                rules: vec![Rule {
                    alert: "AlwaysOn".to_string(),
                    expr: "vector(1)".to_string(),
                    for_duration: None,
                    labels: BTreeMap::new(),
                    annotations: BTreeMap::new(),
                }],
            }],
        }];

        Arc::new(AppState {
            store: Arc::new(store),
            rule_files,
            alerting_file,
            dispatcher: AlertDispatcher::new().unwrap(),
        })
    }

    fn create_test_app() -> Router {
        build_router(make_state(AlertingFile::default()))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_datasources() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/datasources")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let datasources = body["datasources"].as_array().unwrap();
        assert_eq!(datasources.len(), 3);
        assert_eq!(datasources[2]["name"], "prometheus.monitoring");
        assert_eq!(datasources[2]["isDiscovered"], true);
        assert_eq!(datasources[1]["basicAuth"]["user"], "admin");
        assert!(!body.to_string().contains("hunter2"));
        assert_eq!(body["query_timeout_ms"], 30_000);
    }

    #[tokio::test]
    async fn test_list_datasources_saturates_query_timeout() {
        let store = DatasourceStore::new(DatasourcesConfig {
            query_timeout: std::time::Duration::MAX,
            ..Default::default()
        })
        .unwrap();
        let app = build_router(Arc::new(AppState {
            store: Arc::new(store),
            rule_files: Vec::new(),
            alerting_file: AlertingFile::default(),
            dispatcher: AlertDispatcher::new().unwrap(),
        }));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/datasources")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["query_timeout_ms"], u64::MAX);
    }

    #[tokio::test]
    async fn test_datasource_not_found() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/datasources/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_alerting_plan() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/alerts")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let alerts = &body["alertFiles"][0]["alertGroups"][0]["ruleAlerts"][0]["alerts"];
        assert_eq!(alerts.as_array().unwrap().len(), 2);
        assert_eq!(alerts[1]["datasource"]["name"], "prometheus.monitoring");
    }

    #[tokio::test]
    async fn test_send_test_alert_reports_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/alerts"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let app = build_router(make_state(AlertingFile {
            alertings: vec![AlertingEndpoint { url: server.uri() }],
        }));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/alerts/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_send_test_alert_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/alerts"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let app = build_router(make_state(AlertingFile {
            alertings: vec![AlertingEndpoint { url: server.uri() }],
        }));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/alerts/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["sent"], true);
        assert_eq!(body["receiver"], server.uri());
    }
}
