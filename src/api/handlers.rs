use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::alerts::{AlertDispatcher, AlertingFile, AlertingPlan};
use crate::config::{Datasource, RuleFile};
use crate::store::DatasourceStore;

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<DatasourceStore>,
    pub rule_files: Vec<RuleFile>,
    pub alerting_file: AlertingFile,
    pub dispatcher: AlertDispatcher,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Datasources
// ============================================================================

#[derive(Serialize)]
pub struct DatasourcesResponse {
    pub datasources: Vec<Datasource>,
    pub query_timeout_ms: u64,
}

pub async fn list_datasources(State(state): State<Arc<AppState>>) -> Json<DatasourcesResponse> {
    Json(DatasourcesResponse {
        datasources: state.store.datasources().to_vec(),
        query_timeout_ms: u64::try_from(state.store.query_timeout().as_millis())
            .unwrap_or(u64::MAX),
    })
}

pub async fn get_datasource(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Datasource>, ApiError> {
    state
        .store
        .datasource_by_name(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Datasource '{}' not found", name)))
}

// ============================================================================
// Alerting
// ============================================================================

pub async fn alerting_plan(State(state): State<Arc<AppState>>) -> Response {
    let plan = AlertingPlan::build(state.alerting_file.clone(), &state.rule_files, &state.store);
    Json(&plan).into_response()
}

#[derive(Serialize)]
pub struct TestAlertResponse {
    pub sent: bool,
    pub receiver: String,
}

pub async fn send_test_alert(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TestAlertResponse>, ApiError> {
    state
        .dispatcher
        .send_test_alert(&state.alerting_file)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Test alert failed");
            ApiError::Dispatch(e.to_string())
        })?;

    Ok(Json(TestAlertResponse {
        sent: true,
        receiver: state
            .alerting_file
            .alertmanager_url()
            .unwrap_or_default()
            .to_string(),
    }))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Dispatch(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Dispatch(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
