//! Alert delivery to the alert receiver (Alertmanager v1 API)

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::config::AlertingFile;

/// Client timeout for alert delivery
pub const DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Alert as posted to `/api/v1/alerts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fire {
    pub labels: BTreeMap<String, String>,
}

impl Fire {
    /// Synthetic alert used to check receiver connectivity
    pub fn test_alert() -> Self {
        let labels = BTreeMap::from([
            ("test".to_string(), "test".to_string()),
            ("severity".to_string(), "info".to_string()),
            ("time".to_string(), chrono::Utc::now().to_rfc3339()),
        ]);
        Self { labels }
    }
}

/// Sends alerts to the configured receiver
#[derive(Debug, Clone)]
pub struct AlertDispatcher {
    client: reqwest::Client,
}

impl AlertDispatcher {
    /// Create a dispatcher with the default 5 second timeout
    pub fn new() -> Result<Self, DispatchError> {
        Self::with_timeout(DISPATCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DispatchError::Client)?;
        Ok(Self { client })
    }

    /// Send one synthetic alert to the first receiver in `alerting`
    pub async fn send_test_alert(&self, alerting: &AlertingFile) -> Result<(), DispatchError> {
        let base = alerting.alertmanager_url().ok_or(DispatchError::NoReceiver)?;
        self.send(base, &[Fire::test_alert()]).await
    }

    /// POST `fires` to `<base>/api/v1/alerts`; only HTTP 200 counts as success
    pub async fn send(&self, base: &str, fires: &[Fire]) -> Result<(), DispatchError> {
        let body = serde_json::to_vec(fires).map_err(DispatchError::Marshal)?;
        let url = format!("{}/api/v1/alerts", base.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(DispatchError::Network)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DispatchError::NonOkStatus(status));
        }

        tracing::debug!(url = %url, alerts = fires.len(), "Alerts sent");
        Ok(())
    }
}

/// Alert delivery errors
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Failed to serialize alerts: {0}")]
    Marshal(#[source] serde_json::Error),

    #[error("Failed to send alerts: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Alert receiver returned status {0}, expected 200")]
    NonOkStatus(StatusCode),

    #[error("No alert receiver configured")]
    NoReceiver,

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
