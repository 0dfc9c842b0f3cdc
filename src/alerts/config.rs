//! Alert receiver configuration (`alerting.yml`)

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{load_yaml, ConfigError};

/// Default location of the alerting file
pub const DEFAULT_ALERTING_FILE: &str = "etc/alerting.yml";

/// Alert receiver endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertingEndpoint {
    pub url: String,
}

/// Contents of `alerting.yml`. The first endpoint is the active receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertingFile {
    #[serde(default)]
    pub alertings: Vec<AlertingEndpoint>,
}

impl AlertingFile {
    /// Strictly parse the alerting file; unknown keys are an error
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!(file = %path.display(), "Loading alerting file");
        load_yaml(path)
    }

    /// Like [`AlertingFile::load`], but a failure is logged and yields an
    /// empty endpoint list. `None` reads [`DEFAULT_ALERTING_FILE`].
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_ALERTING_FILE));
        match Self::load(path) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load alerting file, no alert receivers");
                Self::default()
            }
        }
    }

    /// URL of the active receiver, if any
    pub fn alertmanager_url(&self) -> Option<&str> {
        self.alertings.first().map(|a| a.url.as_str())
    }
}
