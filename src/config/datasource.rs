//! Datasource configuration types

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Kind of query backend a datasource points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasourceType {
    /// Metrics backend (Prometheus-compatible)
    Prometheus,
    /// Log backend (Lethe)
    Lethe,
}

impl DatasourceType {
    pub const ALL: [DatasourceType; 2] = [DatasourceType::Prometheus, DatasourceType::Lethe];

    /// Canonical short name, also the service name matched during discovery
    pub fn short_name(&self) -> &'static str {
        match self {
            DatasourceType::Prometheus => "prometheus",
            DatasourceType::Lethe => "lethe",
        }
    }
}

impl fmt::Display for DatasourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for DatasourceType {
    type Err = String;

    /// Accepts the short names and the generic `metrics`/`logs` aliases
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prometheus" | "metrics" => Ok(DatasourceType::Prometheus),
            "lethe" | "logs" => Ok(DatasourceType::Lethe),
            other => Err(format!("unknown datasource type '{}'", other)),
        }
    }
}

/// HTTP basic auth credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub user: String,
    #[serde(skip_serializing, default)]
    pub password: String,
}

/// A named, typed query backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datasource {
    #[serde(rename = "type")]
    pub ds_type: DatasourceType,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuth>,
    #[serde(default)]
    pub is_main: bool,
    /// Only set by registry discovery, never read from config
    #[serde(default, skip_deserializing)]
    pub is_discovered: bool,
}

impl Datasource {
    /// Create a statically configured datasource
    pub fn new(ds_type: DatasourceType, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            ds_type,
            name: name.into(),
            url: url.into(),
            basic_auth: None,
            is_main: false,
            is_discovered: false,
        }
    }

    /// Mark as the main datasource of its type
    pub fn with_main(mut self, is_main: bool) -> Self {
        self.is_main = is_main;
        self
    }

    /// Attach basic auth credentials
    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some(BasicAuth {
            user: user.into(),
            password: password.into(),
        });
        self
    }
}

/// What to do when registry discovery fails at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log and continue with the static datasources only
    #[default]
    Degrade,
    /// Fail store construction
    Abort,
}

/// Registry discovery settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub enabled: bool,
    /// When set, only this annotation decides the datasource type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_key: Option<String>,
    #[serde(default)]
    pub by_name_prometheus: bool,
    #[serde(default)]
    pub by_name_lethe: bool,
    /// Upper bound for a single registry listing
    #[serde(default = "default_discovery_timeout", with = "super::duration")]
    pub timeout: Duration,
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

impl DiscoveryConfig {
    /// Annotation key, if one is configured and non-empty
    pub fn annotation_key(&self) -> Option<&str> {
        self.annotation_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Whether name matching is enabled for a datasource type
    pub fn by_name(&self, ds_type: DatasourceType) -> bool {
        match ds_type {
            DatasourceType::Prometheus => self.by_name_prometheus,
            DatasourceType::Lethe => self.by_name_lethe,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            annotation_key: None,
            by_name_prometheus: false,
            by_name_lethe: false,
            timeout: default_discovery_timeout(),
            on_failure: FailurePolicy::default(),
        }
    }
}

fn default_discovery_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_query_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Contents of `datasources.yml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourcesConfig {
    #[serde(default = "default_query_timeout", with = "super::duration")]
    pub query_timeout: Duration,
    #[serde(default)]
    pub datasources: Vec<Datasource>,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl Default for DatasourcesConfig {
    fn default() -> Self {
        Self {
            query_timeout: default_query_timeout(),
            datasources: Vec::new(),
            discovery: DiscoveryConfig::default(),
        }
    }
}
