//! Service registry abstraction used for datasource discovery
//!
//! The store only needs a point-in-time listing of services. Implementations:
//! - [`StaticRegistry`]: fixed in-memory list
//! - `KubeRegistry`: Kubernetes `Service` objects (enable with `kube` feature)

#[cfg(feature = "kube")]
pub mod kube;
pub mod registry;

#[cfg(feature = "kube")]
pub use self::kube::KubeRegistry;
pub use registry::StaticRegistry;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Named port exposed by a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePort {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    pub port: u16,
}

fn default_protocol() -> String {
    "TCP".to_string()
}

impl ServicePort {
    pub fn tcp(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            protocol: default_protocol(),
            port,
        }
    }
}

/// One service-like endpoint in the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Declaration order is significant for port selection
    #[serde(default)]
    pub ports: Vec<ServicePort>,
}

impl ServiceEntry {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            annotations: BTreeMap::new(),
            ports: Vec::new(),
        }
    }

    pub fn with_port(mut self, port: ServicePort) -> Self {
        self.ports.push(port);
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// The port named `http`, falling back to the first declared port
    pub fn endpoint_port(&self) -> Option<u16> {
        self.ports
            .iter()
            .find(|p| p.name == "http")
            .or_else(|| self.ports.first())
            .map(|p| p.port)
    }
}

/// Source of service entries
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// List every service visible to the caller in one round trip
    async fn list_all(&self) -> Result<Vec<ServiceEntry>, RegistryError>;
}

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Service listing timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Service registry unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to list services: {0}")]
    List(#[source] Box<dyn std::error::Error + Send + Sync>),
}
