//! Kubernetes service registry
//!
//! Lists `Service` objects across all namespaces the client can see.
//! Credentials come from the in-cluster service account or the local
//! kubeconfig, whichever `kube::Client::try_default` finds first.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use ::kube::api::{Api, ListParams};
use ::kube::Client;

use super::{RegistryError, ServiceEntry, ServicePort, ServiceRegistry};

/// Registry backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeRegistry {
    client: Client,
}

impl KubeRegistry {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the default client configuration
    pub async fn try_default() -> Result<Self, RegistryError> {
        let client = Client::try_default()
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl ServiceRegistry for KubeRegistry {
    async fn list_all(&self) -> Result<Vec<ServiceEntry>, RegistryError> {
        let services: Api<Service> = Api::all(self.client.clone());
        let list = services
            .list(&ListParams::default())
            .await
            .map_err(|e| RegistryError::List(Box::new(e)))?;

        Ok(list.items.into_iter().map(service_entry).collect())
    }
}

fn service_entry(service: Service) -> ServiceEntry {
    let ports = service
        .spec
        .and_then(|spec| spec.ports)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| {
            let port = u16::try_from(p.port).ok()?;
            Some(ServicePort {
                name: p.name.unwrap_or_default(),
                protocol: p.protocol.unwrap_or_else(|| "TCP".to_string()),
                port,
            })
        })
        .collect();

    ServiceEntry {
        name: service.metadata.name.unwrap_or_default(),
        namespace: service.metadata.namespace.unwrap_or_default(),
        annotations: service.metadata.annotations.unwrap_or_default(),
        ports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{ServicePort as KubeServicePort, ServiceSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    #[test]
    fn test_service_entry_conversion() {
        let service = Service {
            metadata: ObjectMeta {
                name: Some("lethe".to_string()),
                namespace: Some("kuoss".to_string()),
                annotations: Some(BTreeMap::from([(
                    "kuoss.org/datasource-type".to_string(),
                    "lethe".to_string(),
                )])),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                ports: Some(vec![
                    KubeServicePort {
                        name: Some("testport".to_string()),
                        protocol: Some("TCP".to_string()),
                        port: 30900,
                        ..Default::default()
                    },
                    KubeServicePort {
                        name: Some("http".to_string()),
                        port: 8080,
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let entry = service_entry(service);
        assert_eq!(entry.name, "lethe");
        assert_eq!(entry.namespace, "kuoss");
        assert_eq!(entry.ports.len(), 2);
        assert_eq!(entry.ports[1].protocol, "TCP");
        assert_eq!(entry.endpoint_port(), Some(8080));
        assert_eq!(
            entry.annotations.get("kuoss.org/datasource-type").map(String::as_str),
            Some("lethe")
        );
    }
}
