use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use crate::config::{
    Datasource, DatasourceSelector, DatasourceType, DatasourcesConfig, FailurePolicy,
};
use crate::discovery::{RegistryError, ServiceEntry, ServiceRegistry};

/// Immutable snapshot of configured and discovered datasources
#[derive(Debug, Clone)]
pub struct DatasourceStore {
    config: DatasourcesConfig,
    /// Static entries in config order, then discovered entries by name
    datasources: Vec<Datasource>,
}

impl DatasourceStore {
    /// Validate the static configuration. Does not contact any registry.
    pub fn new(config: DatasourcesConfig) -> Result<Self, StoreError> {
        let mut datasources = config.datasources.clone();

        let mut names = HashSet::new();
        for ds in &mut datasources {
            if ds.name.trim().is_empty() {
                return Err(StoreError::Invalid(format!(
                    "datasource with url '{}' has no name",
                    ds.url
                )));
            }
            if ds.url.trim().is_empty() {
                return Err(StoreError::Invalid(format!(
                    "datasource '{}' has no url",
                    ds.name
                )));
            }
            if !names.insert(ds.name.clone()) {
                return Err(StoreError::DuplicateName(ds.name.clone()));
            }
            ds.is_discovered = false;
        }

        for ds_type in DatasourceType::ALL {
            let mains: Vec<&str> = datasources
                .iter()
                .filter(|ds| ds.ds_type == ds_type && ds.is_main)
                .map(|ds| ds.name.as_str())
                .collect();
            if mains.len() > 1 {
                return Err(StoreError::MultipleMain {
                    ds_type,
                    names: mains.join(", "),
                });
            }
            if mains.is_empty() && datasources.iter().any(|ds| ds.ds_type == ds_type) {
                tracing::warn!(ds_type = %ds_type, "No main datasource configured for type");
            }
        }

        tracing::debug!(count = datasources.len(), "Static datasources loaded");

        Ok(Self {
            config,
            datasources,
        })
    }

    /// Startup path: validate, then run discovery when enabled.
    ///
    /// A discovery failure (including a missing registry) is handled by
    /// `discovery.on_failure`: `Degrade` keeps the static-only store,
    /// `Abort` returns the error.
    pub async fn load(
        config: DatasourcesConfig,
        registry: Option<&dyn ServiceRegistry>,
    ) -> Result<Self, StoreError> {
        let enabled = config.discovery.enabled;
        let policy = config.discovery.on_failure;
        let store = Self::new(config)?;

        if !enabled {
            tracing::info!(count = store.datasources.len(), "Datasource discovery disabled");
            return Ok(store);
        }

        let result = match registry {
            Some(registry) => store.discover_datasources(registry).await,
            None => Err(StoreError::Discovery(RegistryError::Unavailable(
                "no service registry configured".to_string(),
            ))),
        };

        match result {
            Ok(discovered) => {
                tracing::info!(discovered = discovered.len(), "Datasource discovery finished");
                Ok(store.with_discovered(discovered))
            }
            Err(e) => match policy {
                FailurePolicy::Degrade => {
                    tracing::warn!(
                        error = %e,
                        "Datasource discovery failed, continuing with static datasources"
                    );
                    Ok(store)
                }
                FailurePolicy::Abort => {
                    tracing::error!(error = %e, "Datasource discovery failed");
                    Err(e)
                }
            },
        }
    }

    /// List the registry once and turn matching services into datasources.
    ///
    /// Returns only the discovered entries, sorted by name. Entries whose name
    /// collides with a static datasource are dropped. The store itself is
    /// left untouched; see [`DatasourceStore::with_discovered`].
    pub async fn discover_datasources(
        &self,
        registry: &dyn ServiceRegistry,
    ) -> Result<Vec<Datasource>, StoreError> {
        let timeout = self.config.discovery.timeout;
        let mut services = tokio::time::timeout(timeout, registry.list_all())
            .await
            .map_err(|_| RegistryError::Timeout(timeout))??;

        // listing order is registry-defined
        services.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));

        let static_names: HashSet<&str> = self
            .datasources
            .iter()
            .filter(|ds| !ds.is_discovered)
            .map(|ds| ds.name.as_str())
            .collect();

        let mut discovered: BTreeMap<String, Datasource> = BTreeMap::new();
        for service in &services {
            let Some(ds_type) = self.match_type(service) else {
                continue;
            };
            let Some(port) = service.endpoint_port() else {
                tracing::warn!(
                    service = %service.name,
                    namespace = %service.namespace,
                    "Matched service has no ports, skipping"
                );
                continue;
            };

            let name = format!("{}.{}", ds_type.short_name(), service.namespace);
            if static_names.contains(name.as_str()) {
                tracing::debug!(datasource = %name, "Static datasource takes precedence");
                continue;
            }
            if discovered.contains_key(&name) {
                tracing::debug!(
                    datasource = %name,
                    service = %service.name,
                    "Duplicate discovered datasource, keeping first"
                );
                continue;
            }

            let url = format!("http://{}.{}:{}", service.name, service.namespace, port);
            tracing::debug!(datasource = %name, url = %url, "Discovered datasource");
            discovered.insert(
                name.clone(),
                Datasource {
                    ds_type,
                    name,
                    url,
                    basic_auth: None,
                    is_main: false,
                    is_discovered: true,
                },
            );
        }

        Ok(discovered.into_values().collect())
    }

    /// New snapshot with `discovered` replacing any previously discovered
    /// entries. Static entries still win on name collisions.
    pub fn with_discovered(mut self, discovered: Vec<Datasource>) -> Self {
        self.datasources.retain(|ds| !ds.is_discovered);

        let mut names: HashSet<String> = self.datasources.iter().map(|ds| ds.name.clone()).collect();
        let mut discovered: Vec<Datasource> = discovered
            .into_iter()
            .filter(|ds| names.insert(ds.name.clone()))
            .map(|ds| Datasource {
                is_main: false,
                is_discovered: true,
                ..ds
            })
            .collect();
        discovered.sort_by(|a, b| a.name.cmp(&b.name));

        self.datasources.extend(discovered);
        self
    }

    fn match_type(&self, service: &ServiceEntry) -> Option<DatasourceType> {
        let discovery = &self.config.discovery;

        if let Some(key) = discovery.annotation_key() {
            let value = service.annotations.get(key)?;
            return match value.parse::<DatasourceType>() {
                Ok(ds_type) => Some(ds_type),
                Err(e) => {
                    tracing::debug!(
                        service = %service.name,
                        namespace = %service.namespace,
                        "Ignoring annotation: {}",
                        e
                    );
                    None
                }
            };
        }

        DatasourceType::ALL
            .into_iter()
            .find(|t| discovery.by_name(*t) && service.name == t.short_name())
    }

    /// All datasources, static first
    pub fn datasources(&self) -> &[Datasource] {
        &self.datasources
    }

    pub fn datasource_by_name(&self, name: &str) -> Option<&Datasource> {
        self.datasources.iter().find(|ds| ds.name == name)
    }

    pub fn datasources_with_type(&self, ds_type: DatasourceType) -> Vec<&Datasource> {
        self.datasources
            .iter()
            .filter(|ds| ds.ds_type == ds_type)
            .collect()
    }

    pub fn datasources_with_selector(&self, selector: &DatasourceSelector) -> Vec<&Datasource> {
        self.datasources
            .iter()
            .filter(|ds| selector.matches(ds))
            .collect()
    }

    pub fn main_datasource(&self, ds_type: DatasourceType) -> Option<&Datasource> {
        self.datasources
            .iter()
            .find(|ds| ds.ds_type == ds_type && ds.is_main)
    }

    pub fn query_timeout(&self) -> Duration {
        self.config.query_timeout
    }

    pub fn config(&self) -> &DatasourcesConfig {
        &self.config
    }
}

/// Datasource store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid datasource: {0}")]
    Invalid(String),

    #[error("Duplicate datasource name: {0}")]
    DuplicateName(String),

    #[error("Multiple main datasources for type {ds_type}: {names}")]
    MultipleMain {
        ds_type: DatasourceType,
        names: String,
    },

    #[error("Datasource discovery failed: {0}")]
    Discovery(#[from] RegistryError),
}
