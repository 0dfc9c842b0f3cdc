//! Ventana: monitoring backend for Prometheus and Lethe datasources
//!
//! Resolves the set of datasources the dashboard and alerting work against,
//! and assembles alert rules into an evaluation plan.
//!
//! # Features
//!
//! - **Static datasources**: from `datasources.yml`, with one main datasource per type
//! - **Discovery**: datasources derived from cluster services, by name or annotation
//! - **Deterministic naming**: discovered entries are `<type>.<namespace>`, sorted by name
//! - **Alerting plan**: rule files cross-joined with the datasources they select
//! - **Test alerts**: connectivity check against the configured Alertmanager
//!
//! # Example
//!
//! ```no_run
//! use ventana::config::{DatasourcesConfig, DiscoveryConfig};
//! use ventana::discovery::{ServiceEntry, ServicePort, StaticRegistry};
//! use ventana::store::DatasourceStore;
//! use ventana::alerts::AlertingPlan;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatasourcesConfig {
//!     discovery: DiscoveryConfig {
//!         enabled: true,
//!         by_name_prometheus: true,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! let registry = StaticRegistry::new(vec![
//!     ServiceEntry::new("prometheus", "monitoring").with_port(ServicePort::tcp("http", 9090)),
//! ]);
//!
//! let store = DatasourceStore::load(config, Some(&registry)).await?;
//! assert_eq!(store.datasources()[0].url, "http://prometheus.monitoring:9090");
//!
//! let plan = AlertingPlan::assemble(None, &[], &store);
//! println!("{} alerts", plan.alert_count());
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod api;
pub mod config;
pub mod discovery;
pub mod store;

// Re-export commonly used types
pub use alerts::{AlertDispatcher, AlertingPlan, DispatchError};
pub use config::{Datasource, DatasourceType, DatasourcesConfig};
pub use store::{DatasourceStore, StoreError};
