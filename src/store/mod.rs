//! Resolved datasource set
//!
//! The store is built once at startup from `datasources.yml` plus an optional
//! registry discovery pass, then shared read-only (`Arc<DatasourceStore>`).

pub mod datasource;

pub use datasource::{DatasourceStore, StoreError};
