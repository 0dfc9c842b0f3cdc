//! Alerting: rule assembly and delivery
//!
//! Builds the alerting plan from rule files and the datasource store, and
//! sends alerts to the configured receiver.

pub mod config;
pub mod notifier;
pub mod plan;

pub use config::{AlertingEndpoint, AlertingFile, DEFAULT_ALERTING_FILE};
pub use notifier::{AlertDispatcher, DispatchError, Fire};
pub use plan::{Alert, AlertFile, AlertGroup, AlertingPlan, RuleAlert};
