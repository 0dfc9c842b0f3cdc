//! Alerting plan assembly
//!
//! Cross-joins rule definitions with the datasources their files select.
//! Alerts borrow their datasource from the store, so a plan cannot outlive
//! the [`DatasourceStore`] it was built from.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use super::config::AlertingFile;
use crate::config::{Datasource, DatasourceSelector, Rule, RuleFile};
use crate::store::DatasourceStore;

/// One rule evaluated against one datasource
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert<'s> {
    pub datasource: &'s Datasource,
}

/// A rule and its per-datasource alert instances
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAlert<'s> {
    pub rule: Rule,
    pub alerts: Vec<Alert<'s>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertGroup<'s> {
    pub name: String,
    #[serde(with = "crate::config::duration::option")]
    pub interval: Option<Duration>,
    pub rule_alerts: Vec<RuleAlert<'s>>,
}

/// Assembled counterpart of a [`RuleFile`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFile<'s> {
    pub common_labels: BTreeMap<String, String>,
    pub datasource_selector: DatasourceSelector,
    pub alert_groups: Vec<AlertGroup<'s>>,
}

/// Receivers plus every alert instance to evaluate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertingPlan<'s> {
    pub alerting_file: AlertingFile,
    pub alert_files: Vec<AlertFile<'s>>,
}

impl<'s> AlertingPlan<'s> {
    /// Load the alerting file (failures are logged, never fatal) and build
    /// the plan
    pub fn assemble(
        alerting_path: Option<&Path>,
        rule_files: &[RuleFile],
        store: &'s DatasourceStore,
    ) -> Self {
        let alerting_file = AlertingFile::load_or_default(alerting_path);
        Self::build(alerting_file, rule_files, store)
    }

    /// Build the plan from an already loaded alerting file.
    ///
    /// Source order of groups and rules is preserved; each rule gets one
    /// alert per selected datasource, in store order.
    pub fn build(
        alerting_file: AlertingFile,
        rule_files: &[RuleFile],
        store: &'s DatasourceStore,
    ) -> Self {
        let alert_files: Vec<AlertFile<'s>> = rule_files
            .iter()
            .map(|rule_file| {
                let datasources = store.datasources_with_selector(&rule_file.datasource_selector);
                if datasources.is_empty() {
                    tracing::warn!(
                        selector = ?rule_file.datasource_selector,
                        "No datasources match rule file selector"
                    );
                }

                let alert_groups = rule_file
                    .rule_groups
                    .iter()
                    .map(|group| AlertGroup {
                        name: group.name.clone(),
                        interval: group.interval,
                        rule_alerts: group
                            .rules
                            .iter()
                            .map(|rule| RuleAlert {
                                rule: rule.clone(),
                                alerts: datasources
                                    .iter()
                                    .map(|&datasource| Alert { datasource })
                                    .collect(),
                            })
                            .collect(),
                    })
                    .collect();

                AlertFile {
                    common_labels: rule_file.common_labels.clone(),
                    datasource_selector: rule_file.datasource_selector.clone(),
                    alert_groups,
                }
            })
            .collect();

        let plan = Self {
            alerting_file,
            alert_files,
        };
        tracing::info!(
            rule_files = plan.alert_files.len(),
            alerts = plan.alert_count(),
            "Alerting plan assembled"
        );
        plan
    }

    /// Active receiver URL, if one is configured
    pub fn alertmanager_url(&self) -> Option<&str> {
        self.alerting_file.alertmanager_url()
    }

    /// Total number of alert instances
    pub fn alert_count(&self) -> usize {
        self.alert_files
            .iter()
            .flat_map(|f| &f.alert_groups)
            .flat_map(|g| &g.rule_alerts)
            .map(|r| r.alerts.len())
            .sum()
    }
}
