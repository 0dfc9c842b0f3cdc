//! Alert rule files

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::datasource::{Datasource, DatasourceType};
use super::{load_yaml, ConfigError};

/// Which datasources of a type a rule file applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasourceSystem {
    /// Main and secondary datasources alike
    #[default]
    #[serde(rename = "")]
    Any,
    /// Only the main datasource
    Main,
    /// Everything except the main datasource
    Sub,
}

/// Criteria selecting a subset of the resolved datasources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceSelector {
    #[serde(default)]
    pub system: DatasourceSystem,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ds_type: Option<DatasourceType>,
}

impl DatasourceSelector {
    pub fn new(system: DatasourceSystem, ds_type: Option<DatasourceType>) -> Self {
        Self { system, ds_type }
    }

    pub fn matches(&self, datasource: &Datasource) -> bool {
        if let Some(ds_type) = self.ds_type {
            if datasource.ds_type != ds_type {
                return false;
            }
        }
        match self.system {
            DatasourceSystem::Any => true,
            DatasourceSystem::Main => datasource.is_main,
            DatasourceSystem::Sub => !datasource.is_main,
        }
    }
}

/// Single alerting rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub alert: String,
    pub expr: String,
    #[serde(
        default,
        rename = "for",
        with = "super::duration::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub for_duration: Option<Duration>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// Named group of rules evaluated together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleGroup {
    pub name: String,
    #[serde(
        default,
        with = "super::duration::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub interval: Option<Duration>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// Contents of one file under `alertrules/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub common_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub datasource_selector: DatasourceSelector,
    #[serde(default, rename = "groups")]
    pub rule_groups: Vec<RuleGroup>,
}

/// Load every `*.yml`/`*.yaml` file in `dir`, ordered by file name.
/// A missing directory yields no rule files.
pub fn load_rule_files(dir: &Path) -> Result<Vec<RuleFile>, ConfigError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(dir = %dir.display(), "Rule directory not found, no rules loaded");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| ConfigError::Read {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == "yml" || ext == "yaml")
            .unwrap_or(false);
        if is_yaml && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut rule_files = Vec::with_capacity(paths.len());
    for path in paths {
        tracing::debug!(file = %path.display(), "Loading rule file");
        rule_files.push(load_yaml::<RuleFile>(&path)?);
    }

    tracing::info!(count = rule_files.len(), dir = %dir.display(), "Rule files loaded");
    Ok(rule_files)
}
