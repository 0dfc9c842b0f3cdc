//! Configuration files
//!
//! Everything under `etc/` is YAML with camelCase keys:
//! - `datasources.yml`: static datasources and discovery settings
//! - `alerting.yml`: alert receiver endpoints (see [`crate::alerts::AlertingFile`])
//! - `alertrules/*.yml`: rule files

pub mod datasource;
pub mod duration;
pub mod rules;

pub use datasource::{
    BasicAuth, Datasource, DatasourceType, DatasourcesConfig, DiscoveryConfig, FailurePolicy,
};
pub use rules::{load_rule_files, DatasourceSelector, DatasourceSystem, Rule, RuleFile, RuleGroup};

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Read and deserialize a YAML file
pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_slice(&bytes).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_yaml_missing_file() {
        let err = load_yaml::<DatasourcesConfig>(Path::new("/nonexistent/datasources.yml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_yaml_parse_error_names_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "datasources: [not: [valid").unwrap();

        let err = load_yaml::<DatasourcesConfig>(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }
}
