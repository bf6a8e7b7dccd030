use serde::{Deserialize, Serialize};

use crate::crd::cluster::SYSTEM_PROJECT_LABEL_KEY;

/// Group interval given to migrated groups and rules. Legacy alerts have no
/// equivalent field.
pub const DEFAULT_GROUP_INTERVAL_SECONDS: i64 = 180;

pub const DEFAULT_APP_NAME: &str = "cluster-alerting";

/// Namespace the legacy alert manager was deployed into.
pub const DEFAULT_LEGACY_NAMESPACE: &str = "cattle-alerting";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cluster whose alerting is upgraded; also the namespace its cluster
    /// alerts and projects live in
    pub cluster_name: String,
    pub upgrade: UpgradeConfig,
    /// Static value for the system monitoring catalog id setting, bypassing
    /// the cluster's settings objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id_override: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeConfig {
    pub app_name: String,
    pub legacy_namespace: String,
    pub group_interval_seconds: i64,
    /// `key=value` selector for the system project
    pub system_project_label: String,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            legacy_namespace: DEFAULT_LEGACY_NAMESPACE.to_string(),
            group_interval_seconds: DEFAULT_GROUP_INTERVAL_SECONDS,
            system_project_label: format!("{}=true", SYSTEM_PROJECT_LABEL_KEY),
        }
    }
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();

        let defaults = UpgradeConfig::default();
        let config = Config {
            cluster_name: std::env::var("CLUSTER_NAME").unwrap_or_else(|_| "local".to_string()),
            upgrade: UpgradeConfig {
                app_name: std::env::var("ALERTING_APP_NAME").unwrap_or(defaults.app_name),
                legacy_namespace: std::env::var("LEGACY_ALERTING_NAMESPACE")
                    .unwrap_or(defaults.legacy_namespace),
                group_interval_seconds: match std::env::var("ALERT_GROUP_INTERVAL_SECONDS") {
                    Ok(s) => s.parse().map_err(|_| {
                        crate::Error::Config(format!(
                            "ALERT_GROUP_INTERVAL_SECONDS must be an integer, got '{}'",
                            s
                        ))
                    })?,
                    Err(_) => defaults.group_interval_seconds,
                },
                system_project_label: std::env::var("SYSTEM_PROJECT_LABEL")
                    .unwrap_or(defaults.system_project_label),
            },
            catalog_id_override: std::env::var("SYSTEM_MONITORING_CATALOG_ID")
                .ok()
                .filter(|s| !s.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.cluster_name.is_empty() {
            return Err(crate::Error::Config("CLUSTER_NAME must not be empty".to_string()));
        }
        if self.upgrade.app_name.is_empty() {
            return Err(crate::Error::Config(
                "ALERTING_APP_NAME must not be empty".to_string(),
            ));
        }
        if self.upgrade.legacy_namespace.is_empty() {
            return Err(crate::Error::Config(
                "LEGACY_ALERTING_NAMESPACE must not be empty".to_string(),
            ));
        }
        if self.upgrade.group_interval_seconds <= 0 {
            return Err(crate::Error::Config(
                "ALERT_GROUP_INTERVAL_SECONDS must be positive".to_string(),
            ));
        }
        match self.upgrade.system_project_label.split_once('=') {
            Some((key, _)) if !key.is_empty() => Ok(()),
            _ => Err(crate::Error::Config(format!(
                "SYSTEM_PROJECT_LABEL must look like key=value, got '{}'",
                self.upgrade.system_project_label
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cluster_name: "local".to_string(),
            upgrade: UpgradeConfig::default(),
            catalog_id_override: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.upgrade.group_interval_seconds, 180);
        assert_eq!(
            config.upgrade.system_project_label,
            "authz.management.cattle.io/system-project=true"
        );
    }

    #[test]
    fn test_empty_cluster_name_is_rejected() {
        let config = Config {
            cluster_name: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_label_is_rejected() {
        let mut config = Config::default();
        config.upgrade.system_project_label = "system-project".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SYSTEM_PROJECT_LABEL"));
    }

    #[test]
    fn test_non_positive_group_interval_is_rejected() {
        let mut config = Config::default();
        config.upgrade.group_interval_seconds = 0;
        assert!(config.validate().is_err());
    }
}
