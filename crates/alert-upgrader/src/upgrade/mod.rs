//! Upgrade of a cluster's alerting service.
//!
//! An upgrade run resolves the chart version the alerting app should move
//! to, migrates legacy alerts when coming from a release that predates the
//! monitoring chart, and finally points the deployed app at the new chart
//! once the cluster and the system catalog can take it.

pub mod cleanup;
pub mod migrate;
pub mod readiness;
pub mod translate;

use std::sync::Arc;

use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::config::{Config, UpgradeConfig};
use crate::crd::{App, Project};
use crate::external_id::{catalog_external_id, parse_external_id, split_external_id};
use crate::metrics::{self, UpgradeOutcome};
use crate::settings::{Settings, SYSTEM_MONITORING_CATALOG_ID};
use crate::store::Stores;
use crate::{Error, Result};

pub use cleanup::remove_legacy_alerting;
pub use migrate::AlertMigrator;
pub use readiness::{Readiness, ReadinessGate};

/// Versions containing this were deployed from the monitoring chart and
/// have nothing left to migrate.
pub const MIGRATED_VERSION_MARKER: &str = "system-library-rancher-monitoring";

/// Answer switching off the chart's bundled operator.
pub const OPERATOR_ENABLED_ANSWER: &str = "operator.enabled";

pub const SERVICE_NAME: &str = "alerting";

/// A cluster service that can report and upgrade its deployed version.
#[async_trait]
pub trait ServiceUpgrader: Send + Sync {
    fn name(&self) -> &str;

    /// Version the service should be at, as a template version id.
    async fn version(&self) -> Result<String>;

    /// Bring the service up from `previous_version` and return the version
    /// now deployed. Safe to call again after any failure.
    async fn upgrade(&self, previous_version: &str) -> Result<String>;
}

/// The chart version an upgrade moves the alerting app to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetVersion {
    pub external_id: String,
    /// Template version id, `<catalog>-<template>-<version>`
    pub version: String,
    pub catalog: String,
}

/// Merge patch moving the app to `external_id`, or `None` when the app is
/// already there. Only the external id and the operator answer are compared
/// and written; the patch is conditional on the app's resource version.
pub fn app_upgrade_patch(app: &App, external_id: &str) -> Option<Value> {
    let operator_enabled = app
        .spec
        .answers
        .get(OPERATOR_ENABLED_ANSWER)
        .map(String::as_str);
    if app.spec.external_id == external_id && operator_enabled == Some("false") {
        return None;
    }

    let mut answers = Map::new();
    answers.insert(OPERATOR_ENABLED_ANSWER.to_string(), Value::from("false"));
    let mut patch = json!({
        "spec": {
            "externalId": external_id,
            "answers": answers,
        }
    });
    if let Some(version) = app.resource_version() {
        patch["metadata"] = json!({ "resourceVersion": version });
    }
    Some(patch)
}

pub struct AlertingUpgrader {
    cluster_name: String,
    config: UpgradeConfig,
    settings: Arc<dyn Settings>,
    stores: Stores,
}

impl AlertingUpgrader {
    pub fn new(config: &Config, settings: Arc<dyn Settings>, stores: Stores) -> Self {
        Self {
            cluster_name: config.cluster_name.clone(),
            config: config.upgrade.clone(),
            settings,
            stores,
        }
    }

    pub async fn resolve_target(&self) -> Result<TargetVersion> {
        let current = self.settings.get(SYSTEM_MONITORING_CATALOG_ID).await?;
        let id = split_external_id(&current)?;

        let template_id = id.template_id();
        let template = self
            .stores
            .catalog_templates
            .get(&id.namespace, &template_id)
            .await
            .map_err(|e| {
                let message = format!("get template {} failed, {}", template_id, e);
                if e.is_not_found() {
                    Error::Lookup(message)
                } else {
                    Error::Kubernetes(message)
                }
            })?;

        let external_id =
            catalog_external_id(&id.catalog, &id.template, &template.spec.default_version);
        let (version, _) = parse_external_id(&external_id)?;
        debug!("Alerting target is {} ({})", version, external_id);

        Ok(TargetVersion {
            external_id,
            version,
            catalog: id.catalog,
        })
    }

    async fn migrate_legacy(&self) -> Result<()> {
        let migrator = AlertMigrator::new(
            &self.cluster_name,
            self.config.group_interval_seconds,
            self.stores.clone(),
        );
        migrator.migrate_cluster_alerts().await?;
        migrator.migrate_project_alerts().await?;
        remove_legacy_alerting(self.stores.namespaces.as_ref(), &self.config.legacy_namespace)
            .await?;
        Ok(())
    }

    /// First project of the cluster carrying the system project label.
    async fn system_project(&self) -> Result<Project> {
        let projects = self
            .stores
            .projects
            .list(&self.cluster_name, &self.config.system_project_label)
            .await
            .map_err(|e| Error::Kubernetes(format!("list system project failed, {}", e)))?;

        projects
            .into_iter()
            .next()
            .filter(|p| p.metadata.name.as_deref().is_some_and(|n| !n.is_empty()))
            .ok_or_else(|| {
                Error::Lookup(format!(
                    "get system project failed, no project in {} matches {}",
                    self.cluster_name, self.config.system_project_label
                ))
            })
    }

    async fn run(&self, previous_version: &str) -> Result<(String, UpgradeOutcome)> {
        let target = self.resolve_target().await?;

        if previous_version.contains(MIGRATED_VERSION_MARKER) {
            debug!(
                "Previous version {} already runs the monitoring chart, skipping migration",
                previous_version
            );
        } else {
            info!(
                "Migrating legacy alerts of cluster {} from version {:?}",
                self.cluster_name, previous_version
            );
            self.migrate_legacy().await?;
        }

        let project = self.system_project().await?;
        let project_name = project.metadata.name.unwrap_or_default();
        let app_name = &self.config.app_name;

        let app = match self.stores.apps.get(&project_name, app_name).await {
            Ok(app) => app,
            Err(e) if e.is_not_found() => {
                info!(
                    "App {}:{} is not deployed, nothing to upgrade",
                    project_name, app_name
                );
                return Ok((target.version, UpgradeOutcome::Skipped));
            }
            Err(e) => {
                return Err(Error::Kubernetes(format!(
                    "get app {}:{} failed, {}",
                    project_name, app_name, e
                )))
            }
        };

        let Some(patch) = app_upgrade_patch(&app, &target.external_id) else {
            debug!("App {}:{} is already at {}", project_name, app_name, target.version);
            return Ok((target.version, UpgradeOutcome::Unchanged));
        };

        ReadinessGate::new(self.stores.clusters.clone(), self.stores.catalogs.clone())
            .check(&self.cluster_name, &target.catalog)
            .await?
            .into_result()?;

        self.stores.apps.patch(&project_name, app_name, &patch).await.map_err(|e| {
            Error::Kubernetes(format!(
                "update app {}:{} failed, {}",
                project_name, app_name, e
            ))
        })?;
        info!(
            "Upgraded app {}:{} to {}",
            project_name, app_name, target.version
        );
        Ok((target.version, UpgradeOutcome::Upgraded))
    }
}

#[async_trait]
impl ServiceUpgrader for AlertingUpgrader {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    async fn version(&self) -> Result<String> {
        let current = self.settings.get(SYSTEM_MONITORING_CATALOG_ID).await?;
        let (version, _) = parse_external_id(&current)?;
        Ok(version)
    }

    async fn upgrade(&self, previous_version: &str) -> Result<String> {
        match self.run(previous_version).await {
            Ok((version, outcome)) => {
                metrics::record_upgrade(outcome);
                Ok(version)
            }
            Err(e @ Error::NotReady { .. }) => {
                warn!("Upgrade of {} deferred: {}", SERVICE_NAME, e);
                metrics::record_upgrade(UpgradeOutcome::NotReady);
                Err(e)
            }
            Err(e) => {
                error!("Upgrade of {} failed: {}", SERVICE_NAME, e);
                metrics::record_upgrade(UpgradeOutcome::Failed);
                Err(e)
            }
        }
    }
}
