use std::collections::BTreeMap;

use kube::{Resource, ResourceExt};
use tracing::{debug, info};

use super::translate::{translate_cluster_alert, translate_project_alert, ClusterMigration, ProjectMigration};
use crate::crd::cluster::split_project_id;
use crate::crd::{ClusterAlertRule, ProjectAlert, ProjectAlertRule};
use crate::metrics;
use crate::store::{ResourceStore, Stores};
use crate::{Error, Result};

/// A record the migration writes over an existing copy of itself.
trait Migrated: Resource<DynamicType = ()> + Clone + Send + Sync + 'static {
    /// Take the desired spec while keeping this record's metadata.
    fn adopt(&mut self, desired: &Self);
}

impl Migrated for ClusterAlertRule {
    fn adopt(&mut self, desired: &Self) {
        self.spec = desired.spec.clone();
    }
}

impl Migrated for ProjectAlertRule {
    fn adopt(&mut self, desired: &Self) {
        self.spec = desired.spec.clone();
    }
}

fn migration_error(legacy: &str, step: &str, e: Error) -> Error {
    Error::Migration(format!("migrate {} failed, {} failed, {}", legacy, step, e))
}

fn legacy_id<K: Resource>(obj: &K) -> String {
    format!("{}:{}", obj.namespace().unwrap_or_default(), obj.name_any())
}

/// Create the rule, or replace the spec of the one already there. Returns
/// whether this call wrote the rule; losing a create race to another writer
/// does not count.
async fn upsert_rule<K: Migrated>(
    store: &dyn ResourceStore<K>,
    desired: &K,
    legacy: &str,
) -> Result<bool> {
    let namespace = desired.namespace().unwrap_or_default();
    let name = desired.name_any();

    match store.get(&namespace, &name).await {
        Ok(mut existing) => {
            existing.adopt(desired);
            store
                .update(&existing)
                .await
                .map_err(|e| migration_error(legacy, "update alert rule", e))?;
            debug!("Updated alert rule {}:{}", namespace, name);
            Ok(true)
        }
        Err(e) if e.is_not_found() => match store.create(desired).await {
            Ok(_) => {
                debug!("Created alert rule {}:{}", namespace, name);
                Ok(true)
            }
            Err(e) if e.is_already_exists() => {
                debug!("Alert rule {}:{} created concurrently", namespace, name);
                Ok(false)
            }
            Err(e) => Err(migration_error(legacy, "create alert rule", e)),
        },
        Err(e) => Err(migration_error(legacy, "get alert rule", e)),
    }
}

/// Existing groups are left untouched. Returns whether a group was created.
async fn create_group<K>(store: &dyn ResourceStore<K>, group: &K, legacy: &str) -> Result<bool>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    match store.create(group).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_already_exists() => Ok(false),
        Err(e) => Err(migration_error(
            legacy,
            &format!(
                "create alert group {}:{}",
                group.namespace().unwrap_or_default(),
                group.name_any()
            ),
            e,
        )),
    }
}

/// Moves legacy alerts of one cluster into groups and rules.
pub struct AlertMigrator {
    cluster_name: String,
    group_interval_seconds: i64,
    stores: Stores,
}

impl AlertMigrator {
    pub fn new(cluster_name: &str, group_interval_seconds: i64, stores: Stores) -> Self {
        Self {
            cluster_name: cluster_name.to_string(),
            group_interval_seconds,
            stores,
        }
    }

    /// Returns the number of legacy alerts migrated.
    pub async fn migrate_cluster_alerts(&self) -> Result<usize> {
        let alerts = self
            .stores
            .cluster_alerts
            .list(&self.cluster_name, "")
            .await
            .map_err(|e| Error::Migration(format!("get old cluster alert failed, {}", e)))?;

        for alert in &alerts {
            let legacy = legacy_id(alert);
            let ClusterMigration { rule, group } =
                translate_cluster_alert(alert, &self.cluster_name, self.group_interval_seconds);

            if upsert_rule(self.stores.cluster_alert_rules.as_ref(), &rule, &legacy).await? {
                metrics::record_rule_migrated("cluster");
            }

            if create_group(self.stores.cluster_alert_groups.as_ref(), &group, &legacy).await? {
                metrics::record_group_created("cluster");
            }
            debug!("Migrated cluster alert {}", legacy);
        }

        info!(
            "Migrated {} cluster alerts in cluster {}",
            alerts.len(),
            self.cluster_name
        );
        Ok(alerts.len())
    }

    /// Project alerts are listed across all namespaces and only those owned by
    /// a project of this cluster are migrated.
    pub async fn migrate_project_alerts(&self) -> Result<usize> {
        let alerts = self
            .stores
            .project_alerts
            .list("", "")
            .await
            .map_err(|e| Error::Migration(format!("get old project alert failed, {}", e)))?;

        let mut by_project: BTreeMap<String, Vec<ProjectAlert>> = BTreeMap::new();
        for alert in alerts {
            let (cluster, _) = split_project_id(&alert.spec.project_name);
            if cluster == self.cluster_name {
                by_project
                    .entry(alert.spec.project_name.clone())
                    .or_default()
                    .push(alert);
            }
        }

        let mut migrated = 0;
        for (project_id, alerts) in &by_project {
            for alert in alerts {
                let legacy = legacy_id(alert);
                let ProjectMigration { rule, group } =
                    translate_project_alert(alert, project_id, self.group_interval_seconds);

                if upsert_rule(self.stores.project_alert_rules.as_ref(), &rule, &legacy).await? {
                    metrics::record_rule_migrated("project");
                }

                if create_group(self.stores.project_alert_groups.as_ref(), &group, &legacy).await? {
                    metrics::record_group_created("project");
                }
                debug!("Migrated project alert {} of project {}", legacy, project_id);
                migrated += 1;
            }
        }

        info!(
            "Migrated {} project alerts across {} projects in cluster {}",
            migrated,
            by_project.len(),
            self.cluster_name
        );
        Ok(migrated)
    }
}
