mod kubernetes;
mod memory;

pub use kubernetes::KubeStore;
pub use memory::{MemoryBackend, MemoryStore};

use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;

#[cfg(test)]
use mockall::automock;

use crate::crd::{
    App, Catalog, CatalogTemplate, Cluster, ClusterAlert, ClusterAlertGroup, ClusterAlertRule,
    Project, ProjectAlert, ProjectAlertGroup, ProjectAlertRule,
};

/// Typed access to one kind of record.
///
/// An empty `namespace` means all namespaces for `list`, and the cluster scope
/// for cluster-scoped kinds. `create` and `update` take the namespace from
/// the object itself.
///
/// Implementations report a missing record as [`crate::Error::NotFound`], a
/// name clash on create as [`crate::Error::AlreadyExists`] and a stale
/// resource version on update or patch as [`crate::Error::Conflict`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResourceStore<K: Clone + Send + Sync + 'static>: Send + Sync {
    async fn list(&self, namespace: &str, label_selector: &str) -> crate::Result<Vec<K>>;
    async fn get(&self, namespace: &str, name: &str) -> crate::Result<K>;
    async fn create(&self, obj: &K) -> crate::Result<K>;
    async fn update(&self, obj: &K) -> crate::Result<K>;
    /// Apply a JSON merge patch. A `metadata.resourceVersion` in the patch
    /// makes it conditional on the record being unchanged.
    async fn patch(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> crate::Result<K>;
    async fn delete(&self, namespace: &str, name: &str) -> crate::Result<()>;
}

/// Every store the upgrade touches.
#[derive(Clone)]
pub struct Stores {
    pub cluster_alerts: Arc<dyn ResourceStore<ClusterAlert>>,
    pub project_alerts: Arc<dyn ResourceStore<ProjectAlert>>,
    pub cluster_alert_groups: Arc<dyn ResourceStore<ClusterAlertGroup>>,
    pub cluster_alert_rules: Arc<dyn ResourceStore<ClusterAlertRule>>,
    pub project_alert_groups: Arc<dyn ResourceStore<ProjectAlertGroup>>,
    pub project_alert_rules: Arc<dyn ResourceStore<ProjectAlertRule>>,
    pub namespaces: Arc<dyn ResourceStore<Namespace>>,
    pub clusters: Arc<dyn ResourceStore<Cluster>>,
    pub catalogs: Arc<dyn ResourceStore<Catalog>>,
    pub catalog_templates: Arc<dyn ResourceStore<CatalogTemplate>>,
    pub projects: Arc<dyn ResourceStore<Project>>,
    pub apps: Arc<dyn ResourceStore<App>>,
}

impl Stores {
    pub fn kube(client: kube::Client) -> Self {
        Self {
            cluster_alerts: Arc::new(KubeStore::namespaced(client.clone())),
            project_alerts: Arc::new(KubeStore::namespaced(client.clone())),
            cluster_alert_groups: Arc::new(KubeStore::namespaced(client.clone())),
            cluster_alert_rules: Arc::new(KubeStore::namespaced(client.clone())),
            project_alert_groups: Arc::new(KubeStore::namespaced(client.clone())),
            project_alert_rules: Arc::new(KubeStore::namespaced(client.clone())),
            namespaces: Arc::new(KubeStore::cluster(client.clone())),
            clusters: Arc::new(KubeStore::cluster(client.clone())),
            catalogs: Arc::new(KubeStore::cluster(client.clone())),
            catalog_templates: Arc::new(KubeStore::namespaced(client.clone())),
            projects: Arc::new(KubeStore::namespaced(client.clone())),
            apps: Arc::new(KubeStore::namespaced(client)),
        }
    }
}
