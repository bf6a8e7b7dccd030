use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use kube::{Resource, ResourceExt};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::{ResourceStore, Stores};
use crate::crd::{
    App, Catalog, CatalogTemplate, Cluster, ClusterAlert, ClusterAlertGroup, ClusterAlertRule,
    Project, ProjectAlert, ProjectAlertGroup, ProjectAlertRule,
};
use crate::{Error, Result};

/// [`ResourceStore`] held in process memory.
///
/// Mirrors the API server semantics the upgrade relies on: names are unique
/// per namespace, every write bumps the resource version, and an update
/// carrying a stale resource version is rejected.
pub struct MemoryStore<K> {
    objects: Mutex<BTreeMap<(String, String), K>>,
    revision: AtomicU64,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

impl<K> Default for MemoryStore<K> {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            revision: AtomicU64::new(0),
            creates: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
        }
    }
}

impl<K> MemoryStore<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn key(obj: &K) -> (String, String) {
        (obj.namespace().unwrap_or_default(), obj.name_any())
    }

    fn describe(namespace: &str, name: &str) -> String {
        if namespace.is_empty() {
            format!("{} {}", K::kind(&()), name)
        } else {
            format!("{} {}:{}", K::kind(&()), namespace, name)
        }
    }

    fn next_revision(&self) -> String {
        (self.revision.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    /// Store an object as-is, replacing any previous one. Does not count as a
    /// write.
    pub async fn insert(&self, mut obj: K) -> K {
        obj.meta_mut().resource_version = Some(self.next_revision());
        self.objects.lock().await.insert(Self::key(&obj), obj.clone());
        obj
    }

    pub async fn find(&self, namespace: &str, name: &str) -> Option<K> {
        self.objects
            .lock()
            .await
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub async fn all(&self) -> Vec<K> {
        self.objects.lock().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    /// Successful creates so far.
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Successful updates and patches so far.
    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

/// Equality-based selectors only: `key=value` or bare `key`, comma separated.
fn matches_selector(labels: &BTreeMap<String, String>, selector: &str) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((key, value)) => labels.get(key.trim()).map(String::as_str) == Some(value.trim()),
            None => labels.contains_key(term),
        })
}

/// RFC 7386 merge: objects merge key by key, `null` removes a key, anything
/// else replaces the target.
fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(entries) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        for (key, value) in entries {
            if value.is_null() {
                map.remove(key);
            } else {
                merge_patch(map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

#[async_trait]
impl<K> ResourceStore<K> for MemoryStore<K>
where
    K: Resource<DynamicType = ()> + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn list(&self, namespace: &str, label_selector: &str) -> Result<Vec<K>> {
        let objects = self.objects.lock().await;
        Ok(objects
            .iter()
            .filter(|((ns, _), _)| namespace.is_empty() || ns == namespace)
            .filter(|(_, obj)| matches_selector(obj.labels(), label_selector))
            .map(|(_, obj)| obj.clone())
            .collect())
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<K> {
        self.find(namespace, name)
            .await
            .ok_or_else(|| Error::NotFound(Self::describe(namespace, name)))
    }

    async fn create(&self, obj: &K) -> Result<K> {
        let (namespace, name) = Self::key(obj);
        if name.is_empty() {
            return Err(Error::Kubernetes(format!(
                "create {}: metadata.name is required",
                K::kind(&())
            )));
        }

        let mut objects = self.objects.lock().await;
        if objects.contains_key(&(namespace.clone(), name.clone())) {
            return Err(Error::AlreadyExists(Self::describe(&namespace, &name)));
        }

        let mut created = obj.clone();
        created.meta_mut().resource_version = Some(self.next_revision());
        objects.insert((namespace, name), created.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(created)
    }

    async fn update(&self, obj: &K) -> Result<K> {
        let key = Self::key(obj);
        let mut objects = self.objects.lock().await;
        let current = objects
            .get(&key)
            .ok_or_else(|| Error::NotFound(Self::describe(&key.0, &key.1)))?;

        if let Some(version) = obj.resource_version() {
            if current.resource_version().as_deref() != Some(version.as_str()) {
                return Err(Error::Conflict(format!(
                    "{}: the object has been modified",
                    Self::describe(&key.0, &key.1)
                )));
            }
        }

        let mut updated = obj.clone();
        updated.meta_mut().resource_version = Some(self.next_revision());
        objects.insert(key, updated.clone());
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(updated)
    }

    async fn patch(&self, namespace: &str, name: &str, patch: &Value) -> Result<K> {
        let key = (namespace.to_string(), name.to_string());
        let mut objects = self.objects.lock().await;
        let current = objects
            .get(&key)
            .ok_or_else(|| Error::NotFound(Self::describe(namespace, name)))?;

        if let Some(version) = patch.pointer("/metadata/resourceVersion").and_then(Value::as_str) {
            if current.resource_version().as_deref() != Some(version) {
                return Err(Error::Conflict(format!(
                    "{}: the object has been modified",
                    Self::describe(namespace, name)
                )));
            }
        }

        let mut merged = serde_json::to_value(current)?;
        merge_patch(&mut merged, patch);
        let mut patched: K = serde_json::from_value(merged)?;
        patched.meta_mut().resource_version = Some(self.next_revision());
        objects.insert(key, patched.clone());
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(patched)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.objects
            .lock()
            .await
            .remove(&(namespace.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(Self::describe(namespace, name)))
    }
}

/// One [`MemoryStore`] per kind, kept typed so callers can seed and inspect
/// them, and handed to the upgrader through [`MemoryBackend::stores`].
#[derive(Clone, Default)]
pub struct MemoryBackend {
    pub cluster_alerts: Arc<MemoryStore<ClusterAlert>>,
    pub project_alerts: Arc<MemoryStore<ProjectAlert>>,
    pub cluster_alert_groups: Arc<MemoryStore<ClusterAlertGroup>>,
    pub cluster_alert_rules: Arc<MemoryStore<ClusterAlertRule>>,
    pub project_alert_groups: Arc<MemoryStore<ProjectAlertGroup>>,
    pub project_alert_rules: Arc<MemoryStore<ProjectAlertRule>>,
    pub namespaces: Arc<MemoryStore<Namespace>>,
    pub clusters: Arc<MemoryStore<Cluster>>,
    pub catalogs: Arc<MemoryStore<Catalog>>,
    pub catalog_templates: Arc<MemoryStore<CatalogTemplate>>,
    pub projects: Arc<MemoryStore<Project>>,
    pub apps: Arc<MemoryStore<App>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stores(&self) -> Stores {
        Stores {
            cluster_alerts: self.cluster_alerts.clone(),
            project_alerts: self.project_alerts.clone(),
            cluster_alert_groups: self.cluster_alert_groups.clone(),
            cluster_alert_rules: self.cluster_alert_rules.clone(),
            project_alert_groups: self.project_alert_groups.clone(),
            project_alert_rules: self.project_alert_rules.clone(),
            namespaces: self.namespaces.clone(),
            clusters: self.clusters.clone(),
            catalogs: self.catalogs.clone(),
            catalog_templates: self.catalog_templates.clone(),
            projects: self.projects.clone(),
            apps: self.apps.clone(),
        }
    }
}
