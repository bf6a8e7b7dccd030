use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::{
    api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams},
    Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::ResourceStore;
use crate::{Error, Result};

/// [`ResourceStore`] backed by the Kubernetes API.
pub struct KubeStore<K> {
    client: Client,
    api_for: fn(Client, &str) -> Api<K>,
}

impl<K> KubeStore<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
{
    pub fn namespaced(client: Client) -> Self {
        Self {
            client,
            api_for: |client, namespace| {
                if namespace.is_empty() {
                    Api::all(client)
                } else {
                    Api::namespaced(client, namespace)
                }
            },
        }
    }
}

impl<K> KubeStore<K>
where
    K: Resource<Scope = ClusterResourceScope, DynamicType = ()>,
{
    pub fn cluster(client: Client) -> Self {
        Self {
            client,
            api_for: |client, _| Api::all(client),
        }
    }
}

impl<K> KubeStore<K>
where
    K: Resource<DynamicType = ()>,
{
    fn api(&self, namespace: &str) -> Api<K> {
        (self.api_for)(self.client.clone(), namespace)
    }
}

fn describe<K: Resource<DynamicType = ()>>(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        format!("{} {}", K::kind(&()), name)
    } else {
        format!("{} {}:{}", K::kind(&()), namespace, name)
    }
}

/// Sort API failures into the conditions callers recover from.
fn from_kube_error(err: kube::Error, what: String) -> Error {
    match &err {
        kube::Error::Api(resp) if resp.code == 404 => Error::NotFound(what),
        kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists" => {
            Error::AlreadyExists(what)
        }
        kube::Error::Api(resp) if resp.code == 409 => {
            Error::Conflict(format!("{}: {}", what, resp.message))
        }
        _ => Error::Kubernetes(format!("{}: {}", what, err)),
    }
}

#[async_trait]
impl<K> ResourceStore<K> for KubeStore<K>
where
    K: Resource<DynamicType = ()>
        + Clone
        + Debug
        + DeserializeOwned
        + Serialize
        + Send
        + Sync
        + 'static,
{
    async fn list(&self, namespace: &str, label_selector: &str) -> Result<Vec<K>> {
        let mut params = ListParams::default();
        if !label_selector.is_empty() {
            params = params.labels(label_selector);
        }
        debug!("Listing {} in '{}' ({})", K::plural(&()), namespace, label_selector);
        let list = self
            .api(namespace)
            .list(&params)
            .await
            .map_err(|e| from_kube_error(e, format!("list {}", K::plural(&()))))?;
        Ok(list.items)
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<K> {
        self.api(namespace)
            .get(name)
            .await
            .map_err(|e| from_kube_error(e, describe::<K>(namespace, name)))
    }

    async fn create(&self, obj: &K) -> Result<K> {
        let namespace = obj.namespace().unwrap_or_default();
        let name = obj.name_any();
        self.api(&namespace)
            .create(&PostParams::default(), obj)
            .await
            .map_err(|e| from_kube_error(e, describe::<K>(&namespace, &name)))
    }

    async fn update(&self, obj: &K) -> Result<K> {
        let namespace = obj.namespace().unwrap_or_default();
        let name = obj.name_any();
        self.api(&namespace)
            .replace(&name, &PostParams::default(), obj)
            .await
            .map_err(|e| from_kube_error(e, describe::<K>(&namespace, &name)))
    }

    async fn patch(&self, namespace: &str, name: &str, patch: &serde_json::Value) -> Result<K> {
        self.api(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(|e| from_kube_error(e, describe::<K>(namespace, name)))
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.api(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| from_kube_error(e, describe::<K>(namespace, name)))
    }
}
