//! Global settings lookup.
//!
//! Settings are cluster-scoped `management.cattle.io/v3` `Setting` objects
//! with top-level `value` and `default` fields. An empty value falls back to
//! the object's default, and a missing object to the built-in default.

use std::collections::HashMap;

use async_trait::async_trait;
use kube::{
    api::Api,
    core::{ApiResource, DynamicObject, GroupVersionKind},
    Client,
};
use serde_json::Value;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::{Error, Result};

/// External id of the chart the alerting app is installed from.
pub const SYSTEM_MONITORING_CATALOG_ID: &str = "system-monitoring-catalog-id";

pub const DEFAULT_SYSTEM_MONITORING_CATALOG_ID: &str =
    "catalog://?catalog=system-library&template=rancher-monitoring&version=0.1.0";

fn builtin_default(key: &str) -> Option<&'static str> {
    match key {
        SYSTEM_MONITORING_CATALOG_ID => Some(DEFAULT_SYSTEM_MONITORING_CATALOG_ID),
        _ => None,
    }
}

fn resolve(key: &str, value: Option<String>) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .or_else(|| builtin_default(key).map(str::to_string))
        .ok_or_else(|| Error::Config(format!("setting {} is not set", key)))
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Settings: Send + Sync {
    async fn get(&self, key: &str) -> Result<String>;
}

/// Settings from a fixed map, for overrides and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    values: HashMap<String, String>,
}

impl StaticSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl Settings for StaticSettings {
    async fn get(&self, key: &str) -> Result<String> {
        resolve(key, self.values.get(key).cloned())
    }
}

pub struct KubeSettings {
    api: Api<DynamicObject>,
}

impl KubeSettings {
    pub fn new(client: Client) -> Self {
        let gvk = GroupVersionKind::gvk("management.cattle.io", "v3", "Setting");
        let resource = ApiResource::from_gvk(&gvk);
        Self {
            api: Api::all_with(client, &resource),
        }
    }
}

/// `value`, or `default` when the value was never customized.
fn setting_value(data: &Value) -> Option<String> {
    ["value", "default"]
        .iter()
        .filter_map(|field| data.get(*field).and_then(Value::as_str))
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl Settings for KubeSettings {
    async fn get(&self, key: &str) -> Result<String> {
        let value = match self.api.get(key).await {
            Ok(setting) => setting_value(&setting.data),
            Err(kube::Error::Api(resp)) if resp.code == 404 => {
                debug!("Setting {} does not exist, using built-in default", key);
                None
            }
            Err(e) => return Err(Error::Kubernetes(format!("get setting {}: {}", key, e))),
        };
        resolve(key, value)
    }
}
