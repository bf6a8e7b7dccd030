use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{is_condition_true, Condition};

/// Condition set once the cluster agent is connected and the API is reachable.
pub const CLUSTER_CONDITION_READY: &str = "Ready";

/// Label carried by the project that hosts cluster infrastructure apps.
pub const SYSTEM_PROJECT_LABEL_KEY: &str = "authz.management.cattle.io/system-project";

#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[kube(
    group = "management.cattle.io",
    version = "v3",
    kind = "Cluster",
    status = "ClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Cluster {
    pub fn is_ready(&self) -> bool {
        self.status
            .as_ref()
            .map(|s| is_condition_true(&s.conditions, CLUSTER_CONDITION_READY))
            .unwrap_or(false)
    }
}

/// A project lives in the namespace named after its cluster.
#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[kube(
    group = "management.cattle.io",
    version = "v3",
    kind = "Project",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub cluster_name: String,
}

/// Split a `<cluster>:<project>` id. An id without a cluster part yields an
/// empty cluster.
pub fn split_project_id(project_id: &str) -> (&str, &str) {
    project_id.split_once(':').unwrap_or(("", project_id))
}

/// Labels identifying the system project, for seeding fixtures.
pub fn system_project_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(SYSTEM_PROJECT_LABEL_KEY.to_string(), "true".to_string())])
}
