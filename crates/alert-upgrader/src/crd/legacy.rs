//! Legacy single-resource alert definitions.
//!
//! These are only ever read: the upgrade translates them into groups and
//! rules and then drops the namespace the legacy alert manager ran in.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{AlertStatus, Recipient};

/// Fields shared by cluster and project alerts.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertCommonSpec {
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    /// critical, warning or info
    #[serde(default)]
    pub severity: String,

    #[serde(default)]
    pub recipients: Vec<Recipient>,

    #[serde(default)]
    pub initial_wait_seconds: i64,

    #[serde(default)]
    pub repeat_interval_seconds: i64,
}

#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[kube(
    group = "management.cattle.io",
    version = "v3",
    kind = "ClusterAlert",
    namespaced,
    status = "AlertStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAlertSpec {
    #[serde(flatten)]
    pub common: AlertCommonSpec,

    #[serde(default)]
    pub cluster_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node: Option<TargetNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_event: Option<TargetEvent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_system_service: Option<TargetSystemService>,
}

#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[kube(
    group = "management.cattle.io",
    version = "v3",
    kind = "ProjectAlert",
    namespaced,
    status = "AlertStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAlertSpec {
    #[serde(flatten)]
    pub common: AlertCommonSpec,

    /// Owning project as `<cluster>:<project>`
    #[serde(default)]
    pub project_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_workload: Option<TargetWorkload>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_pod: Option<TargetPod>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetNode {
    #[serde(default)]
    pub node_name: String,

    #[serde(default)]
    pub selector: BTreeMap<String, String>,

    #[serde(default)]
    pub condition: String,

    #[serde(default)]
    pub mem_threshold: i64,

    #[serde(default)]
    pub cpu_threshold: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetEvent {
    #[serde(default)]
    pub event_type: String,

    #[serde(default)]
    pub resource_kind: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetSystemService {
    #[serde(default)]
    pub condition: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetPod {
    #[serde(default)]
    pub pod_name: String,

    #[serde(default)]
    pub condition: String,

    #[serde(default)]
    pub restart_times: i64,

    #[serde(default)]
    pub restart_interval_seconds: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetWorkload {
    #[serde(default)]
    pub workload_id: String,

    #[serde(default)]
    pub selector: BTreeMap<String, String>,

    #[serde(default)]
    pub available_percentage: i64,
}
