//! Alert groups and rules.
//!
//! A rule belongs to exactly one group, referenced by the composite group id
//! `<scope>:<group-name>`. On the wire each rule kind carries its target as a
//! set of mutually exclusive optional fields; in code those fields are only
//! reachable through [`ClusterRuleTarget`] and [`ProjectRuleTarget`].

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{AlertStatus, Recipient, TimingField};

/// Build the composite id a rule uses to reference its group.
pub fn group_id(scope: &str, group_name: &str) -> String {
    format!("{}:{}", scope, group_name)
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommonGroupField {
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(flatten)]
    pub timing: TimingField,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommonRuleField {
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub severity: String,

    #[serde(flatten)]
    pub timing: TimingField,
}

#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[kube(
    group = "management.cattle.io",
    version = "v3",
    kind = "ClusterAlertGroup",
    namespaced,
    status = "AlertStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterGroupSpec {
    #[serde(default)]
    pub cluster_name: String,

    #[serde(flatten)]
    pub common: CommonGroupField,

    #[serde(default)]
    pub recipients: Vec<Recipient>,
}

#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[kube(
    group = "management.cattle.io",
    version = "v3",
    kind = "ProjectAlertGroup",
    namespaced,
    status = "AlertStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGroupSpec {
    /// Owning project as `<cluster>:<project>`
    #[serde(default)]
    pub project_name: String,

    #[serde(flatten)]
    pub common: CommonGroupField,

    #[serde(default)]
    pub recipients: Vec<Recipient>,
}

#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[kube(
    group = "management.cattle.io",
    version = "v3",
    kind = "ClusterAlertRule",
    namespaced,
    status = "AlertStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAlertRuleSpec {
    #[serde(default)]
    pub cluster_name: String,

    /// Composite id of the owning group
    #[serde(default)]
    pub group_name: String,

    #[serde(flatten)]
    pub common: CommonRuleField,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    node_rule: Option<NodeRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_rule: Option<EventRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    system_service_rule: Option<SystemServiceRule>,
}

#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[kube(
    group = "management.cattle.io",
    version = "v3",
    kind = "ProjectAlertRule",
    namespaced,
    status = "AlertStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAlertRuleSpec {
    /// Owning project as `<cluster>:<project>`
    #[serde(default)]
    pub project_name: String,

    /// Composite id of the owning group
    #[serde(default)]
    pub group_name: String,

    #[serde(flatten)]
    pub common: CommonRuleField,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pod_rule: Option<PodRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    workload_rule: Option<WorkloadRule>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeRule {
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
pub struct EventRule {
    #[serde(default)]
    pub event_type: String,

    #[serde(default)]
    pub resource_kind: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemServiceRule {
    #[serde(default)]
    pub condition: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodRule {
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
pub struct WorkloadRule {
    #[serde(default)]
    pub workload_id: String,

    #[serde(default)]
    pub selector: BTreeMap<String, String>,

    #[serde(default)]
    pub available_percentage: i64,
}

/// What a cluster rule watches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClusterRuleTarget {
    #[default]
    None,
    Node(NodeRule),
    Event(EventRule),
    SystemService(SystemServiceRule),
}

/// What a project rule watches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProjectRuleTarget {
    #[default]
    None,
    Pod(PodRule),
    Workload(WorkloadRule),
}

impl ClusterAlertRuleSpec {
    pub fn new(
        cluster_name: &str,
        group_name: String,
        common: CommonRuleField,
        target: ClusterRuleTarget,
    ) -> Self {
        let mut spec = Self {
            cluster_name: cluster_name.to_string(),
            group_name,
            common,
            ..Default::default()
        };
        spec.set_target(target);
        spec
    }

    /// Records read back from the API server with more than one target
    /// populated report no target.
    pub fn target(&self) -> ClusterRuleTarget {
        match (&self.node_rule, &self.event_rule, &self.system_service_rule) {
            (Some(node), None, None) => ClusterRuleTarget::Node(node.clone()),
            (None, Some(event), None) => ClusterRuleTarget::Event(event.clone()),
            (None, None, Some(service)) => ClusterRuleTarget::SystemService(service.clone()),
            _ => ClusterRuleTarget::None,
        }
    }

    /// Replaces whatever target was set before.
    pub fn set_target(&mut self, target: ClusterRuleTarget) {
        self.node_rule = None;
        self.event_rule = None;
        self.system_service_rule = None;
        match target {
            ClusterRuleTarget::None => {}
            ClusterRuleTarget::Node(rule) => self.node_rule = Some(rule),
            ClusterRuleTarget::Event(rule) => self.event_rule = Some(rule),
            ClusterRuleTarget::SystemService(rule) => self.system_service_rule = Some(rule),
        }
    }
}

impl ProjectAlertRuleSpec {
    pub fn new(
        project_name: &str,
        group_name: String,
        common: CommonRuleField,
        target: ProjectRuleTarget,
    ) -> Self {
        let mut spec = Self {
            project_name: project_name.to_string(),
            group_name,
            common,
            ..Default::default()
        };
        spec.set_target(target);
        spec
    }

    pub fn target(&self) -> ProjectRuleTarget {
        match (&self.pod_rule, &self.workload_rule) {
            (Some(pod), None) => ProjectRuleTarget::Pod(pod.clone()),
            (None, Some(workload)) => ProjectRuleTarget::Workload(workload.clone()),
            _ => ProjectRuleTarget::None,
        }
    }

    pub fn set_target(&mut self, target: ProjectRuleTarget) {
        self.pod_rule = None;
        self.workload_rule = None;
        match target {
            ProjectRuleTarget::None => {}
            ProjectRuleTarget::Pod(rule) => self.pod_rule = Some(rule),
            ProjectRuleTarget::Workload(rule) => self.workload_rule = Some(rule),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_target_clears_previous_target() {
        let mut spec = ClusterAlertRuleSpec::new(
            "c-abc12",
            group_id("c-abc12", "g"),
            CommonRuleField::default(),
            ClusterRuleTarget::Node(NodeRule::default()),
        );
        spec.set_target(ClusterRuleTarget::Event(EventRule {
            event_type: "Warning".to_string(),
            resource_kind: "Pod".to_string(),
        }));

        let value = serde_json::to_value(&spec).unwrap();
        assert!(value.get("nodeRule").is_none());
        assert_eq!(value["eventRule"]["resourceKind"], "Pod");
    }

    #[test]
    fn test_rule_wire_shape() {
        let spec = ProjectAlertRuleSpec::new(
            "c-abc12:p-xyz",
            group_id("p-xyz", "migrate-group-crashloop"),
            CommonRuleField {
                display_name: "Crashloop".to_string(),
                severity: "warning".to_string(),
                timing: TimingField {
                    group_wait_seconds: 30,
                    group_interval_seconds: 180,
                    repeat_interval_seconds: 300,
                },
            },
            ProjectRuleTarget::Pod(PodRule {
                pod_name: "p-xyz:web-0".to_string(),
                condition: "restarts".to_string(),
                restart_times: 3,
                restart_interval_seconds: 60,
            }),
        );

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["groupName"], "p-xyz:migrate-group-crashloop");
        assert_eq!(value["groupWaitSeconds"], 30);
        assert_eq!(value["podRule"]["restartTimes"], 3);
        assert!(value.get("workloadRule").is_none());
    }

    #[test]
    fn test_ambiguous_wire_record_reports_no_target() {
        let spec: ClusterAlertRuleSpec = serde_json::from_value(json!({
            "clusterName": "c-abc12",
            "groupName": "c-abc12:g",
            "nodeRule": { "nodeName": "m-1" },
            "eventRule": { "eventType": "Warning" }
        }))
        .unwrap();
        assert_eq!(spec.target(), ClusterRuleTarget::None);
    }
}
