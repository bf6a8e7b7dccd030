use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::Condition;

/// A deployed helm application, namespaced in its project.
///
/// Only the fields the upgrade reads are typed. Everything else the app
/// deployer sets (files, timeouts, prune flags, ...) rides along in `extra`.
#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[kube(
    group = "project.cattle.io",
    version = "v3",
    kind = "App",
    namespaced,
    status = "AppStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    /// Owning project as `<cluster>:<project>`
    #[serde(default)]
    pub project_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub target_namespace: String,

    /// `catalog://?catalog=...&template=...&version=...`
    #[serde(rename = "externalId", default)]
    pub external_id: String,

    /// Flattened helm values
    #[serde(default)]
    pub answers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_yaml: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_revision_name: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_app_round_trip_keeps_untyped_fields() {
        let raw = json!({
            "apiVersion": "project.cattle.io/v3",
            "kind": "App",
            "metadata": { "name": "cluster-alerting", "namespace": "p-sys" },
            "spec": {
                "projectName": "c-abc12:p-sys",
                "targetNamespace": "cattle-prometheus",
                "externalId": "catalog://?catalog=system-library&template=rancher-monitoring&version=0.1.0",
                "answers": { "operator.enabled": "true" },
                "answersSetString": { "alertmanager.secret": "x" },
                "files": { "values.yaml": "a: b" },
                "prune": true,
                "wait": true,
                "timeout": 300,
                "multiClusterAppName": "mca-1"
            },
            "status": {
                "conditions": [{ "type": "Deployed", "status": "True" }],
                "notes": "installed",
                "lastAppliedTemplate": "cluster-alerting"
            }
        });

        let app: App = serde_json::from_value(raw).unwrap();
        assert_eq!(app.spec.extra["timeout"], 300);

        let value = serde_json::to_value(&app).unwrap();
        assert_eq!(value["spec"]["answersSetString"]["alertmanager.secret"], "x");
        assert_eq!(value["spec"]["files"]["values.yaml"], "a: b");
        assert_eq!(value["spec"]["prune"], true);
        assert_eq!(value["spec"]["wait"], true);
        assert_eq!(value["spec"]["multiClusterAppName"], "mca-1");
        assert_eq!(value["status"]["notes"], "installed");
        assert_eq!(value["status"]["conditions"][0]["type"], "Deployed");
    }
}
