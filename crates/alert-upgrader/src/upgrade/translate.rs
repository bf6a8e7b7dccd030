//! Mapping from legacy alerts to migration groups and rules.
//!
//! Every legacy alert becomes one rule plus one group of its own, named after
//! the legacy alert so a second migration run lands on the same records.

use kube::ResourceExt;

use crate::crd::alert::{
    group_id, ClusterAlertRuleSpec, ClusterGroupSpec, CommonGroupField, CommonRuleField,
    EventRule, NodeRule, PodRule, ProjectAlertRuleSpec, ProjectGroupSpec, SystemServiceRule,
    WorkloadRule,
};
use crate::crd::cluster::split_project_id;
use crate::crd::legacy::{AlertCommonSpec, ClusterAlertSpec, ProjectAlertSpec};
use crate::crd::{
    ClusterAlert, ClusterAlertGroup, ClusterAlertRule, ClusterRuleTarget, ProjectAlert,
    ProjectAlertGroup, ProjectAlertRule, ProjectRuleTarget, TimingField,
};

pub const MIGRATION_GROUP_DISPLAY_NAME: &str = "Migrate group";
pub const MIGRATION_GROUP_DESCRIPTION: &str = "Migrate alert from last version";

pub fn migration_group_name(legacy_name: &str) -> String {
    format!("migrate-group-{}", legacy_name)
}

pub fn cluster_rule_name(legacy_name: &str) -> String {
    format!("migrate-{}", legacy_name)
}

pub fn project_rule_name(legacy_name: &str) -> String {
    format!("migrate-rule-{}", legacy_name)
}

#[derive(Debug, Clone)]
pub struct ClusterMigration {
    pub rule: ClusterAlertRule,
    pub group: ClusterAlertGroup,
}

#[derive(Debug, Clone)]
pub struct ProjectMigration {
    pub rule: ProjectAlertRule,
    pub group: ProjectAlertGroup,
}

fn timing(common: &AlertCommonSpec, group_interval_seconds: i64) -> TimingField {
    TimingField {
        group_wait_seconds: common.initial_wait_seconds,
        group_interval_seconds,
        repeat_interval_seconds: common.repeat_interval_seconds,
    }
}

fn rule_field(common: &AlertCommonSpec, group_interval_seconds: i64) -> CommonRuleField {
    CommonRuleField {
        display_name: common.display_name.clone(),
        severity: common.severity.clone(),
        timing: timing(common, group_interval_seconds),
    }
}

fn group_field(common: &AlertCommonSpec, group_interval_seconds: i64) -> CommonGroupField {
    CommonGroupField {
        display_name: MIGRATION_GROUP_DISPLAY_NAME.to_string(),
        description: MIGRATION_GROUP_DESCRIPTION.to_string(),
        timing: timing(common, group_interval_seconds),
    }
}

/// A legacy alert with more than one target populated is malformed and
/// migrates without a target.
pub fn cluster_target(spec: &ClusterAlertSpec) -> ClusterRuleTarget {
    match (
        &spec.target_node,
        &spec.target_event,
        &spec.target_system_service,
    ) {
        (Some(node), None, None) => ClusterRuleTarget::Node(NodeRule {
            node_name: node.node_name.clone(),
            selector: node.selector.clone(),
            condition: node.condition.clone(),
            mem_threshold: node.mem_threshold,
            cpu_threshold: node.cpu_threshold,
        }),
        (None, Some(event), None) => ClusterRuleTarget::Event(EventRule {
            event_type: event.event_type.clone(),
            resource_kind: event.resource_kind.clone(),
        }),
        (None, None, Some(service)) => ClusterRuleTarget::SystemService(SystemServiceRule {
            condition: service.condition.clone(),
        }),
        _ => ClusterRuleTarget::None,
    }
}

pub fn project_target(spec: &ProjectAlertSpec) -> ProjectRuleTarget {
    match (&spec.target_pod, &spec.target_workload) {
        (Some(pod), None) => ProjectRuleTarget::Pod(PodRule {
            pod_name: pod.pod_name.clone(),
            condition: pod.condition.clone(),
            restart_times: pod.restart_times,
            restart_interval_seconds: pod.restart_interval_seconds,
        }),
        (None, Some(workload)) => ProjectRuleTarget::Workload(WorkloadRule {
            workload_id: workload.workload_id.clone(),
            selector: workload.selector.clone(),
            available_percentage: workload.available_percentage,
        }),
        _ => ProjectRuleTarget::None,
    }
}

pub fn translate_cluster_alert(
    alert: &ClusterAlert,
    cluster_name: &str,
    group_interval_seconds: i64,
) -> ClusterMigration {
    let legacy_name = alert.name_any();
    let common = &alert.spec.common;
    let group_name = migration_group_name(&legacy_name);

    let mut rule = ClusterAlertRule::new(
        &cluster_rule_name(&legacy_name),
        ClusterAlertRuleSpec::new(
            cluster_name,
            group_id(cluster_name, &group_name),
            rule_field(common, group_interval_seconds),
            cluster_target(&alert.spec),
        ),
    );
    rule.metadata.namespace = Some(cluster_name.to_string());

    let mut group = ClusterAlertGroup::new(
        &group_name,
        ClusterGroupSpec {
            cluster_name: cluster_name.to_string(),
            common: group_field(common, group_interval_seconds),
            recipients: common.recipients.clone(),
        },
    );
    group.metadata.namespace = Some(cluster_name.to_string());

    ClusterMigration { rule, group }
}

/// `project_id` is the owning project as `<cluster>:<project>`; the records
/// land in the project's namespace.
pub fn translate_project_alert(
    alert: &ProjectAlert,
    project_id: &str,
    group_interval_seconds: i64,
) -> ProjectMigration {
    let legacy_name = alert.name_any();
    let common = &alert.spec.common;
    let (_, project_name) = split_project_id(project_id);
    let group_name = migration_group_name(&legacy_name);

    let mut rule = ProjectAlertRule::new(
        &project_rule_name(&legacy_name),
        ProjectAlertRuleSpec::new(
            project_id,
            group_id(project_name, &group_name),
            rule_field(common, group_interval_seconds),
            project_target(&alert.spec),
        ),
    );
    rule.metadata.namespace = Some(project_name.to_string());

    let mut group = ProjectAlertGroup::new(
        &group_name,
        ProjectGroupSpec {
            project_name: project_id.to_string(),
            common: group_field(common, group_interval_seconds),
            recipients: common.recipients.clone(),
        },
    );
    group.metadata.namespace = Some(project_name.to_string());

    ProjectMigration { rule, group }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_GROUP_INTERVAL_SECONDS;
    use crate::crd::legacy::{
        TargetEvent, TargetNode, TargetPod, TargetSystemService, TargetWorkload,
    };
    use crate::crd::Recipient;
    use std::collections::BTreeMap;

    fn common(initial_wait: i64, repeat: i64) -> AlertCommonSpec {
        AlertCommonSpec {
            display_name: "High CPU".to_string(),
            severity: "critical".to_string(),
            recipients: vec![Recipient::new("a@x.com"), Recipient::new("b@x.com")],
            initial_wait_seconds: initial_wait,
            repeat_interval_seconds: repeat,
            ..Default::default()
        }
    }

    fn cluster_alert(name: &str, spec: ClusterAlertSpec) -> ClusterAlert {
        let mut alert = ClusterAlert::new(name, spec);
        alert.metadata.namespace = Some("c-abc12".to_string());
        alert
    }

    fn project_alert(name: &str, spec: ProjectAlertSpec) -> ProjectAlert {
        let mut alert = ProjectAlert::new(name, spec);
        alert.metadata.namespace = Some("p-xyz".to_string());
        alert
    }

    #[test]
    fn test_timing_mapping() {
        let alert = cluster_alert(
            "high-cpu",
            ClusterAlertSpec {
                common: common(30, 300),
                ..Default::default()
            },
        );
        let migration = translate_cluster_alert(&alert, "c-abc12", DEFAULT_GROUP_INTERVAL_SECONDS);

        let expected = TimingField {
            group_wait_seconds: 30,
            group_interval_seconds: 180,
            repeat_interval_seconds: 300,
        };
        assert_eq!(migration.rule.spec.common.timing, expected);
        assert_eq!(migration.group.spec.common.timing, expected);
    }

    #[test]
    fn test_group_interval_is_configurable() {
        let alert = cluster_alert("a", ClusterAlertSpec::default());
        let migration = translate_cluster_alert(&alert, "c-abc12", 60);
        assert_eq!(migration.rule.spec.common.timing.group_interval_seconds, 60);
    }

    #[test]
    fn test_cluster_names_and_references() {
        let alert = cluster_alert(
            "high-cpu",
            ClusterAlertSpec {
                common: common(30, 300),
                cluster_name: "c-abc12".to_string(),
                ..Default::default()
            },
        );
        let ClusterMigration { rule, group } =
            translate_cluster_alert(&alert, "c-abc12", DEFAULT_GROUP_INTERVAL_SECONDS);

        assert_eq!(rule.name_any(), "migrate-high-cpu");
        assert_eq!(rule.namespace().as_deref(), Some("c-abc12"));
        assert_eq!(rule.spec.group_name, "c-abc12:migrate-group-high-cpu");
        assert_eq!(rule.spec.common.display_name, "High CPU");
        assert_eq!(rule.spec.common.severity, "critical");

        assert_eq!(group.name_any(), "migrate-group-high-cpu");
        assert_eq!(group.namespace().as_deref(), Some("c-abc12"));
        assert_eq!(group.spec.common.display_name, MIGRATION_GROUP_DISPLAY_NAME);
        assert_eq!(group.spec.recipients, alert.spec.common.recipients);
    }

    #[test]
    fn test_recipients_are_copied_verbatim() {
        let mut spec = ClusterAlertSpec {
            common: common(0, 0),
            ..Default::default()
        };
        spec.common.recipients = vec![
            Recipient::new("a@x.com"),
            Recipient::new("a@x.com"),
            Recipient::new(""),
        ];
        let migration = translate_cluster_alert(&cluster_alert("dup", spec.clone()), "c-abc12", 180);
        assert_eq!(migration.group.spec.recipients, spec.common.recipients);
    }

    #[test]
    fn test_each_cluster_target_maps_to_its_rule() {
        let node = TargetNode {
            node_name: "c-abc12:m-1".to_string(),
            selector: BTreeMap::from([("role".to_string(), "worker".to_string())]),
            condition: "cpu".to_string(),
            mem_threshold: 80,
            cpu_threshold: 70,
        };
        let spec = ClusterAlertSpec {
            target_node: Some(node.clone()),
            ..Default::default()
        };
        match translate_cluster_alert(&cluster_alert("n", spec), "c-abc12", 180)
            .rule
            .spec
            .target()
        {
            ClusterRuleTarget::Node(rule) => {
                assert_eq!(rule.node_name, node.node_name);
                assert_eq!(rule.selector, node.selector);
                assert_eq!(rule.mem_threshold, 80);
                assert_eq!(rule.cpu_threshold, 70);
            }
            other => panic!("expected node rule, got {:?}", other),
        }

        let spec = ClusterAlertSpec {
            target_event: Some(TargetEvent {
                event_type: "Warning".to_string(),
                resource_kind: "Pod".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(
            translate_cluster_alert(&cluster_alert("e", spec), "c-abc12", 180)
                .rule
                .spec
                .target(),
            ClusterRuleTarget::Event(EventRule {
                event_type: "Warning".to_string(),
                resource_kind: "Pod".to_string(),
            })
        );

        let spec = ClusterAlertSpec {
            target_system_service: Some(TargetSystemService {
                condition: "etcd".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(
            translate_cluster_alert(&cluster_alert("s", spec), "c-abc12", 180)
                .rule
                .spec
                .target(),
            ClusterRuleTarget::SystemService(SystemServiceRule {
                condition: "etcd".to_string(),
            })
        );

        assert_eq!(
            translate_cluster_alert(&cluster_alert("none", ClusterAlertSpec::default()), "c-abc12", 180)
                .rule
                .spec
                .target(),
            ClusterRuleTarget::None
        );
    }

    #[test]
    fn test_malformed_cluster_alert_has_no_target() {
        let spec = ClusterAlertSpec {
            target_node: Some(TargetNode::default()),
            target_event: Some(TargetEvent::default()),
            ..Default::default()
        };
        let rule = translate_cluster_alert(&cluster_alert("both", spec), "c-abc12", 180).rule;
        assert_eq!(rule.spec.target(), ClusterRuleTarget::None);

        let value = serde_json::to_value(&rule.spec).unwrap();
        assert!(value.get("nodeRule").is_none());
        assert!(value.get("eventRule").is_none());
    }

    #[test]
    fn test_project_names_and_references() {
        let spec = ProjectAlertSpec {
            common: common(10, 600),
            project_name: "c-abc12:p-xyz".to_string(),
            target_pod: Some(TargetPod {
                pod_name: "p-xyz:web-0".to_string(),
                condition: "restarts".to_string(),
                restart_times: 3,
                restart_interval_seconds: 60,
            }),
            ..Default::default()
        };
        let ProjectMigration { rule, group } =
            translate_project_alert(&project_alert("crashloop", spec), "c-abc12:p-xyz", 180);

        assert_eq!(rule.name_any(), "migrate-rule-crashloop");
        assert_eq!(rule.namespace().as_deref(), Some("p-xyz"));
        assert_eq!(rule.spec.project_name, "c-abc12:p-xyz");
        assert_eq!(rule.spec.group_name, "p-xyz:migrate-group-crashloop");
        assert_eq!(rule.spec.common.timing.group_wait_seconds, 10);
        assert_eq!(rule.spec.common.timing.repeat_interval_seconds, 600);
        assert!(matches!(rule.spec.target(), ProjectRuleTarget::Pod(ref pod) if pod.restart_times == 3));

        assert_eq!(group.name_any(), "migrate-group-crashloop");
        assert_eq!(group.namespace().as_deref(), Some("p-xyz"));
        assert_eq!(group.spec.project_name, "c-abc12:p-xyz");
        assert_eq!(group.spec.recipients.len(), 2);
    }

    #[test]
    fn test_each_project_target_maps_to_its_rule() {
        let spec = ProjectAlertSpec {
            target_workload: Some(TargetWorkload {
                workload_id: "deployment:p-xyz:web".to_string(),
                selector: BTreeMap::new(),
                available_percentage: 50,
            }),
            ..Default::default()
        };
        assert_eq!(
            translate_project_alert(&project_alert("w", spec), "c-abc12:p-xyz", 180)
                .rule
                .spec
                .target(),
            ProjectRuleTarget::Workload(WorkloadRule {
                workload_id: "deployment:p-xyz:web".to_string(),
                selector: BTreeMap::new(),
                available_percentage: 50,
            })
        );

        assert_eq!(
            translate_project_alert(&project_alert("n", ProjectAlertSpec::default()), "c-abc12:p-xyz", 180)
                .rule
                .spec
                .target(),
            ProjectRuleTarget::None
        );

        let both = ProjectAlertSpec {
            target_pod: Some(TargetPod::default()),
            target_workload: Some(TargetWorkload::default()),
            ..Default::default()
        };
        assert_eq!(
            translate_project_alert(&project_alert("b", both), "c-abc12:p-xyz", 180)
                .rule
                .spec
                .target(),
            ProjectRuleTarget::None
        );
    }
}
