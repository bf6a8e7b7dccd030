use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Status value carried by a condition that holds.
pub const CONDITION_TRUE: &str = "True";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    pub fn new(condition_type: &str, status: bool) -> Self {
        Self {
            condition_type: condition_type.to_string(),
            status: if status { CONDITION_TRUE } else { "False" }.to_string(),
            ..Default::default()
        }
    }
}

/// A condition that is absent counts as not true.
pub fn is_condition_true(conditions: &[Condition], condition_type: &str) -> bool {
    conditions
        .iter()
        .any(|c| c.condition_type == condition_type && c.status == CONDITION_TRUE)
}

/// A notification target attached to an alert or group.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    /// Address on the notifier side (email, channel, ...)
    #[serde(default)]
    pub recipient: String,

    #[serde(default)]
    pub notifier_name: String,

    #[serde(default)]
    pub notifier_type: String,
}

impl Recipient {
    pub fn new(recipient: &str) -> Self {
        Self {
            recipient: recipient.to_string(),
            ..Default::default()
        }
    }
}

/// Notification timing shared by groups and rules. All values are seconds.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimingField {
    #[serde(default)]
    pub group_wait_seconds: i64,

    #[serde(default)]
    pub group_interval_seconds: i64,

    #[serde(default)]
    pub repeat_interval_seconds: i64,
}

/// Status shared by alerts, groups and rules. Fields this crate does not
/// model are kept so a write-back leaves them intact.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertStatus {
    /// active, inactive, alerting or muted
    #[serde(default)]
    pub alert_state: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_lookup() {
        let conditions = vec![
            Condition::new("Ready", true),
            Condition::new("Refreshed", false),
        ];
        assert!(is_condition_true(&conditions, "Ready"));
        assert!(!is_condition_true(&conditions, "Refreshed"));
        assert!(!is_condition_true(&conditions, "DiskCached"));
    }

    #[test]
    fn test_condition_status_is_case_sensitive() {
        let conditions = vec![Condition {
            condition_type: "Ready".to_string(),
            status: "true".to_string(),
            ..Default::default()
        }];
        assert!(!is_condition_true(&conditions, "Ready"));
    }

    #[test]
    fn test_timing_wire_names() {
        let timing = TimingField {
            group_wait_seconds: 30,
            group_interval_seconds: 180,
            repeat_interval_seconds: 300,
        };
        assert_eq!(
            serde_json::to_value(timing).unwrap(),
            json!({
                "groupWaitSeconds": 30,
                "groupIntervalSeconds": 180,
                "repeatIntervalSeconds": 300
            })
        );
    }

    #[test]
    fn test_alert_status_keeps_unknown_fields() {
        let raw = json!({ "alertState": "muted", "conditions": [{ "type": "Synced" }] });
        let status: AlertStatus = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(status.alert_state, "muted");
        assert_eq!(serde_json::to_value(&status).unwrap(), raw);
    }
}
