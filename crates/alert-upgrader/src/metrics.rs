use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::warn;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref RULES_MIGRATED_TOTAL: IntCounterVec = register_counter_vec(
        "alerting_upgrade_rules_migrated_total",
        "Alert rules created or updated from legacy alerts.",
        &["scope"],
    );
    pub static ref GROUPS_CREATED_TOTAL: IntCounterVec = register_counter_vec(
        "alerting_upgrade_groups_created_total",
        "Migration alert groups created.",
        &["scope"],
    );
    pub static ref UPGRADES_TOTAL: IntCounterVec = register_counter_vec(
        "alerting_upgrade_runs_total",
        "Upgrade runs by outcome.",
        &["result"],
    );
}

fn register_counter_vec(name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    let counter = IntCounterVec::new(Opts::new(name, help), labels)
        .expect("metric options are valid");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("metric is registered once");
    counter
}

/// How an upgrade run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// App moved to the new version
    Upgraded,
    /// App already at the new version
    Unchanged,
    /// App not deployed
    Skipped,
    NotReady,
    Failed,
}

impl UpgradeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeOutcome::Upgraded => "upgraded",
            UpgradeOutcome::Unchanged => "unchanged",
            UpgradeOutcome::Skipped => "skipped",
            UpgradeOutcome::NotReady => "not_ready",
            UpgradeOutcome::Failed => "failed",
        }
    }
}

pub fn record_rule_migrated(scope: &str) {
    RULES_MIGRATED_TOTAL.with_label_values(&[scope]).inc();
}

pub fn record_group_created(scope: &str) {
    GROUPS_CREATED_TOTAL.with_label_values(&[scope]).inc();
}

pub fn record_upgrade(outcome: UpgradeOutcome) {
    UPGRADES_TOTAL.with_label_values(&[outcome.as_str()]).inc();
}

// Function to gather metrics for exposition
pub fn gather_metrics() -> String {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_exposed() {
        record_rule_migrated("cluster");
        record_group_created("project");
        record_upgrade(UpgradeOutcome::Skipped);

        let text = gather_metrics();
        assert!(text.contains("alerting_upgrade_rules_migrated_total{scope=\"cluster\"}"));
        assert!(text.contains("alerting_upgrade_groups_created_total{scope=\"project\"}"));
        assert!(text.contains("alerting_upgrade_runs_total{result=\"skipped\"}"));
    }
}
