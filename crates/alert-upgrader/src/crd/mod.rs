pub mod alert;
pub mod app;
pub mod catalog;
pub mod cluster;
pub mod common;
pub mod legacy;

pub use alert::{
    ClusterAlertGroup, ClusterAlertRule, ClusterRuleTarget, ProjectAlertGroup, ProjectAlertRule,
    ProjectRuleTarget,
};
pub use app::{App, AppSpec, AppStatus};
pub use catalog::{Catalog, CatalogTemplate};
pub use cluster::{Cluster, Project};
pub use common::{AlertStatus, Condition, Recipient, TimingField};
pub use legacy::{ClusterAlert, ProjectAlert};
