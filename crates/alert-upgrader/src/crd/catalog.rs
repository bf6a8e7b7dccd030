use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{is_condition_true, Condition};

pub const CATALOG_CONDITION_UPGRADED: &str = "Upgraded";
pub const CATALOG_CONDITION_REFRESHED: &str = "Refreshed";
pub const CATALOG_CONDITION_DISK_CACHED: &str = "DiskCached";

/// A helm chart repository known to the management plane.
#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[kube(
    group = "management.cattle.io",
    version = "v3",
    kind = "Catalog",
    status = "CatalogStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSpec {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub branch: String,

    #[serde(default)]
    pub catalog_kind: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Catalog {
    /// Upgraded, refreshed and cached on disk. Anything short of that and
    /// a chart install against it fails without retry.
    pub fn is_ready(&self) -> bool {
        let conditions = self
            .status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default();
        [
            CATALOG_CONDITION_UPGRADED,
            CATALOG_CONDITION_REFRESHED,
            CATALOG_CONDITION_DISK_CACHED,
        ]
        .iter()
        .all(|c| is_condition_true(conditions, c))
    }
}

/// One chart of a catalog, named `<catalog>-<template>`.
#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[kube(
    group = "management.cattle.io",
    version = "v3",
    kind = "CatalogTemplate",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTemplateSpec {
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub catalog_id: String,

    #[serde(default)]
    pub default_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with(upgraded: bool, refreshed: bool, cached: bool) -> Catalog {
        let mut catalog = Catalog::new("system-library", CatalogSpec::default());
        catalog.status = Some(CatalogStatus {
            conditions: vec![
                Condition::new(CATALOG_CONDITION_UPGRADED, upgraded),
                Condition::new(CATALOG_CONDITION_REFRESHED, refreshed),
                Condition::new(CATALOG_CONDITION_DISK_CACHED, cached),
            ],
        });
        catalog
    }

    #[test]
    fn test_catalog_requires_all_conditions() {
        assert!(catalog_with(true, true, true).is_ready());
        assert!(!catalog_with(false, true, true).is_ready());
        assert!(!catalog_with(true, false, true).is_ready());
        assert!(!catalog_with(true, true, false).is_ready());
    }

    #[test]
    fn test_catalog_without_status_is_not_ready() {
        assert!(!Catalog::new("system-library", CatalogSpec::default()).is_ready());
    }
}
