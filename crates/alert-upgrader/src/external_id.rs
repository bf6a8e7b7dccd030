//! Codec for app external ids.
//!
//! An external id names the chart an app was installed from:
//! `catalog://?catalog=[<namespace>/]<catalog>&template=<template>&version=<version>`.
//! The template version id derived from it, `<catalog>-<template>-<version>`,
//! is what the upgrade machinery reports as a service version.

use std::fmt;

use url::Url;

use crate::{Error, Result};

/// Namespace holding template versions of global catalogs.
pub const GLOBAL_NAMESPACE: &str = "cattle-global-data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogType {
    Global,
    Cluster,
    Project,
}

impl fmt::Display for CatalogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogType::Global => write!(f, "catalog"),
            CatalogType::Cluster => write!(f, "clusterCatalog"),
            CatalogType::Project => write!(f, "projectCatalog"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalId {
    /// Namespace the template versions live in
    pub namespace: String,
    pub catalog: String,
    pub catalog_type: CatalogType,
    pub template: String,
    pub version: String,
}

impl ExternalId {
    /// Name of the catalog template object.
    pub fn template_id(&self) -> String {
        format!("{}-{}", self.catalog, self.template)
    }

    pub fn version_id(&self) -> String {
        format!("{}-{}-{}", self.catalog, self.template, self.version)
    }
}

/// Build the external id of a chart in a global catalog.
pub fn catalog_external_id(catalog: &str, template: &str, version: &str) -> String {
    format!(
        "catalog://?catalog={}&template={}&version={}",
        catalog, template, version
    )
}

pub fn split_external_id(external_id: &str) -> Result<ExternalId> {
    let invalid = |reason: &str| Error::ExternalId {
        id: external_id.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(external_id).map_err(|e| invalid(&e.to_string()))?;

    let mut catalog_with_namespace = String::new();
    let mut template = String::new();
    let mut version = String::new();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "catalog" => catalog_with_namespace = value.into_owned(),
            "template" => template = value.into_owned(),
            "version" => version = value.into_owned(),
            _ => {}
        }
    }

    // Ids written before catalogs were namespaced carry a bare catalog name.
    let (namespace, catalog) = match catalog_with_namespace.split_once('/') {
        Some((ns, catalog)) if !ns.is_empty() => (ns.to_string(), catalog.to_string()),
        _ => (GLOBAL_NAMESPACE.to_string(), catalog_with_namespace),
    };

    if catalog.is_empty() {
        return Err(invalid("catalog is missing"));
    }
    if template.is_empty() {
        return Err(invalid("template is missing"));
    }
    if version.is_empty() {
        return Err(invalid("version is missing"));
    }

    let catalog_type = if catalog.contains(":p-") {
        CatalogType::Project
    } else if catalog.contains(":c-") {
        CatalogType::Cluster
    } else {
        CatalogType::Global
    };

    Ok(ExternalId {
        namespace,
        catalog,
        catalog_type,
        template,
        version,
    })
}

/// Returns the template version id and the namespace it lives in.
pub fn parse_external_id(external_id: &str) -> Result<(String, String)> {
    let id = split_external_id(external_id)?;
    Ok((id.version_id(), id.namespace))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_global_catalog() {
        let id = split_external_id(
            "catalog://?catalog=system-library&template=rancher-monitoring&version=0.1.0",
        )
        .unwrap();
        assert_eq!(id.namespace, GLOBAL_NAMESPACE);
        assert_eq!(id.catalog, "system-library");
        assert_eq!(id.catalog_type, CatalogType::Global);
        assert_eq!(id.template, "rancher-monitoring");
        assert_eq!(id.version, "0.1.0");
        assert_eq!(id.template_id(), "system-library-rancher-monitoring");
    }

    #[test]
    fn test_split_namespaced_catalog() {
        let id = split_external_id(
            "catalog://?catalog=p-xyz/c-abc12:p-xyz-charts&template=web&version=1.2.3",
        )
        .unwrap();
        assert_eq!(id.namespace, "p-xyz");
        assert_eq!(id.catalog, "c-abc12:p-xyz-charts");
        assert_eq!(id.catalog_type, CatalogType::Project);
        assert_eq!(id.catalog_type.to_string(), "projectCatalog");
    }

    #[test]
    fn test_split_cluster_catalog() {
        let id =
            split_external_id("catalog://?catalog=c-abc12/x:c-abc12-charts&template=t&version=1")
                .unwrap();
        assert_eq!(id.catalog_type, CatalogType::Cluster);
    }

    #[test]
    fn test_parse_returns_version_id() {
        let (version, namespace) = parse_external_id(&catalog_external_id(
            "system-library",
            "rancher-monitoring",
            "0.1.2",
        ))
        .unwrap();
        assert_eq!(version, "system-library-rancher-monitoring-0.1.2");
        assert_eq!(namespace, GLOBAL_NAMESPACE);
    }

    #[test]
    fn test_missing_parts_are_rejected() {
        let err = split_external_id("catalog://?catalog=system-library&template=x").unwrap_err();
        assert!(err.to_string().contains("version is missing"));

        assert!(split_external_id("catalog://?template=x&version=1").is_err());
        assert!(split_external_id("not a url").is_err());
    }
}
