use std::sync::Arc;

use tracing::{debug, info};

use crate::crd::{Catalog, Cluster};
use crate::store::ResourceStore;
use crate::{Error, ReadinessSubject, Result};

/// Verdict of a readiness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NotReady {
        subject: ReadinessSubject,
        name: String,
    },
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Readiness::Ready => Ok(()),
            Readiness::NotReady { subject, name } => Err(Error::NotReady { subject, name }),
        }
    }
}

fn fetch_error(subject: ReadinessSubject, name: &str, e: Error) -> Error {
    if e.is_not_found() {
        Error::Lookup(format!("get {} {} failed, {}", subject, name, e))
    } else {
        Error::Kubernetes(format!("get {} {} failed, {}", subject, name, e))
    }
}

/// Decides whether a chart upgrade can be handed to the app deployer.
///
/// The deployer does not retry a chart install that fails because the cluster
/// or the catalog is not ready, so the caller must hold off until both are.
pub struct ReadinessGate {
    clusters: Arc<dyn ResourceStore<Cluster>>,
    catalogs: Arc<dyn ResourceStore<Catalog>>,
}

impl ReadinessGate {
    pub fn new(
        clusters: Arc<dyn ResourceStore<Cluster>>,
        catalogs: Arc<dyn ResourceStore<Catalog>>,
    ) -> Self {
        Self { clusters, catalogs }
    }

    /// The cluster is checked first; the catalog is only fetched once the
    /// cluster is ready.
    pub async fn check(&self, cluster_name: &str, catalog_name: &str) -> Result<Readiness> {
        let cluster = self
            .clusters
            .get("", cluster_name)
            .await
            .map_err(|e| fetch_error(ReadinessSubject::Cluster, cluster_name, e))?;
        if !cluster.is_ready() {
            info!("Cluster {} is not ready", cluster_name);
            return Ok(Readiness::NotReady {
                subject: ReadinessSubject::Cluster,
                name: cluster_name.to_string(),
            });
        }

        let catalog = self
            .catalogs
            .get("", catalog_name)
            .await
            .map_err(|e| fetch_error(ReadinessSubject::Catalog, catalog_name, e))?;
        if !catalog.is_ready() {
            info!("Catalog {} is not ready", catalog_name);
            return Ok(Readiness::NotReady {
                subject: ReadinessSubject::Catalog,
                name: catalog_name.to_string(),
            });
        }

        debug!("Cluster {} and catalog {} are ready", cluster_name, catalog_name);
        Ok(Readiness::Ready)
    }
}
