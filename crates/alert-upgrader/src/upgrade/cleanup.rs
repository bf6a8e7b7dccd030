use k8s_openapi::api::core::v1::Namespace;
use tracing::{debug, info};

use crate::store::ResourceStore;
use crate::{Error, Result};

/// Delete the namespace the legacy alert manager ran in.
///
/// Returns `false` when the namespace was already gone.
pub async fn remove_legacy_alerting(
    namespaces: &dyn ResourceStore<Namespace>,
    namespace: &str,
) -> Result<bool> {
    match namespaces.delete("", namespace).await {
        Ok(()) => {
            info!("Removed legacy alerting namespace {}", namespace);
            Ok(true)
        }
        Err(e) if e.is_not_found() => {
            debug!("Legacy alerting namespace {} already removed", namespace);
            Ok(false)
        }
        Err(e) => Err(Error::Kubernetes(format!(
            "failed to remove legacy alerting namespace {}: {}",
            namespace, e
        ))),
    }
}
