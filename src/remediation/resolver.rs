use crate::ports::{bounded, AdapterError, ClusterClient};
use std::time::Duration;

/// The single service that owns the offending task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundService {
    pub arn: String,
    pub name: String,
}

impl BoundService {
    /// Accepts both `service/<cluster>/<name>` and the legacy
    /// `service/<name>` ARN formats.
    pub fn from_arn(arn: impl Into<String>) -> Self {
        let arn = arn.into();
        let name = arn.rsplit('/').next().unwrap_or(arn.as_str()).to_string();
        Self { arn, name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceBinding {
    NoTarget,
    Single(BoundService),
}

#[derive(Debug, thiserror::Error)]
#[error("Cannot process more than one service per cluster (cluster {cluster} has {} services)", .services.len())]
pub struct AmbiguousBinding {
    pub cluster: String,
    pub services: Vec<String>,
}

/// Find the service to remediate in `cluster`.
///
/// Listing failures are logged and reported as [`ServiceBinding::NoTarget`];
/// only an ambiguous binding is an error.
pub async fn resolve_service(
    client: &dyn ClusterClient,
    cluster: &str,
    timeout: Option<Duration>,
) -> Result<ServiceBinding, AmbiguousBinding> {
    let services = match bounded::<_, AdapterError, _>(timeout, client.list_services(cluster)).await
    {
        Ok(services) => services,
        Err(e) => {
            log::error!("Unable to list services of {cluster}, skipping remediation: {e}");
            return Ok(ServiceBinding::NoTarget);
        }
    };

    match services.as_slice() {
        [] => {
            log::info!("No service bound to {cluster}, nothing to remediate");
            Ok(ServiceBinding::NoTarget)
        }
        [arn] => {
            let service = BoundService::from_arn(arn.as_str());
            log::debug!("Resolved service {} in {cluster}", service.name);
            Ok(ServiceBinding::Single(service))
        }
        _ => Err(AmbiguousBinding {
            cluster: cluster.to_string(),
            services: services.clone(),
        }),
    }
}
