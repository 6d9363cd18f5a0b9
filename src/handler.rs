use std::sync::Arc;

use log::{info, warn};
use serde_json::Value;

use crate::{
    error::FatalError,
    event::{self, TaskStatusEvent},
    policy::{ComplianceContext, PolicyCache},
    ports::{bounded, AdapterError, ClusterClient, IdentityResolver, NotificationSink},
    remediation::{
        resolve_service, RemediationPipeline, RemediationReport, RemediationSettings,
        RemediationTarget, ServiceBinding,
    },
};

#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub region: String,
    pub registry_template: String,
    pub remediation: RemediationSettings,
}

#[derive(Debug)]
pub enum InvocationOutcome {
    Compliant,
    /// Non-compliant, but the cluster has no service to remediate.
    NoTarget,
    Remediated(RemediationReport),
    /// Remediation was planned but every step was skipped.
    DryRun(RemediationReport),
}

/// Evaluates task events and remediates the ones running unapproved images.
pub struct Handler {
    identity: Arc<dyn IdentityResolver>,
    cluster: Arc<dyn ClusterClient>,
    sink: Arc<dyn NotificationSink>,
    settings: HandlerSettings,
    policies: PolicyCache,
}

impl Handler {
    pub fn new(
        identity: Arc<dyn IdentityResolver>,
        cluster: Arc<dyn ClusterClient>,
        sink: Arc<dyn NotificationSink>,
        settings: HandlerSettings,
    ) -> Self {
        let policies = PolicyCache::new(settings.registry_template.clone());
        Self {
            identity,
            cluster,
            sink,
            settings,
            policies,
        }
    }

    pub async fn handle(&self, payload: Value) -> Result<InvocationOutcome, FatalError> {
        let event = event::decode(payload)?;
        self.handle_event(&event).await
    }

    pub async fn handle_event(
        &self,
        event: &TaskStatusEvent,
    ) -> Result<InvocationOutcome, FatalError> {
        info!(
            "Evaluating task {} ({} containers, status {})",
            event.task_arn,
            event.containers.len(),
            event.last_status.as_deref().unwrap_or("unknown")
        );

        let timeout = self.settings.remediation.step_timeout;
        let account = bounded::<_, AdapterError, _>(timeout, self.identity.account_id())
            .await
            .map_err(FatalError::Identity)?;
        let context = ComplianceContext::new(account, self.settings.region.as_str());
        let policy = self.policies.get_or_compile(&context)?;

        if policy.evaluate(&event.containers).is_compliant() {
            info!("Task {} complies with registry policy", event.task_arn);
            return Ok(InvocationOutcome::Compliant);
        }
        for container in policy.violations(&event.containers) {
            warn!(
                "Container {} of task {} uses image {} outside {}",
                container.label(),
                event.task_arn,
                container.image.as_deref().unwrap_or("<none>"),
                policy.registry_prefix()
            );
        }

        let service = match resolve_service(self.cluster.as_ref(), &event.cluster_arn, timeout)
            .await?
        {
            ServiceBinding::NoTarget => return Ok(InvocationOutcome::NoTarget),
            ServiceBinding::Single(service) => service,
        };

        let target = RemediationTarget::new(event, service);
        let report = RemediationPipeline::new(
            self.cluster.as_ref(),
            self.sink.as_ref(),
            &self.settings.remediation,
        )
        .run(&target)
        .await;

        if self.settings.remediation.dry_run {
            info!(
                "Dry run, task {} of service {} left running",
                target.task_arn, target.service.name
            );
            return Ok(InvocationOutcome::DryRun(report));
        }

        log_summary(&target, &report);
        Ok(InvocationOutcome::Remediated(report))
    }
}

fn log_summary(target: &RemediationTarget, report: &RemediationReport) {
    let failed = report.failed().count();
    if failed == 0 {
        info!(
            "Remediated task {} of service {}",
            target.task_arn, target.service.name
        );
    } else {
        warn!(
            "Remediation of task {} finished with {failed} failed steps",
            target.task_arn
        );
    }
}
