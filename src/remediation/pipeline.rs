use std::{fmt, time::Duration};

use log::{error, info};

use super::{
    notification::{self, NotificationMessage},
    resolver::BoundService,
};
use crate::{
    event::TaskStatusEvent,
    ports::{bounded, AdapterError, ClusterClient, NotificationSink},
};

/// Remediation steps in the order they are issued. The task is stopped
/// before its definition is deregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationStep {
    StopTask,
    ScaleServiceToZero,
    DeregisterTaskDefinition,
    Notify,
}

impl RemediationStep {
    pub const ORDER: [RemediationStep; 4] = [
        RemediationStep::StopTask,
        RemediationStep::ScaleServiceToZero,
        RemediationStep::DeregisterTaskDefinition,
        RemediationStep::Notify,
    ];
}

impl fmt::Display for RemediationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemediationStep::StopTask => "stop task",
            RemediationStep::ScaleServiceToZero => "scale service to zero",
            RemediationStep::DeregisterTaskDefinition => "deregister task definition",
            RemediationStep::Notify => "send notification",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error("Notification serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug)]
pub enum StepOutcome {
    Succeeded,
    Failed(StepError),
    Skipped,
}

/// What each step did. Recorded for observability only, it never feeds back
/// into which steps run.
#[derive(Debug, Default)]
pub struct RemediationReport {
    pub steps: Vec<(RemediationStep, StepOutcome)>,
}

impl RemediationReport {
    pub fn attempted(&self) -> impl Iterator<Item = RemediationStep> + '_ {
        self.steps
            .iter()
            .filter(|(_, outcome)| !matches!(outcome, StepOutcome::Skipped))
            .map(|(step, _)| *step)
    }

    pub fn failed(&self) -> impl Iterator<Item = RemediationStep> + '_ {
        self.steps
            .iter()
            .filter(|(_, outcome)| matches!(outcome, StepOutcome::Failed(_)))
            .map(|(step, _)| *step)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationTarget {
    pub cluster_arn: String,
    pub task_arn: String,
    pub task_definition_arn: String,
    pub service: BoundService,
}

impl RemediationTarget {
    pub fn new(event: &TaskStatusEvent, service: BoundService) -> Self {
        Self {
            cluster_arn: event.cluster_arn.clone(),
            task_arn: event.task_arn.clone(),
            task_definition_arn: event.task_definition_arn.clone(),
            service,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemediationSettings {
    pub topic_arn: String,
    pub stop_reason: String,
    pub step_timeout: Option<Duration>,
    pub dry_run: bool,
}

pub struct RemediationPipeline<'a> {
    cluster: &'a dyn ClusterClient,
    sink: &'a dyn NotificationSink,
    settings: &'a RemediationSettings,
}

impl<'a> RemediationPipeline<'a> {
    pub fn new(
        cluster: &'a dyn ClusterClient,
        sink: &'a dyn NotificationSink,
        settings: &'a RemediationSettings,
    ) -> Self {
        Self {
            cluster,
            sink,
            settings,
        }
    }

    /// Issue every step in order. A failed step is logged and the next one
    /// is attempted anyway; nothing is retried or rolled back.
    pub async fn run(&self, target: &RemediationTarget) -> RemediationReport {
        let mut report = RemediationReport::default();

        for step in RemediationStep::ORDER {
            let outcome = if self.settings.dry_run {
                info!("Dry run, not issuing '{step}' for {}", target.task_arn);
                StepOutcome::Skipped
            } else {
                match bounded(self.settings.step_timeout, self.execute(step, target)).await {
                    Ok(()) => {
                        info!("Remediation step '{step}' succeeded for {}", target.task_arn);
                        StepOutcome::Succeeded
                    }
                    Err(e) => {
                        error!("Remediation step '{step}' failed for {}: {e}", target.task_arn);
                        StepOutcome::Failed(e)
                    }
                }
            };
            report.steps.push((step, outcome));
        }

        report
    }

    async fn execute(
        &self,
        step: RemediationStep,
        target: &RemediationTarget,
    ) -> Result<(), StepError> {
        match step {
            RemediationStep::StopTask => {
                self.cluster
                    .stop_task(
                        &target.cluster_arn,
                        &target.task_arn,
                        &self.settings.stop_reason,
                    )
                    .await?
            }
            RemediationStep::ScaleServiceToZero => {
                info!(
                    "Service {} to be updated with desired count set to 0",
                    target.service.name
                );
                self.cluster
                    .scale_service(&target.cluster_arn, &target.service.name, 0)
                    .await?
            }
            RemediationStep::DeregisterTaskDefinition => {
                self.cluster
                    .deregister_task_definition(&target.task_definition_arn)
                    .await?
            }
            RemediationStep::Notify => {
                let message = NotificationMessage::for_target(target);
                notification::notify(self.sink, &self.settings.topic_arn, &message).await?
            }
        }
        Ok(())
    }
}
