use serde::{Deserialize, Serialize};

use super::pipeline::{RemediationTarget, StepError};
use crate::ports::NotificationSink;

/// Payload published once a task has been remediated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationMessage {
    pub cluster_arn: String,
    pub service_arn: String,
    pub task_definition_arn: String,
    pub task_arn: String,
}

impl NotificationMessage {
    pub fn for_target(target: &RemediationTarget) -> Self {
        Self {
            cluster_arn: target.cluster_arn.clone(),
            service_arn: target.service.arn.clone(),
            task_definition_arn: target.task_definition_arn.clone(),
            task_arn: target.task_arn.clone(),
        }
    }
}

pub async fn notify(
    sink: &dyn NotificationSink,
    destination: &str,
    message: &NotificationMessage,
) -> Result<(), StepError> {
    let payload = serde_json::to_string(message)?;
    log::debug!("Publishing remediation notice to {destination}: {payload}");
    sink.publish(destination, &payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{
        fakes::{Call, FakeCloud, Operation},
        AdapterErrorKind,
    };
    use serde_json::json;

    fn message() -> NotificationMessage {
        NotificationMessage {
            cluster_arn: "cluster".to_string(),
            service_arn: "service".to_string(),
            task_definition_arn: "taskdef".to_string(),
            task_arn: "task".to_string(),
        }
    }

    #[test]
    fn test_payload_field_names() {
        let value = serde_json::to_value(message()).unwrap();
        assert_eq!(
            value,
            json!({
                "ClusterArn": "cluster",
                "ServiceArn": "service",
                "TaskDefinitionArn": "taskdef",
                "TaskArn": "task"
            })
        );
    }

    #[tokio::test]
    async fn test_notify_publishes_to_destination() {
        let cloud = FakeCloud::new("111111111111");
        notify(&cloud, "arn:aws:sns:us-east-1:111111111111:alerts", &message())
            .await
            .expect("Publish should succeed");

        let calls = cloud.calls();
        assert_eq!(calls.len(), 1);
        let Call::Publish {
            destination,
            message: payload,
        } = &calls[0]
        else {
            panic!("Expected a publish call, got {:?}", calls[0]);
        };
        assert_eq!(destination, "arn:aws:sns:us-east-1:111111111111:alerts");
        let published: NotificationMessage = serde_json::from_str(payload).unwrap();
        assert_eq!(published, message());
    }

    #[tokio::test]
    async fn test_publish_failure_is_reported() {
        let cloud =
            FakeCloud::new("111111111111").failing(Operation::Publish, AdapterErrorKind::Server);
        let res = notify(&cloud, "topic", &message()).await;
        assert!(matches!(res, Err(StepError::Adapter(_))), "{:?}", res);
    }
}
