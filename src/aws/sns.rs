use async_trait::async_trait;
use aws_config::SdkConfig;

use super::error::classify;
use crate::ports::{AdapterError, NotificationSink};

pub struct SnsNotificationSink {
    client: aws_sdk_sns::Client,
}

impl SnsNotificationSink {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_sns::Client::new(config),
        }
    }
}

#[async_trait]
impl NotificationSink for SnsNotificationSink {
    async fn publish(&self, destination: &str, message: &str) -> Result<(), AdapterError> {
        let output = self
            .client
            .publish()
            .topic_arn(destination)
            .message(message)
            .send()
            .await
            .map_err(classify)?;
        log::debug!(
            "Published message {} to {destination}",
            output.message_id().unwrap_or("<unknown>")
        );
        Ok(())
    }
}
