use async_trait::async_trait;
use aws_config::SdkConfig;

use super::error::classify;
use crate::ports::{AdapterError, ClusterClient};

pub struct EcsClusterClient {
    client: aws_sdk_ecs::Client,
}

impl EcsClusterClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ecs::Client::new(config),
        }
    }
}

#[async_trait]
impl ClusterClient for EcsClusterClient {
    async fn list_services(&self, cluster: &str) -> Result<Vec<String>, AdapterError> {
        let mut services = Vec::new();
        let mut next_token = None;

        loop {
            let output = self
                .client
                .list_services()
                .cluster(cluster)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(classify)?;

            services.extend(output.service_arns().iter().cloned());

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        log::debug!("Cluster {cluster} has {} services", services.len());
        Ok(services)
    }

    async fn stop_task(
        &self,
        cluster: &str,
        task: &str,
        reason: &str,
    ) -> Result<(), AdapterError> {
        self.client
            .stop_task()
            .cluster(cluster)
            .task(task)
            .reason(reason)
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn scale_service(
        &self,
        cluster: &str,
        service: &str,
        desired_count: i32,
    ) -> Result<(), AdapterError> {
        self.client
            .update_service()
            .cluster(cluster)
            .service(service)
            .desired_count(desired_count)
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn deregister_task_definition(
        &self,
        task_definition: &str,
    ) -> Result<(), AdapterError> {
        self.client
            .deregister_task_definition()
            .task_definition(task_definition)
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }
}
