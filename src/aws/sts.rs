use async_trait::async_trait;
use aws_config::SdkConfig;

use super::error::classify;
use crate::ports::{AdapterError, AdapterErrorKind, IdentityResolver};

pub struct StsIdentityResolver {
    client: aws_sdk_sts::Client,
}

impl StsIdentityResolver {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_sts::Client::new(config),
        }
    }
}

#[async_trait]
impl IdentityResolver for StsIdentityResolver {
    async fn account_id(&self) -> Result<String, AdapterError> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(classify)?;

        output.account().map(str::to_string).ok_or_else(|| {
            AdapterError::new(AdapterErrorKind::Other, "caller identity has no account")
        })
    }
}
