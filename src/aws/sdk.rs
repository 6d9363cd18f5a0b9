//! Shared AWS SDK configuration.
//!
//! Credentials and region come from the Lambda environment through the
//! default provider chain.

use aws_config::{BehaviorVersion, SdkConfig};
use tokio::sync::OnceCell;

static SDK_CONFIG: OnceCell<SdkConfig> = OnceCell::const_new();

/// Get a reference to the shared SDK configuration.
///
/// This lazily loads the configuration on first use and reuses it for every
/// warm invocation afterwards.
pub async fn get_sdk_config() -> &'static SdkConfig {
    SDK_CONFIG
        .get_or_init(|| aws_config::load_defaults(BehaviorVersion::latest()))
        .await
}
