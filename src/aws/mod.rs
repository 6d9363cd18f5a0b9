//! Production adapters backed by the AWS SDK.

mod ecs;
mod error;
mod sdk;
mod sns;
mod sts;

pub use ecs::EcsClusterClient;
pub use sdk::get_sdk_config;
pub use sns::SnsNotificationSink;
pub use sts::StsIdentityResolver;
