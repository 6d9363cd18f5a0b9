mod cache;
mod rule;

pub use cache::PolicyCache;
pub use rule::{ComplianceContext, PolicyError, DEFAULT_REGISTRY_TEMPLATE};
