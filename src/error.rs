use crate::{policy::PolicyError, ports::AdapterError, remediation::AmbiguousBinding};

/// Errors that end an invocation. Everything else is logged where it
/// happens and the invocation carries on.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("Error during event unmarshaling: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Error getting account id: {0}")]
    Identity(AdapterError),
    #[error("Policy compilation failed: {0}")]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    AmbiguousBinding(#[from] AmbiguousBinding),
}
