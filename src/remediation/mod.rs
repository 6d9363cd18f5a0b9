//! Corrective action for tasks that run unapproved images.
//!
//! Remediation only starts once the owning service is known: a cluster
//! with no service is left alone and a cluster with several services is
//! rejected. Once started, every step of [`RemediationStep::ORDER`] is issued
//! even if earlier ones fail.

mod notification;
mod pipeline;
mod resolver;

pub use pipeline::{
    RemediationPipeline, RemediationReport, RemediationSettings, RemediationStep,
    RemediationTarget,
};
pub use resolver::{resolve_service, AmbiguousBinding, ServiceBinding};
