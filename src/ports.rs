//! The collaborators remediation depends on.
//!
//! Production implementations live in [`crate::aws`]; tests drive the core
//! through the recording fake in [`fakes`].

use std::{fmt, future::Future, time::Duration};

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterErrorKind {
    Server,
    Client,
    InvalidParameter,
    ClusterNotFound,
    ServiceNotFound,
    ServiceNotActive,
    PlatformUnknown,
    PlatformTaskDefinitionIncompatibility,
    AccessDenied,
    Timeout,
    Other,
}

impl AdapterErrorKind {
    /// Map an ECS/SNS/STS error code onto a kind.
    pub fn from_code(code: &str) -> Self {
        match code {
            "ServerException" | "InternalError" | "InternalErrorException" => Self::Server,
            "ClientException" => Self::Client,
            "InvalidParameterException" | "InvalidParameter" => Self::InvalidParameter,
            "ClusterNotFoundException" => Self::ClusterNotFound,
            "ServiceNotFoundException" => Self::ServiceNotFound,
            "ServiceNotActiveException" => Self::ServiceNotActive,
            "PlatformUnknownException" => Self::PlatformUnknown,
            "PlatformTaskDefinitionIncompatibilityException" => {
                Self::PlatformTaskDefinitionIncompatibility
            }
            "AccessDeniedException" | "AccessDenied" | "AuthorizationError" => Self::AccessDenied,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for AdapterErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Server => "server error",
            Self::Client => "client error",
            Self::InvalidParameter => "invalid parameter",
            Self::ClusterNotFound => "cluster not found",
            Self::ServiceNotFound => "service not found",
            Self::ServiceNotActive => "service not active",
            Self::PlatformUnknown => "platform unknown",
            Self::PlatformTaskDefinitionIncompatibility => {
                "platform incompatible with task definition"
            }
            Self::AccessDenied => "access denied",
            Self::Timeout => "timed out",
            Self::Other => "unclassified error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub message: String,
}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            AdapterErrorKind::Timeout,
            format!("no response after {after:?}"),
        )
    }
}

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn account_id(&self) -> Result<String, AdapterError>;
}

#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// ARNs of every service in the cluster.
    async fn list_services(&self, cluster: &str) -> Result<Vec<String>, AdapterError>;
    async fn stop_task(&self, cluster: &str, task: &str, reason: &str)
    -> Result<(), AdapterError>;
    async fn scale_service(
        &self,
        cluster: &str,
        service: &str,
        desired_count: i32,
    ) -> Result<(), AdapterError>;
    async fn deregister_task_definition(&self, task_definition: &str)
    -> Result<(), AdapterError>;
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, destination: &str, message: &str) -> Result<(), AdapterError>;
}

/// Run an adapter call, failing it with [`AdapterErrorKind::Timeout`] when
/// `limit` elapses first.
pub async fn bounded<T, E, F>(limit: Option<Duration>, call: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<AdapterError>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .unwrap_or_else(|_| Err(AdapterError::timeout(limit).into())),
        None => call.await,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_classified() {
        let codes = vec![
            ("ServerException", AdapterErrorKind::Server),
            ("ClientException", AdapterErrorKind::Client),
            ("InvalidParameterException", AdapterErrorKind::InvalidParameter),
            ("ClusterNotFoundException", AdapterErrorKind::ClusterNotFound),
            ("ServiceNotFoundException", AdapterErrorKind::ServiceNotFound),
            ("ServiceNotActiveException", AdapterErrorKind::ServiceNotActive),
            ("AccessDeniedException", AdapterErrorKind::AccessDenied),
            ("ThrottlingException", AdapterErrorKind::Other),
        ];
        for (code, expected) in codes {
            assert_eq!(AdapterErrorKind::from_code(code), expected, "{code}");
        }
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let res: Result<(), AdapterError> = bounded(
            Some(Duration::from_millis(10)),
            std::future::pending::<Result<(), AdapterError>>(),
        )
        .await;
        assert_eq!(res.unwrap_err().kind, AdapterErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_bounded_passes_results_through() {
        let res: Result<u8, AdapterError> =
            bounded(Some(Duration::from_secs(5)), async { Ok(7) }).await;
        assert_eq!(res, Ok(7));

        let res: Result<u8, AdapterError> = bounded(None, async {
            Err(AdapterError::new(AdapterErrorKind::Client, "boom"))
        })
        .await;
        assert_eq!(res.unwrap_err().kind, AdapterErrorKind::Client);
    }
}
