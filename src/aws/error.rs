use aws_sdk_ecs::error::{DisplayErrorContext, ProvideErrorMetadata};

use crate::ports::{AdapterError, AdapterErrorKind};

/// Classify an SDK error by its service error code.
pub fn classify<E>(err: E) -> AdapterError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let kind = err
        .code()
        .map(AdapterErrorKind::from_code)
        .unwrap_or(AdapterErrorKind::Other);
    let message = DisplayErrorContext(&err).to_string();
    log::debug!("AWS call failed with code {:?}: {message}", err.code());
    AdapterError::new(kind, message)
}
